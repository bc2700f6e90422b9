// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Script and stylesheet includes

use crate::dom::{Document, Element};
use crate::error::{Error, Result};

/// A file to pull into a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileInclude {
    /// `<script>` appended to `<body>`
    Script { src: String },
    /// `<link rel="stylesheet">` appended to `<head>`
    Stylesheet { href: String },
}

/// Classify `href` by its extension (query string and fragment ignored)
pub fn load_file(href: &str) -> Result<FileInclude> {
    let path = href.split(['?', '#']).next().unwrap_or_default();

    if path.ends_with(".js") {
        Ok(FileInclude::Script {
            src: href.to_string(),
        })
    } else if path.ends_with(".css") {
        Ok(FileInclude::Stylesheet {
            href: href.to_string(),
        })
    } else {
        Err(Error::UnsupportedFile(href.to_string()))
    }
}

impl FileInclude {
    /// Insert the include into `document`
    pub fn apply(&self, document: &Document) -> Result<Element> {
        let (element, parent) = match self {
            FileInclude::Script { src } => {
                let script = document.create_element("script");
                script.set_attribute("language", "JavaScript");
                script.set_attribute("type", "text/javascript");
                script.set_attribute("src", src.as_str());
                (script, document.body())
            }
            FileInclude::Stylesheet { href } => {
                let link = document.create_element("link");
                link.set_attribute("type", "text/css");
                link.set_attribute("rel", "stylesheet");
                link.set_attribute("href", href.as_str());
                (link, document.head())
            }
        };

        let parent = parent.ok_or_else(|| Error::dom("document has no head or body to include into"))?;
        parent.append_child(&element.node);
        tracing::debug!(include = ?self, "Included file");
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn test_classify() {
        assert_eq!(
            load_file("/js/preview_editor.js?v=3").unwrap(),
            FileInclude::Script {
                src: "/js/preview_editor.js?v=3".into()
            }
        );
        assert!(matches!(load_file("/css/overlay.css").unwrap(), FileInclude::Stylesheet { .. }));
        assert!(matches!(load_file("/img/bug.gif"), Err(Error::UnsupportedFile(_))));
        assert!(load_file("/js/notjs").is_err());
    }

    #[test]
    fn test_apply() {
        let doc = parse_html("<html><head></head><body><p>story</p></body></html>").unwrap();

        load_file("/js/a.js").unwrap().apply(&doc).unwrap();
        load_file("/css/a.css").unwrap().apply(&doc).unwrap();

        let script = doc.query_selector("body > script").unwrap();
        assert_eq!(script.get_attribute("src").as_deref(), Some("/js/a.js"));
        let link = doc.query_selector("head > link[rel=stylesheet]").unwrap();
        assert_eq!(link.get_attribute("href").as_deref(), Some("/css/a.css"));
    }
}
