// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Access data the CMS hands to the preview window

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::dom::Document;
use crate::error::{Error, Result};

/// Class of the container element labels in a preview page
pub const ELEMENT_LABEL_CLASS: &str = "krang_preview_editor_element_label";

/// Ids arrive as JSON strings or numbers; both become strings
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// CMS location and window id, passed as JSON in `window.name`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CmsContext {
    #[serde(rename = "cmsURL", default)]
    pub cms_url: Option<String>,
    #[serde(rename = "winID", default, deserialize_with = "string_or_number")]
    pub win_id: Option<String>,
}

impl CmsContext {
    /// Parse `window.name`; an empty name gives an empty context
    pub fn from_window_name(name: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(name).map_err(|e| Error::malformed("window.name", e))
    }

    /// CMS URL, required for every call
    pub fn require_cms_url(&self) -> Result<&str> {
        self.cms_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::Config("window.name carries no cmsURL".into()))
    }
}

/// Story and element a container label stands for (its `name` attribute)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ElementLabel {
    #[serde(rename = "storyID", default, deserialize_with = "string_or_number")]
    pub story_id: Option<String>,
    #[serde(rename = "elementXPath", default)]
    pub element_xpath: String,
}

impl ElementLabel {
    pub fn parse(name_attr: &str) -> Result<Self> {
        serde_json::from_str(name_attr).map_err(|e| Error::malformed("element label", e))
    }

    /// Label of the first container element in `document`, if any
    pub fn first_in(document: &Document) -> Result<Option<Self>> {
        let Some(label) = document.query_selector(&format!(".{}", ELEMENT_LABEL_CLASS)) else {
            return Ok(None);
        };
        match label.get_attribute("name") {
            Some(name) if !name.trim().is_empty() => Self::parse(&name).map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn test_context_from_window_name() {
        let ctx = CmsContext::from_window_name(r#"{"cmsURL":"https://cms.example.com","winID":7}"#).unwrap();
        assert_eq!(ctx.require_cms_url().unwrap(), "https://cms.example.com");
        assert_eq!(ctx.win_id.as_deref(), Some("7"));

        let empty = CmsContext::from_window_name("").unwrap();
        assert_eq!(empty, CmsContext::default());
        assert!(empty.require_cms_url().is_err());

        assert!(CmsContext::from_window_name("{broken").unwrap_err().is_critical());
    }

    #[test]
    fn test_first_label() {
        let doc = parse_html(
            r#"<body>
                <div class="krang_preview_editor_element_label" name='{"storyID":42,"elementXPath":"/page[1]/para[2]"}'>para</div>
                <div class="krang_preview_editor_element_label" name='{"storyID":42,"elementXPath":"/page[2]"}'>page</div>
            </body>"#,
        )
        .unwrap();

        let label = ElementLabel::first_in(&doc).unwrap().unwrap();
        assert_eq!(label.story_id.as_deref(), Some("42"));
        assert_eq!(label.element_xpath, "/page[1]/para[2]");
    }

    #[test]
    fn test_no_label() {
        let doc = parse_html("<body><p>static page</p></body>").unwrap();
        assert_eq!(ElementLabel::first_in(&doc).unwrap(), None);
    }
}
