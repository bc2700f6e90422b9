// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTML parser using html5ever

use std::path::Path;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::ParseOpts;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use super::document::Document;
use super::node::{attach, NodeData, NodeId, NodeMap};
use crate::error::{Error, ErrorContext, Result};

/// Parse HTML string into a Document
pub fn parse_html(html: &str) -> Result<Document> {
    let dom = parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| Error::HtmlParse(e.to_string()))?;

    let doc = Document::new();
    let root = doc.root().id;
    {
        let mut nodes = doc.nodes.write();
        for child in dom.document.children.borrow().iter() {
            convert(&mut nodes, child, root);
        }
    }
    Ok(doc)
}

/// Read and parse an HTML file, e.g. a saved preview page
pub fn load_html_file(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let html = std::fs::read_to_string(path).context(&format!("reading {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = html.len(), "Loaded HTML file");
    parse_html(&html)
}

/// Copy `handle` and its subtree under `parent`
fn convert(nodes: &mut NodeMap, handle: &Handle, parent: NodeId) {
    let data = match handle.data {
        RcNodeData::Text { ref contents } => {
            let text = contents.borrow().to_string();
            // Indentation between tags; single spaces are kept
            if text.len() > 1 && text.trim().is_empty() {
                return;
            }
            NodeData::text(text)
        }
        RcNodeData::Comment { ref contents } => NodeData::comment(contents.to_string()),
        RcNodeData::Element {
            ref name,
            ref attrs,
            ..
        } => {
            let mut data = NodeData::element(&name.local);
            for attr in attrs.borrow().iter() {
                data.attributes
                    .insert(attr.name.local.to_string(), attr.value.to_string());
            }
            data
        }
        RcNodeData::Document | RcNodeData::Doctype { .. } | RcNodeData::ProcessingInstruction { .. } => {
            return
        }
    };

    let id = NodeId::new();
    nodes.insert(id, data);
    attach(nodes, parent, None, id);

    for child in handle.children.borrow().iter() {
        convert(nodes, child, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fills_head_and_body() {
        let doc = parse_html("<p>Hello</p>").unwrap();
        assert!(doc.head().is_some());
        assert_eq!(doc.body().unwrap().text_content(), "Hello");
    }

    #[test]
    fn test_parse_with_attributes() {
        let doc = parse_html(r#"<div ID="test" class="foo bar">content</div>"#).unwrap();
        let div = doc.query_selector("div").unwrap();
        assert_eq!(div.get_attribute("id"), Some("test".to_string()));
        assert!(div.has_class("foo"));
    }

    #[test]
    fn test_whitespace_between_tags_dropped() {
        let html = r#"
            <!DOCTYPE html>
            <html>
            <body>
                <div id="container">
                    <a href="https://example.com">Link</a> <b>x</b>
                </div>
            </body>
            </html>
        "#;
        let doc = parse_html(html).unwrap();
        let container = doc.get_element_by_id("container").unwrap();
        assert_eq!(container.text_content(), "Link x");
        assert_eq!(container.children().len(), 2);
    }

    #[test]
    fn test_comments_survive_parsing() {
        let html = r#"
            <body>
              <!--KrangPreviewFinder Start {"type":"template","id":1}-->
              <div class="story">text</div>
              <!--KrangPreviewFinder End-->
            </body>
        "#;
        let doc = parse_html(html).unwrap();
        let body = doc.body().unwrap();
        let comments: Vec<_> = body
            .node
            .children()
            .into_iter()
            .filter(|n| n.is_comment())
            .collect();
        assert_eq!(comments.len(), 2);
    }

    #[test]
    fn test_load_html_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<html><head></head><body><p id='p'>Preview</p></body></html>").unwrap();

        let doc = load_html_file(file.path()).unwrap();
        assert_eq!(doc.get_element_by_id("p").unwrap().text_content(), "Preview");
        assert!(load_html_file(file.path().with_extension("missing")).is_err());
    }
}
