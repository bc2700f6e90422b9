// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! A parsed page: the preview or CMS window's DOM that behaviour rules and
//! the template finder operate on.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::element::Element;
use super::node::{Node, NodeData, NodeId, SharedNodes};
use super::selector::Selector;

/// HTML document
#[derive(Debug, Clone)]
pub struct Document {
    root: NodeId,
    pub(crate) nodes: SharedNodes,
}

impl Document {
    /// Empty document
    pub fn new() -> Self {
        let root = NodeId::new();
        let mut nodes = HashMap::new();
        nodes.insert(root, NodeData::document());

        Self {
            root,
            nodes: Arc::new(RwLock::new(nodes)),
        }
    }

    /// The document node
    pub fn root(&self) -> Node {
        Node::new(self.root, self.nodes.clone())
    }

    pub fn head(&self) -> Option<Element> {
        self.query_selector("head")
    }

    pub fn body(&self) -> Option<Element> {
        self.query_selector("body")
    }

    /// All elements matching a parsed selector, in document order
    pub fn select(&self, selector: &Selector) -> Vec<Element> {
        self.root()
            .descendants()
            .into_iter()
            .filter(|node| selector.matches(node))
            .filter_map(Element::new)
            .collect()
    }

    /// First element matching `selector`; `None` for invalid selectors too
    pub fn query_selector(&self, selector: &str) -> Option<Element> {
        self.query_selector_all(selector).into_iter().next()
    }

    pub fn query_selector_all(&self, selector: &str) -> Vec<Element> {
        match Selector::parse(selector) {
            Ok(selector) => self.select(&selector),
            Err(e) => {
                tracing::debug!(selector, error = %e, "Invalid selector");
                Vec::new()
            }
        }
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        self.root()
            .descendants()
            .into_iter()
            .find(|node| node.is_element() && node.get_attribute("id").as_deref() == Some(id))
            .and_then(Element::new)
    }

    /// New detached element
    pub fn create_element(&self, tag: &str) -> Element {
        let id = NodeId::new();
        self.nodes.write().insert(id, NodeData::element(tag));
        Element {
            node: Node::new(id, self.nodes.clone()),
        }
    }

    pub fn text_content(&self) -> String {
        self.root().text_content()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn test_created_elements_are_detached() {
        let doc = Document::new();
        let div = doc.create_element("DIV");
        assert_eq!(div.local_name(), "div");
        assert!(div.parent().is_none());
        assert!(doc.query_selector("div").is_none());
    }

    #[test]
    fn test_get_element_by_id() {
        let doc = parse_html(r#"<html><body><div id="test">Hello</div><p id="a.b">dotted</p></body></html>"#).unwrap();
        assert_eq!(doc.get_element_by_id("test").unwrap().text_content(), "Hello");
        assert_eq!(doc.get_element_by_id("a.b").unwrap().text_content(), "dotted");
        assert!(doc.get_element_by_id("missing").is_none());
    }

    #[test]
    fn test_select_in_document_order() {
        let doc = parse_html("<ul><li class='x'>1</li><li>2<b class='x'>3</b></li></ul>").unwrap();
        let texts: Vec<_> = doc.query_selector_all(".x").iter().map(|e| e.text_content()).collect();
        assert_eq!(texts, vec!["1", "3"]);
        assert!(doc.query_selector_all("div:hover").is_empty());
    }
}
