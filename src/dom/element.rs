// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Element-specific DOM operations
//!
//! Class helpers used by behaviour rules and the overlay, plus inline
//! show/hide toggling for indicator, button and label elements.

use std::ops::Deref;

use super::node::{Node, NodeType};
use super::selector::Selector;

/// Element node; node operations are reachable through `Deref`
#[derive(Debug, Clone)]
pub struct Element {
    pub node: Node,
}

impl Element {
    /// `None` unless `node` is an element
    pub fn new(node: Node) -> Option<Self> {
        (node.node_type() == NodeType::Element).then_some(Self { node })
    }

    /// Lowercase tag name
    pub fn local_name(&self) -> String {
        self.node.local_name().unwrap_or_default()
    }

    pub fn id(&self) -> Option<String> {
        self.get_attribute("id")
    }

    pub fn href(&self) -> Option<String> {
        self.get_attribute("href")
    }

    fn classes(&self) -> Vec<String> {
        self.get_attribute("class")
            .map(|c| c.split_whitespace().map(String::from).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| c == class)
    }

    pub fn add_class(&self, class: &str) {
        let mut classes = self.classes();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
            self.set_attribute("class", classes.join(" "));
        }
    }

    pub fn remove_class(&self, class: &str) {
        let classes = self.classes();
        if classes.iter().any(|c| c == class) {
            let kept: Vec<_> = classes.into_iter().filter(|c| c != class).collect();
            self.set_attribute("class", kept.join(" "));
        }
    }

    pub fn parent_element(&self) -> Option<Element> {
        self.node.parent().and_then(Element::new)
    }

    /// Child elements, skipping text and comments
    pub fn children(&self) -> Vec<Element> {
        self.node.children().into_iter().filter_map(Element::new).collect()
    }

    pub fn next_element_sibling(&self) -> Option<Element> {
        let mut sibling = self.node.next_sibling();
        while let Some(node) = sibling {
            if node.is_element() {
                return Element::new(node);
            }
            sibling = node.next_sibling();
        }
        None
    }

    /// This element and its descendants matching `selector`, in document order
    pub fn select(&self, selector: &Selector) -> Vec<Element> {
        std::iter::once(self.node.clone())
            .chain(self.node.descendants())
            .filter(|node| selector.matches(node))
            .filter_map(Element::new)
            .collect()
    }

    pub fn matches(&self, selector: &str) -> bool {
        Selector::parse(selector).map_or(false, |sel| sel.matches(&self.node))
    }

    /// Nearest inclusive ancestor matching `selector`
    pub fn closest(&self, selector: &str) -> Option<Element> {
        let sel = Selector::parse(selector).ok()?;
        let mut current = Some(self.clone());
        while let Some(el) = current {
            if sel.matches(&el.node) {
                return Some(el);
            }
            current = el.parent_element();
        }
        None
    }

    /// Form the element belongs to
    pub fn form(&self) -> Option<Element> {
        self.closest("form")
    }

    /// Hide the element (`display: none`)
    pub fn hide(&self) {
        self.set_attribute("style", with_display(self.get_attribute("style"), Some("none")));
    }

    /// Show the element by dropping any `display` declaration
    pub fn show(&self) {
        self.set_attribute("style", with_display(self.get_attribute("style"), None));
    }

    /// Whether the inline style hides the element
    pub fn is_hidden(&self) -> bool {
        self.get_attribute("style").map_or(false, |style| {
            declarations(&style).any(|(k, v)| k == "display" && v == "none")
        })
    }
}

impl Deref for Element {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.node
    }
}

/// `(property, value)` pairs of an inline style
fn declarations(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(k, v)| (k.trim(), v.trim()))
}

/// Replace the `display` declaration of an inline style
fn with_display(style: Option<String>, display: Option<&str>) -> String {
    let style = style.unwrap_or_default();
    let mut decls: Vec<String> = style
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .filter(|decl| decl.split_once(':').map_or(true, |(k, _)| k.trim() != "display"))
        .map(String::from)
        .collect();
    if let Some(display) = display {
        decls.push(format!("display:{}", display));
    }
    decls.join(";")
}
