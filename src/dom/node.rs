// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! DOM node storage and tree navigation
//!
//! Nodes live in a shared map owned by their document; a `Node` is a cheap
//! handle (id + map reference) so behaviour rules and the template finder can
//! walk siblings and parents without borrowing the whole tree. Sibling order
//! is the order of the parent's child list.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};

pub(crate) type NodeMap = HashMap<NodeId, NodeData>;
pub(crate) type SharedNodes = Arc<RwLock<NodeMap>>;

/// Unique node identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Element,
    Text,
    /// `<!-- ... -->`; carries finder markers
    Comment,
}

/// Stored node
#[derive(Debug)]
pub struct NodeData {
    pub node_type: NodeType,
    /// Lowercase tag name of elements
    pub name: Option<String>,
    /// Text of text and comment nodes
    pub value: Option<String>,
    /// Attributes keyed by lowercase name
    pub attributes: HashMap<String, String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl NodeData {
    fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            name: None,
            value: None,
            attributes: HashMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn document() -> Self {
        Self::new(NodeType::Document)
    }

    pub fn element(tag: &str) -> Self {
        let mut data = Self::new(NodeType::Element);
        data.name = Some(tag.to_ascii_lowercase());
        data
    }

    pub fn text(value: impl Into<String>) -> Self {
        let mut data = Self::new(NodeType::Text);
        data.value = Some(value.into());
        data
    }

    pub fn comment(value: impl Into<String>) -> Self {
        let mut data = Self::new(NodeType::Comment);
        data.value = Some(value.into());
        data
    }
}

/// Remove `child` from its parent's child list
fn detach(nodes: &mut NodeMap, child: NodeId) {
    let parent = nodes.get_mut(&child).and_then(|d| d.parent.take());
    if let Some(parent) = parent.and_then(|id| nodes.get_mut(&id)) {
        parent.children.retain(|&id| id != child);
    }
}

/// Link `child` under `parent`, directly after `prev` or at the end
pub(crate) fn attach(nodes: &mut NodeMap, parent: NodeId, prev: Option<NodeId>, child: NodeId) {
    detach(nodes, child);
    let Some(parent_data) = nodes.get_mut(&parent) else {
        return;
    };
    let index = prev
        .and_then(|prev| parent_data.children.iter().position(|&id| id == prev))
        .map_or(parent_data.children.len(), |i| i + 1);
    parent_data.children.insert(index, child);

    if let Some(data) = nodes.get_mut(&child) {
        data.parent = Some(parent);
    }
}

/// A reference to a node in the DOM tree
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    nodes: SharedNodes,
}

impl Node {
    pub(crate) fn new(id: NodeId, nodes: SharedNodes) -> Self {
        Self { id, nodes }
    }

    fn read<R>(&self, f: impl FnOnce(&NodeData) -> Option<R>) -> Option<R> {
        self.nodes.read().get(&self.id).and_then(f)
    }

    fn handle(&self, id: NodeId) -> Node {
        Node::new(id, self.nodes.clone())
    }

    pub fn node_type(&self) -> NodeType {
        self.read(|n| Some(n.node_type)).unwrap_or(NodeType::Element)
    }

    pub fn is_element(&self) -> bool {
        self.node_type() == NodeType::Element
    }

    pub fn is_comment(&self) -> bool {
        self.node_type() == NodeType::Comment
    }

    /// Lowercase tag name
    pub fn local_name(&self) -> Option<String> {
        self.read(|n| n.name.clone())
    }

    /// Raw value of a text or comment node (`nodeValue`)
    pub fn node_value(&self) -> Option<String> {
        self.read(|n| n.value.clone())
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        fn collect(nodes: &NodeMap, id: NodeId, out: &mut String) {
            let Some(node) = nodes.get(&id) else { return };
            match node.node_type {
                NodeType::Text => out.push_str(node.value.as_deref().unwrap_or_default()),
                NodeType::Comment => {}
                NodeType::Element | NodeType::Document => {
                    for &child in &node.children {
                        collect(nodes, child, out);
                    }
                }
            }
        }

        let mut text = String::new();
        collect(&self.nodes.read(), self.id, &mut text);
        text
    }

    /// Replace the children with a single text node
    pub fn set_text_content(&self, content: impl Into<String>) {
        let mut nodes = self.nodes.write();
        let old = match nodes.get_mut(&self.id) {
            Some(node) if node.node_type == NodeType::Text => {
                node.value = Some(content.into());
                return;
            }
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for id in old {
            if let Some(child) = nodes.get_mut(&id) {
                child.parent = None;
            }
        }

        let text = NodeId::new();
        nodes.insert(text, NodeData::text(content));
        attach(&mut nodes, self.id, None, text);
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.read(|n| n.attributes.get(&name.to_ascii_lowercase()).cloned())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        if let Some(node) = self.nodes.write().get_mut(&self.id) {
            node.attributes.insert(name.into().to_ascii_lowercase(), value.into());
        }
    }

    pub fn parent(&self) -> Option<Node> {
        self.read(|n| n.parent).map(|id| self.handle(id))
    }

    pub fn children(&self) -> Vec<Node> {
        self.read(|n| Some(n.children.clone()))
            .unwrap_or_default()
            .into_iter()
            .map(|id| self.handle(id))
            .collect()
    }

    /// Sibling `offset` places away in the parent's child list
    fn sibling(&self, offset: isize) -> Option<Node> {
        let nodes = self.nodes.read();
        let siblings = &nodes.get(&nodes.get(&self.id)?.parent?)?.children;
        let index = siblings.iter().position(|&id| id == self.id)?;
        let target = index.checked_add_signed(offset)?;
        siblings.get(target).map(|&id| self.handle(id))
    }

    pub fn next_sibling(&self) -> Option<Node> {
        self.sibling(1)
    }

    pub fn prev_sibling(&self) -> Option<Node> {
        self.sibling(-1)
    }

    /// All descendants in document order, excluding this node
    pub fn descendants(&self) -> Vec<Node> {
        fn walk(nodes: &NodeMap, id: NodeId, out: &mut Vec<NodeId>) {
            if let Some(node) = nodes.get(&id) {
                for &child in &node.children {
                    out.push(child);
                    walk(nodes, child, out);
                }
            }
        }

        let mut ids = Vec::new();
        walk(&self.nodes.read(), self.id, &mut ids);
        ids.into_iter().map(|id| self.handle(id)).collect()
    }

    /// Insert `node` directly after this node, under the same parent
    pub fn insert_after(&self, node: &Node) -> Result<()> {
        let Some(parent) = self.read(|n| n.parent) else {
            return Err(Error::dom("insert_after on a detached node"));
        };
        attach(&mut self.nodes.write(), parent, Some(self.id), node.id);
        Ok(())
    }

    /// Move `child` to the end of this node's children
    pub fn append_child(&self, child: &Node) {
        attach(&mut self.nodes.write(), self.id, None, child.id);
    }
}
