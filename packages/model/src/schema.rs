//! Node-type registry
//!
//! The editing engine only needs to know one thing about a node type:
//! whether it carries editable text (and in which property), owns an
//! ordered list of items (and in which property), or is an isolated
//! block that takes no cursor. Everything else about a type lives in
//! the layers above.

use std::collections::HashMap;

/// How a node type behaves under cursor placement and selection
/// normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Editable text in the named property.
    Text { property: String },
    /// Ordered child items in the named property.
    List { items: String },
    /// No internal cursor positions; selected as a whole.
    Isolated,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    kinds: HashMap<String, NodeKind>,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }

    pub fn define(&mut self, node_type: impl Into<String>, kind: NodeKind) -> &mut Self {
        self.kinds.insert(node_type.into(), kind);
        self
    }

    pub fn define_text(&mut self, node_type: impl Into<String>, property: &str) -> &mut Self {
        self.define(
            node_type,
            NodeKind::Text {
                property: property.to_string(),
            },
        )
    }

    pub fn define_list(&mut self, node_type: impl Into<String>, items: &str) -> &mut Self {
        self.define(
            node_type,
            NodeKind::List {
                items: items.to_string(),
            },
        )
    }

    /// Unregistered types behave as isolated nodes.
    pub fn kind_of(&self, node_type: &str) -> &NodeKind {
        self.kinds.get(node_type).unwrap_or(&NodeKind::Isolated)
    }

    pub fn text_property(&self, node_type: &str) -> Option<&str> {
        match self.kind_of(node_type) {
            NodeKind::Text { property } => Some(property),
            _ => None,
        }
    }

    pub fn items_property(&self, node_type: &str) -> Option<&str> {
        match self.kind_of(node_type) {
            NodeKind::List { items } => Some(items),
            _ => None,
        }
    }
}
