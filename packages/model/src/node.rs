//! Nodes and property values

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Nodes are addressed by string ids throughout the model.
pub type NodeId = String;

/// A property value. Ordered node references (`Ids`) are how containers
/// and lists own their entries; everything else is scalar content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Ids(Vec<NodeId>),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ids(&self) -> Option<&[NodeId]> {
        match self {
            Value::Ids(ids) => Some(ids),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<NodeId>> for Value {
    fn from(ids: Vec<NodeId>) -> Self {
        Value::Ids(ids)
    }
}

/// A typed content node. The graph owns all live nodes; everything else
/// refers to them by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub node_type: String,
    pub properties: BTreeMap<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Node {
            id: id.into(),
            node_type: node_type.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.property(name).and_then(Value::as_text)
    }

    pub fn ids(&self, name: &str) -> Option<&[NodeId]> {
        self.property(name).and_then(Value::as_ids)
    }

    /// Replaces a property, returning the previous value (`Null` when the
    /// property was absent).
    pub fn set_property(&mut self, name: impl Into<String>, value: Value) -> Value {
        self.properties
            .insert(name.into(), value)
            .unwrap_or(Value::Null)
    }
}
