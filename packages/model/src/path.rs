//! Addresses into the document graph
//!
//! A path of length 1 addresses a whole node (`["p1"]`); a path of
//! length 2 or more addresses a property of that node
//! (`["p1", "content"]`). Collection entries are addressed by the
//! collection property path plus a positional index argument, never by
//! extending the path itself.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<String>);

impl Path {
    /// Address a whole node.
    pub fn node(id: impl Into<String>) -> Self {
        Path(vec![id.into()])
    }

    /// Address a property of a node.
    pub fn property(id: impl Into<String>, name: impl Into<String>) -> Self {
        Path(vec![id.into(), name.into()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the path addresses a whole node rather than a property.
    pub fn is_node(&self) -> bool {
        self.0.len() == 1
    }

    pub fn is_property(&self) -> bool {
        self.0.len() >= 2
    }

    /// The id of the node this path starts at. Empty paths never address
    /// anything and return "".
    pub fn node_id(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("")
    }

    pub fn property_name(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }
}

impl From<Vec<String>> for Path {
    fn from(segments: Vec<String>) -> Self {
        Path(segments)
    }
}

impl From<&[&str]> for Path {
    fn from(segments: &[&str]) -> Self {
        Path(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Path {
    fn from(segments: [&str; N]) -> Self {
        Path(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_vs_property() {
        let node = Path::node("p1");
        assert!(node.is_node());
        assert!(!node.is_property());
        assert_eq!(node.node_id(), "p1");
        assert_eq!(node.property_name(), None);

        let prop = Path::property("p1", "content");
        assert!(prop.is_property());
        assert_eq!(prop.node_id(), "p1");
        assert_eq!(prop.property_name(), Some("content"));
    }

    #[test]
    fn test_display_joins_segments() {
        assert_eq!(Path::property("body", "nodes").to_string(), "body.nodes");
    }
}
