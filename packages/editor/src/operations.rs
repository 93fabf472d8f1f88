//! Primitive document operations
//!
//! Operations are the only way the document graph changes inside the
//! engine. Each variant carries everything needed to construct its own
//! inverse, so a logged sequence can always be rolled back without
//! consulting the document.

use serde::{Deserialize, Serialize};

use vellum_model::{DocumentGraph, Node, NodeId, Path, Value};

use crate::errors::EditorError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Insert a whole node into the graph.
    Create { node: Node },
    /// Remove a whole node; carries the removed node for the inverse.
    Delete { node: Node },
    /// Replace a property value; carries both sides of the edit.
    Set { path: Path, old: Value, new: Value },
    /// Insert an id at a position of an ordered collection.
    Insert {
        path: Path,
        index: usize,
        id: NodeId,
    },
    /// Remove the id at a position of an ordered collection.
    Remove {
        path: Path,
        index: usize,
        id: NodeId,
    },
}

impl Operation {
    /// The deterministic inverse. Inverting twice yields the original
    /// operation.
    pub fn invert(&self) -> Operation {
        match self {
            Operation::Create { node } => Operation::Delete { node: node.clone() },
            Operation::Delete { node } => Operation::Create { node: node.clone() },
            Operation::Set { path, old, new } => Operation::Set {
                path: path.clone(),
                old: new.clone(),
                new: old.clone(),
            },
            Operation::Insert { path, index, id } => Operation::Remove {
                path: path.clone(),
                index: *index,
                id: id.clone(),
            },
            Operation::Remove { path, index, id } => Operation::Insert {
                path: path.clone(),
                index: *index,
                id: id.clone(),
            },
        }
    }

    pub fn apply(&self, graph: &mut DocumentGraph) -> Result<(), EditorError> {
        match self {
            Operation::Create { node } => graph.create(node.clone())?,
            Operation::Delete { node } => {
                graph.delete(&node.id)?;
            }
            Operation::Set { path, new, .. } => {
                graph.set(path, new.clone())?;
            }
            Operation::Insert { path, index, id } => {
                graph.insert_at(path, *index, id.clone())?;
            }
            Operation::Remove { path, index, .. } => {
                graph.remove_at(path, *index)?;
            }
        }
        Ok(())
    }

    /// The id of the node this operation touches: the created/deleted
    /// node, or the owner of the edited path.
    pub fn affected_node_id(&self) -> &str {
        match self {
            Operation::Create { node } | Operation::Delete { node } => &node.id,
            Operation::Set { path, .. }
            | Operation::Insert { path, .. }
            | Operation::Remove { path, .. } => path.node_id(),
        }
    }
}

/// Rolls back a sequence of already-applied operations by applying each
/// inverse in reverse order.
pub(crate) fn revert_all(graph: &mut DocumentGraph, ops: &[Operation]) -> Result<(), EditorError> {
    for op in ops.iter().rev() {
        op.invert().apply(graph)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_model::Schema;

    fn fixture() -> DocumentGraph {
        let mut schema = Schema::new();
        schema
            .define_text("paragraph", "content")
            .define_list("container", "nodes");
        let mut graph = DocumentGraph::new(schema);
        graph
            .create(Node::new("body", "container").with_property("nodes", vec!["p1".to_string()]))
            .unwrap();
        graph
            .create(Node::new("p1", "paragraph").with_property("content", "p1:abcdef"))
            .unwrap();
        graph
    }

    fn sample_ops() -> Vec<Operation> {
        vec![
            Operation::Create {
                node: Node::new("p2", "paragraph").with_property("content", "xy"),
            },
            Operation::Delete {
                node: Node::new("p1", "paragraph").with_property("content", "p1:abcdef"),
            },
            Operation::Set {
                path: Path::property("p1", "content"),
                old: Value::from("p1:abcdef"),
                new: Value::from("replaced"),
            },
            Operation::Insert {
                path: Path::property("body", "nodes"),
                index: 1,
                id: "p2".to_string(),
            },
            Operation::Remove {
                path: Path::property("body", "nodes"),
                index: 0,
                id: "p1".to_string(),
            },
        ]
    }

    #[test]
    fn test_double_inversion_is_identity() {
        for op in sample_ops() {
            assert_eq!(
                op.invert().invert(),
                op,
                "double inverse must reproduce {:?}",
                op
            );
        }
    }

    #[test]
    fn test_apply_then_revert_restores_graph() {
        let mut graph = fixture();
        let before = graph.clone();
        let ops = vec![
            Operation::Set {
                path: Path::property("p1", "content"),
                old: Value::from("p1:abcdef"),
                new: Value::from("rewritten"),
            },
            Operation::Create {
                node: Node::new("p2", "paragraph").with_property("content", "xy"),
            },
            Operation::Insert {
                path: Path::property("body", "nodes"),
                index: 1,
                id: "p2".to_string(),
            },
        ];
        for op in &ops {
            op.apply(&mut graph).unwrap();
        }
        assert_eq!(graph.text(&Path::property("p1", "content")).unwrap(), "rewritten");
        assert!(graph.contains("p2"));

        revert_all(&mut graph, &ops).unwrap();
        assert_eq!(
            graph.text(&Path::property("p1", "content")).unwrap(),
            "p1:abcdef"
        );
        assert!(!graph.contains("p2"));
        assert_eq!(
            graph.ids(&Path::property("body", "nodes")).unwrap(),
            before.ids(&Path::property("body", "nodes")).unwrap()
        );
    }

    #[test]
    fn test_affected_node_ids() {
        let ops = sample_ops();
        let affected: Vec<&str> = ops.iter().map(Operation::affected_node_id).collect();
        assert_eq!(affected, ["p2", "p1", "p1", "body", "body"]);
    }
}
