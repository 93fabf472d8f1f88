//! Coordinates into document content
//!
//! A coordinate pairs a path with a character offset. Property
//! coordinates (path length >= 2) point inside a text property; node
//! coordinates (path length 1) point at a whole node, with offset 0
//! meaning "before" and anything greater meaning "after".

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use vellum_model::{DocumentGraph, NodeKind, Path};

use crate::errors::EditorError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinate {
    pub path: Path,
    pub offset: usize,
}

impl Coordinate {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Coordinate {
            path: path.into(),
            offset,
        }
    }

    /// True when this coordinate addresses a whole node rather than a
    /// position inside a text property.
    pub fn is_node_coordinate(&self) -> bool {
        self.path.is_node()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.path, self.offset)
    }
}

/// Orders two coordinates within the same container.
///
/// Coordinates are ranked by the container position of their root, then
/// by item position inside a list root, with node-level "before" sorting
/// ahead of any text offset and "after" behind. Fails with
/// `InvalidCoordinate` when a path does not resolve under the container.
pub fn compare_coordinates(
    graph: &DocumentGraph,
    container_path: &Path,
    a: &Coordinate,
    b: &Coordinate,
) -> Result<Ordering, EditorError> {
    let rank_a = rank(graph, container_path, a)?;
    let rank_b = rank(graph, container_path, b)?;
    Ok(rank_a.cmp(&rank_b))
}

// Lexicographic rank: (container position, placement around the root,
// item position, placement around the item, text offset).
fn rank(
    graph: &DocumentGraph,
    container_path: &Path,
    coord: &Coordinate,
) -> Result<(usize, i8, usize, i8, usize), EditorError> {
    if coord.path.is_empty() {
        return Err(EditorError::InvalidCoordinate(coord.path.clone()));
    }
    let node_id = coord.path.node_id();
    let root = graph
        .container_root(container_path, node_id)
        .ok_or_else(|| EditorError::InvalidCoordinate(coord.path.clone()))?;
    let root_pos = graph
        .position_of(container_path, &root)
        .ok_or_else(|| EditorError::InvalidCoordinate(coord.path.clone()))?;

    if node_id == root {
        return Ok(if coord.is_node_coordinate() {
            let side = if coord.offset == 0 { -1 } else { 1 };
            (root_pos, side, 0, 0, 0)
        } else {
            (root_pos, 0, 0, 0, coord.offset)
        });
    }

    // The coordinate targets content below the root; order by the item
    // the content belongs to. Only list roots define an inner order.
    let root_node = graph
        .get(&root)
        .ok_or_else(|| EditorError::InvalidCoordinate(coord.path.clone()))?;
    let items = match graph.schema().kind_of(&root_node.node_type) {
        NodeKind::List { items } => Path::property(root.clone(), items.as_str()),
        _ => return Err(EditorError::InvalidCoordinate(coord.path.clone())),
    };
    let item = item_under(graph, &root, node_id)
        .ok_or_else(|| EditorError::InvalidCoordinate(coord.path.clone()))?;
    let item_pos = graph
        .position_of(&items, &item)
        .ok_or_else(|| EditorError::InvalidCoordinate(coord.path.clone()))?;

    Ok(if coord.is_node_coordinate() {
        let side = if coord.offset == 0 { -1 } else { 1 };
        (root_pos, 0, item_pos, side, 0)
    } else {
        (root_pos, 0, item_pos, 0, coord.offset)
    })
}

// Climbs from `id` to the direct child of `root` that owns it.
fn item_under(graph: &DocumentGraph, root: &str, id: &str) -> Option<String> {
    let mut current = id.to_string();
    for _ in 0..=graph.len() {
        match graph.parent(&current) {
            Some(parent) if parent == root => return Some(current),
            Some(parent) => current = parent.clone(),
            None => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_model::{Node, Schema};

    fn fixture() -> DocumentGraph {
        let mut schema = Schema::new();
        schema
            .define_text("paragraph", "content")
            .define_list("list", "items")
            .define_list("container", "nodes");
        let mut graph = DocumentGraph::new(schema);
        graph
            .create(Node::new("body", "container").with_property(
                "nodes",
                vec!["p1".to_string(), "l1".to_string(), "fig1".to_string()],
            ))
            .unwrap();
        graph
            .create(Node::new("p1", "paragraph").with_property("content", "p1:abcdef"))
            .unwrap();
        graph
            .create(
                Node::new("l1", "list")
                    .with_property("items", vec!["l1-1".to_string(), "l1-2".to_string()]),
            )
            .unwrap();
        graph
            .create(Node::new("l1-1", "paragraph").with_property("content", "abcdef"))
            .unwrap();
        graph
            .create(Node::new("l1-2", "paragraph").with_property("content", "0123456"))
            .unwrap();
        graph.create(Node::new("fig1", "figure")).unwrap();
        graph
    }

    fn body() -> Path {
        Path::property("body", "nodes")
    }

    #[test]
    fn test_orders_by_container_position() {
        let graph = fixture();
        let a = Coordinate::new(["p1", "content"], 8);
        let b = Coordinate::new(["l1-1", "content"], 0);
        let ord = compare_coordinates(&graph, &body(), &a, &b).unwrap();
        assert_eq!(ord, Ordering::Less);
    }

    #[test]
    fn test_orders_by_offset_within_one_property() {
        let graph = fixture();
        let a = Coordinate::new(["p1", "content"], 2);
        let b = Coordinate::new(["p1", "content"], 5);
        assert_eq!(
            compare_coordinates(&graph, &body(), &a, &b).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            compare_coordinates(&graph, &body(), &b, &b).unwrap(),
            Ordering::Equal
        );
    }

    #[test]
    fn test_orders_list_items_within_one_list() {
        let graph = fixture();
        let a = Coordinate::new(["l1-1", "content"], 6);
        let b = Coordinate::new(["l1-2", "content"], 0);
        assert_eq!(
            compare_coordinates(&graph, &body(), &a, &b).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn test_node_coordinate_brackets_inner_offsets() {
        let graph = fixture();
        let before = Coordinate::new(["l1"], 0);
        let inside = Coordinate::new(["l1-1", "content"], 0);
        let after = Coordinate::new(["l1"], 1);
        assert_eq!(
            compare_coordinates(&graph, &body(), &before, &inside).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            compare_coordinates(&graph, &body(), &inside, &after).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn test_unresolvable_path_is_an_error() {
        let graph = fixture();
        let a = Coordinate::new(["ghost", "content"], 0);
        let b = Coordinate::new(["p1", "content"], 0);
        let result = compare_coordinates(&graph, &body(), &a, &b);
        assert!(matches!(result, Err(EditorError::InvalidCoordinate(_))));
    }
}
