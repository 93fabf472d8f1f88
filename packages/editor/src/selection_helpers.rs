//! Selection construction and derivation
//!
//! Free functions over the document graph: building selections from
//! descriptors, synthesizing whole-node selections, cursor placement
//! after structural edits, boundary predicates, and the repair pass that
//! keeps a live selection valid while the document changes underneath
//! it.

use std::cmp::Ordering;

use tracing::warn;

use vellum_model::{DocumentGraph, NodeId, NodeKind, Path};

use crate::coordinate::{compare_coordinates, Coordinate};
use crate::errors::EditorError;
use crate::selection::{NodeSelectionMode, Selection, SelectionDescriptor};

/// Builds a normalized selection from an untyped descriptor.
///
/// Property ranges default a missing end offset to the start, swap into
/// canonical `start <= end` order, and are validated against the text
/// length. Container ranges get node-level coordinates normalized into
/// property coordinates where the target allows it, then swap into
/// document order. Node descriptors go through [`create_node_selection`].
pub fn create_selection(
    graph: &DocumentGraph,
    descriptor: &SelectionDescriptor,
) -> Result<Selection, EditorError> {
    match descriptor {
        SelectionDescriptor::Null => Ok(Selection::Null),
        SelectionDescriptor::Property {
            path,
            start_offset,
            end_offset,
            reverse,
            container_path,
            surface_id,
        } => {
            let mut start = *start_offset;
            let mut end = end_offset.unwrap_or(*start_offset);
            let flipped = start > end;
            if flipped {
                std::mem::swap(&mut start, &mut end);
            }
            // An explicitly fixed flag survives the swap; otherwise the
            // swap itself records the original direction.
            let reverse = reverse.unwrap_or(flipped);

            let len = graph
                .text_len(path)
                .map_err(|_| EditorError::InvalidCoordinate(path.clone()))?;
            if end > len {
                return Err(EditorError::InvalidRange {
                    path: path.clone(),
                    start,
                    end,
                    len,
                });
            }
            Ok(Selection::Property {
                path: path.clone(),
                start_offset: start,
                end_offset: end,
                reverse,
                container_path: container_path.clone(),
                surface_id: surface_id.clone(),
            })
        }
        SelectionDescriptor::Container {
            container_path,
            start,
            end,
            reverse,
            surface_id,
        } => {
            let mut start = normalize_coordinate(graph, start.clone())?;
            let mut end = normalize_coordinate(graph, end.clone())?;
            let flipped =
                compare_coordinates(graph, container_path, &start, &end)? == Ordering::Greater;
            if flipped {
                std::mem::swap(&mut start, &mut end);
            }
            let reverse = reverse.unwrap_or(flipped);
            Ok(Selection::Container {
                container_path: container_path.clone(),
                start,
                end,
                reverse,
                surface_id: surface_id.clone(),
            })
        }
        SelectionDescriptor::Node {
            node_id,
            mode,
            container_path,
            reverse,
            surface_id,
        } => {
            let mut selection =
                create_node_selection(graph, node_id, container_path, *mode, reverse.unwrap_or(false))?;
            if let Some(id) = surface_id.clone() {
                selection.set_surface_id(id);
            }
            Ok(selection)
        }
        SelectionDescriptor::Custom { custom_type, data } => Ok(Selection::Custom {
            custom_type: custom_type.clone(),
            data: data.clone(),
        }),
    }
}

// Rewrites a node-level coordinate into the canonical property
// coordinate of its target: start/end of a text node's content, or the
// first/last item of a list. Coordinates that already point into a
// property, or that target nodes without inner positions, pass through.
fn normalize_coordinate(
    graph: &DocumentGraph,
    coord: Coordinate,
) -> Result<Coordinate, EditorError> {
    if !coord.is_node_coordinate() {
        return Ok(coord);
    }
    let node = graph
        .get(coord.path.node_id())
        .ok_or_else(|| EditorError::InvalidCoordinate(coord.path.clone()))?;
    match graph.schema().kind_of(&node.node_type) {
        NodeKind::Text { property } => {
            let path = Path::property(node.id.clone(), property.as_str());
            let offset = if coord.offset == 0 {
                0
            } else {
                graph
                    .text_len(&path)
                    .map_err(|_| EditorError::InvalidCoordinate(path.clone()))?
            };
            Ok(Coordinate::new(path, offset))
        }
        NodeKind::List { items } => {
            let items_path = Path::property(node.id.clone(), items.as_str());
            let ids = graph
                .ids(&items_path)
                .map_err(|_| EditorError::InvalidCoordinate(items_path.clone()))?;
            let item = if coord.offset == 0 {
                ids.first()
            } else {
                ids.last()
            };
            let item = match item {
                Some(id) => id.clone(),
                // An empty list has no inner position to normalize to.
                None => return Ok(coord),
            };
            match text_path(graph, &item) {
                Some(path) => {
                    let offset = if coord.offset == 0 {
                        0
                    } else {
                        graph
                            .text_len(&path)
                            .map_err(|_| EditorError::InvalidCoordinate(path.clone()))?
                    };
                    Ok(Coordinate::new(path, offset))
                }
                None => Ok(Coordinate::new(
                    Path::node(item),
                    if coord.offset == 0 { 0 } else { 1 },
                )),
            }
        }
        NodeKind::Isolated => Ok(coord),
    }
}

// The text property path of a node, when its type carries one.
fn text_path(graph: &DocumentGraph, id: &str) -> Option<Path> {
    let node = graph.get(id)?;
    let property = graph.schema().text_property(&node.node_type)?;
    Some(Path::property(id, property))
}

/// Synthesizes the selection that means "this node is selected".
///
/// The policy works on the container root of `node_id`: a text root
/// yields a property selection over its full span, a non-empty list root
/// yields a container selection from the first item's start to the last
/// item's end, and everything else yields a whole-node selection of the
/// root. `Before`/`After` collapse the result to the matching edge.
/// Returns the null selection when the node does not resolve.
pub fn create_node_selection(
    graph: &DocumentGraph,
    node_id: &str,
    container_path: &Path,
    mode: NodeSelectionMode,
    reverse: bool,
) -> Result<Selection, EditorError> {
    if !graph.contains(node_id) {
        return Ok(Selection::Null);
    }
    let root = match graph.container_root(container_path, node_id) {
        Some(root) => root,
        None => return Ok(Selection::Null),
    };
    let root_node = match graph.get(&root) {
        Some(node) => node,
        None => return Ok(Selection::Null),
    };

    match graph.schema().kind_of(&root_node.node_type) {
        NodeKind::Text { property } => {
            let path = Path::property(root.clone(), property.as_str());
            let len = graph
                .text_len(&path)
                .map_err(|_| EditorError::InvalidCoordinate(path.clone()))?;
            let (start, end) = match mode {
                NodeSelectionMode::Full => (0, len),
                NodeSelectionMode::Before => (0, 0),
                NodeSelectionMode::After => (len, len),
            };
            Ok(Selection::Property {
                path,
                start_offset: start,
                end_offset: end,
                reverse,
                container_path: Some(container_path.clone()),
                surface_id: None,
            })
        }
        NodeKind::List { items } => {
            let items_path = Path::property(root.clone(), items.as_str());
            let ids = graph
                .ids(&items_path)
                .map_err(|_| EditorError::InvalidCoordinate(items_path.clone()))?;
            let (first, last) = match (ids.first(), ids.last()) {
                (Some(first), Some(last)) => (first.clone(), last.clone()),
                _ => {
                    return Ok(node_selection_of(
                        root,
                        container_path.clone(),
                        mode,
                        reverse,
                    ))
                }
            };
            let mut start = normalize_coordinate(graph, Coordinate::new(Path::node(first), 0))?;
            let mut end = normalize_coordinate(graph, Coordinate::new(Path::node(last), 1))?;
            match mode {
                NodeSelectionMode::Full => {}
                NodeSelectionMode::Before => end = start.clone(),
                NodeSelectionMode::After => start = end.clone(),
            }
            Ok(Selection::Container {
                container_path: container_path.clone(),
                start,
                end,
                reverse,
                surface_id: None,
            })
        }
        NodeKind::Isolated => Ok(node_selection_of(
            root,
            container_path.clone(),
            mode,
            reverse,
        )),
    }
}

fn node_selection_of(
    node_id: String,
    container_path: Path,
    mode: NodeSelectionMode,
    reverse: bool,
) -> Selection {
    Selection::Node {
        node_id,
        mode,
        container_path,
        reverse,
        surface_id: None,
    }
}

/// The canonical caret position on a node: the start or end of its text,
/// the first or last item of a list, or a whole-node selection when the
/// node has no internal positions. This is how the engine answers "where
/// does the cursor land after this structural edit".
pub fn set_cursor(
    graph: &DocumentGraph,
    node_id: &str,
    container_path: &Path,
    mode: NodeSelectionMode,
) -> Result<Selection, EditorError> {
    let node = graph.get_strict(node_id)?;
    match graph.schema().kind_of(&node.node_type) {
        NodeKind::Text { property } => {
            let path = Path::property(node_id, property.as_str());
            let offset = match mode {
                NodeSelectionMode::After => graph
                    .text_len(&path)
                    .map_err(|_| EditorError::InvalidCoordinate(path.clone()))?,
                _ => 0,
            };
            let mut selection = Selection::cursor(path, offset);
            selection.set_container_path(container_path.clone());
            Ok(selection)
        }
        NodeKind::List { items } => {
            let items_path = Path::property(node_id, items.as_str());
            let ids = graph
                .ids(&items_path)
                .map_err(|_| EditorError::InvalidCoordinate(items_path.clone()))?;
            let item = match mode {
                NodeSelectionMode::After => ids.last(),
                _ => ids.first(),
            };
            match item {
                Some(item) => set_cursor(graph, &item.clone(), container_path, mode),
                None => Ok(node_selection_of(
                    node_id.to_string(),
                    container_path.clone(),
                    mode,
                    false,
                )),
            }
        }
        NodeKind::Isolated => Ok(node_selection_of(
            node_id.to_string(),
            container_path.clone(),
            mode,
            false,
        )),
    }
}

/// Whether `coord` sits at the very start of its container entry.
pub fn is_first(
    graph: &DocumentGraph,
    container_path: &Path,
    coord: &Coordinate,
) -> Result<bool, EditorError> {
    if coord.is_node_coordinate() {
        return Ok(coord.offset == 0);
    }
    let root = graph
        .container_root(container_path, coord.path.node_id())
        .ok_or_else(|| EditorError::InvalidCoordinate(coord.path.clone()))?;
    let root_node = graph
        .get(&root)
        .ok_or_else(|| EditorError::InvalidCoordinate(coord.path.clone()))?;
    match graph.schema().kind_of(&root_node.node_type) {
        NodeKind::Text { .. } => Ok(coord.offset == 0),
        NodeKind::List { items } => {
            let items_path = Path::property(root.clone(), items.as_str());
            let ids = graph
                .ids(&items_path)
                .map_err(|_| EditorError::InvalidCoordinate(items_path.clone()))?;
            Ok(ids.first().map(String::as_str) == Some(coord.path.node_id())
                && coord.offset == 0)
        }
        NodeKind::Isolated => Ok(false),
    }
}

/// Whether `coord` sits at the very end of its container entry.
pub fn is_last(
    graph: &DocumentGraph,
    container_path: &Path,
    coord: &Coordinate,
) -> Result<bool, EditorError> {
    if coord.is_node_coordinate() {
        return Ok(coord.offset > 0);
    }
    let root = graph
        .container_root(container_path, coord.path.node_id())
        .ok_or_else(|| EditorError::InvalidCoordinate(coord.path.clone()))?;
    let root_node = graph
        .get(&root)
        .ok_or_else(|| EditorError::InvalidCoordinate(coord.path.clone()))?;
    match graph.schema().kind_of(&root_node.node_type) {
        NodeKind::Text { .. } => {
            let len = graph
                .text_len(&coord.path)
                .map_err(|_| EditorError::InvalidCoordinate(coord.path.clone()))?;
            Ok(coord.offset >= len)
        }
        NodeKind::List { items } => {
            let items_path = Path::property(root.clone(), items.as_str());
            let ids = graph
                .ids(&items_path)
                .map_err(|_| EditorError::InvalidCoordinate(items_path.clone()))?;
            if ids.last().map(String::as_str) != Some(coord.path.node_id()) {
                return Ok(false);
            }
            let len = graph
                .text_len(&coord.path)
                .map_err(|_| EditorError::InvalidCoordinate(coord.path.clone()))?;
            Ok(coord.offset >= len)
        }
        NodeKind::Isolated => Ok(false),
    }
}

/// The container entries a selection spans, in flow order.
pub fn covered_node_ids(
    graph: &DocumentGraph,
    selection: &Selection,
) -> Result<Vec<NodeId>, EditorError> {
    match selection {
        Selection::Null | Selection::Custom { .. } => Ok(Vec::new()),
        Selection::Property {
            path,
            container_path,
            ..
        } => Ok(vec![entry_of(graph, container_path.as_ref(), path.node_id())?]),
        Selection::Node { node_id, .. } => Ok(vec![node_id.clone()]),
        Selection::Container {
            container_path,
            start,
            end,
            ..
        } => {
            let ids = graph
                .ids(container_path)
                .map_err(|_| EditorError::InvalidCoordinate(container_path.clone()))?;
            let start_root = graph
                .container_root(container_path, start.path.node_id())
                .ok_or_else(|| EditorError::InvalidCoordinate(start.path.clone()))?;
            let end_root = graph
                .container_root(container_path, end.path.node_id())
                .ok_or_else(|| EditorError::InvalidCoordinate(end.path.clone()))?;
            let start_pos = graph
                .position_of(container_path, &start_root)
                .ok_or_else(|| EditorError::InvalidCoordinate(start.path.clone()))?;
            let end_pos = graph
                .position_of(container_path, &end_root)
                .ok_or_else(|| EditorError::InvalidCoordinate(end.path.clone()))?;
            let (lo, hi) = (start_pos.min(end_pos), start_pos.max(end_pos));
            Ok(ids[lo..=hi].to_vec())
        }
    }
}

// The container entry owning `id`, or `id` itself without container
// context.
fn entry_of(
    graph: &DocumentGraph,
    container_path: Option<&Path>,
    id: &str,
) -> Result<String, EditorError> {
    match container_path {
        Some(container_path) => graph
            .container_root(container_path, id)
            .ok_or_else(|| EditorError::InvalidCoordinate(Path::node(id))),
        None => Ok(id.to_string()),
    }
}

/// Whether the selection covers its target(s) completely: a property
/// range spanning the full text, or a container range from a first
/// boundary to a last boundary.
pub fn is_entirely_selected(
    graph: &DocumentGraph,
    selection: &Selection,
) -> Result<bool, EditorError> {
    match selection {
        Selection::Null | Selection::Custom { .. } => Ok(false),
        Selection::Node { .. } => Ok(true),
        Selection::Property {
            path,
            start_offset,
            end_offset,
            ..
        } => {
            let len = graph
                .text_len(path)
                .map_err(|_| EditorError::InvalidCoordinate(path.clone()))?;
            Ok(*start_offset == 0 && *end_offset >= len)
        }
        Selection::Container {
            container_path,
            start,
            end,
            ..
        } => Ok(is_first(graph, container_path, start)? && is_last(graph, container_path, end)?),
    }
}

/// Inherits anchoring context from the previous selection: a new
/// selection without a surface keeps the surface (and, when missing, the
/// container path) the user was already in.
pub fn augment_selection(selection: &mut Selection, previous: &Selection) {
    if selection.is_null() || previous.is_null() || selection.surface_id().is_some() {
        return;
    }
    if selection.container_path().is_none() {
        if let Some(path) = previous.container_path() {
            selection.set_container_path(path.clone());
        }
    }
    if let Some(surface_id) = previous.surface_id() {
        selection.set_surface_id(surface_id.to_string());
    }
}

/// Repairs a selection after the document changed underneath it: offsets
/// are clamped to the (possibly shorter) text, and a selection whose
/// target no longer resolves degrades to null. Custom selections are
/// opaque and pass through untouched.
pub fn rectify_selection(graph: &DocumentGraph, selection: Selection) -> Selection {
    match selection {
        Selection::Null | Selection::Custom { .. } => selection,
        Selection::Property {
            path,
            start_offset,
            end_offset,
            reverse,
            container_path,
            surface_id,
        } => match graph.text_len(&path) {
            Ok(len) => Selection::Property {
                path,
                start_offset: start_offset.min(len),
                end_offset: end_offset.min(len),
                reverse,
                container_path,
                surface_id,
            },
            Err(_) => {
                warn!(path = %path, "selection target vanished, degrading to null");
                Selection::Null
            }
        },
        Selection::Container {
            container_path,
            start,
            end,
            reverse,
            surface_id,
        } => {
            let start = clamp_coordinate(graph, start);
            let end = clamp_coordinate(graph, end);
            match (start, end) {
                (Some(start), Some(end))
                    if compare_coordinates(graph, &container_path, &start, &end).is_ok() =>
                {
                    Selection::Container {
                        container_path,
                        start,
                        end,
                        reverse,
                        surface_id,
                    }
                }
                _ => {
                    warn!(container = %container_path, "container selection no longer resolves, degrading to null");
                    Selection::Null
                }
            }
        }
        Selection::Node {
            node_id,
            mode,
            container_path,
            reverse,
            surface_id,
        } => {
            if graph.contains(&node_id) {
                Selection::Node {
                    node_id,
                    mode,
                    container_path,
                    reverse,
                    surface_id,
                }
            } else {
                warn!(node_id = %node_id, "selected node vanished, degrading to null");
                Selection::Null
            }
        }
    }
}

// Clamps a property coordinate's offset to its text length; node
// coordinates only need their node to still exist.
fn clamp_coordinate(graph: &DocumentGraph, coord: Coordinate) -> Option<Coordinate> {
    if coord.is_node_coordinate() {
        return graph.contains(coord.path.node_id()).then_some(coord);
    }
    let len = graph.text_len(&coord.path).ok()?;
    Some(Coordinate::new(coord.path, coord.offset.min(len)))
}
