//! Selection variants
//!
//! A selection is one of a closed set of shapes: nothing, a range inside
//! one text property, a range spanning container entries, a whole
//! "isolated" node, or an app-defined payload the engine carries
//! untouched. Consumers match exhaustively; there is no fall-through
//! handling.
//!
//! `SelectionDescriptor` is the untyped construction input (what a
//! command layer or a serialized payload provides); `Selection` is the
//! normalized, validated result.

use serde::{Deserialize, Serialize};

use vellum_model::{NodeId, Path};

use crate::coordinate::Coordinate;
use crate::errors::EditorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeSelectionMode {
    /// The node as a whole.
    #[default]
    Full,
    /// The position just before the node.
    Before,
    /// The position just after the node.
    After,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Selection {
    #[default]
    Null,
    #[serde(rename_all = "camelCase")]
    Property {
        path: Path,
        start_offset: usize,
        end_offset: usize,
        #[serde(default)]
        reverse: bool,
        #[serde(default)]
        container_path: Option<Path>,
        #[serde(default)]
        surface_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Container {
        container_path: Path,
        start: Coordinate,
        end: Coordinate,
        #[serde(default)]
        reverse: bool,
        #[serde(default)]
        surface_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Node {
        node_id: NodeId,
        #[serde(default)]
        mode: NodeSelectionMode,
        container_path: Path,
        #[serde(default)]
        reverse: bool,
        #[serde(default)]
        surface_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Custom {
        custom_type: String,
        #[serde(default)]
        data: serde_json::Value,
    },
}

impl Selection {
    /// A collapsed text cursor.
    pub fn cursor(path: impl Into<Path>, offset: usize) -> Self {
        Selection::Property {
            path: path.into(),
            start_offset: offset,
            end_offset: offset,
            reverse: false,
            container_path: None,
            surface_id: None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Selection::Null)
    }

    pub fn is_property(&self) -> bool {
        matches!(self, Selection::Property { .. })
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Selection::Container { .. })
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Selection::Node { .. })
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Selection::Custom { .. })
    }

    pub fn is_collapsed(&self) -> bool {
        match self {
            Selection::Null => true,
            Selection::Property {
                start_offset,
                end_offset,
                ..
            } => start_offset == end_offset,
            Selection::Container { start, end, .. } => start == end,
            Selection::Node { .. } => false,
            Selection::Custom { .. } => false,
        }
    }

    pub fn surface_id(&self) -> Option<&str> {
        match self {
            Selection::Null | Selection::Custom { .. } => None,
            Selection::Property { surface_id, .. }
            | Selection::Container { surface_id, .. }
            | Selection::Node { surface_id, .. } => surface_id.as_deref(),
        }
    }

    pub fn container_path(&self) -> Option<&Path> {
        match self {
            Selection::Null | Selection::Custom { .. } => None,
            Selection::Property { container_path, .. } => container_path.as_ref(),
            Selection::Container { container_path, .. } => Some(container_path),
            Selection::Node { container_path, .. } => Some(container_path),
        }
    }

    pub(crate) fn set_surface_id(&mut self, id: String) {
        match self {
            Selection::Null | Selection::Custom { .. } => {}
            Selection::Property { surface_id, .. }
            | Selection::Container { surface_id, .. }
            | Selection::Node { surface_id, .. } => *surface_id = Some(id),
        }
    }

    pub(crate) fn set_container_path(&mut self, path: Path) {
        match self {
            Selection::Null
            | Selection::Custom { .. }
            | Selection::Container { .. }
            | Selection::Node { .. } => {}
            Selection::Property { container_path, .. } => *container_path = Some(path),
        }
    }
}

/// Untyped selection input, tagged by a `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SelectionDescriptor {
    Null,
    #[serde(rename_all = "camelCase")]
    Property {
        path: Path,
        start_offset: usize,
        #[serde(default)]
        end_offset: Option<usize>,
        #[serde(default)]
        reverse: Option<bool>,
        #[serde(default)]
        container_path: Option<Path>,
        #[serde(default)]
        surface_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Container {
        container_path: Path,
        start: Coordinate,
        end: Coordinate,
        #[serde(default)]
        reverse: Option<bool>,
        #[serde(default)]
        surface_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Node {
        node_id: NodeId,
        #[serde(default)]
        mode: NodeSelectionMode,
        container_path: Path,
        #[serde(default)]
        reverse: Option<bool>,
        #[serde(default)]
        surface_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Custom {
        custom_type: String,
        #[serde(default)]
        data: serde_json::Value,
    },
}

impl SelectionDescriptor {
    const KNOWN_TYPES: [&'static str; 5] = ["null", "property", "container", "node", "custom"];

    /// Parses a descriptor from raw JSON, surfacing an unrecognized
    /// `type` tag as `UnknownSelectionType` rather than a generic parse
    /// error.
    pub fn from_value(value: serde_json::Value) -> Result<Self, EditorError> {
        let tag = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("")
            .to_string();
        if !Self::KNOWN_TYPES.contains(&tag.as_str()) {
            return Err(EditorError::UnknownSelectionType(tag));
        }
        Ok(serde_json::from_value(value)?)
    }
}

impl From<&Selection> for SelectionDescriptor {
    fn from(selection: &Selection) -> Self {
        match selection.clone() {
            Selection::Null => SelectionDescriptor::Null,
            Selection::Property {
                path,
                start_offset,
                end_offset,
                reverse,
                container_path,
                surface_id,
            } => SelectionDescriptor::Property {
                path,
                start_offset,
                end_offset: Some(end_offset),
                reverse: Some(reverse),
                container_path,
                surface_id,
            },
            Selection::Container {
                container_path,
                start,
                end,
                reverse,
                surface_id,
            } => SelectionDescriptor::Container {
                container_path,
                start,
                end,
                reverse: Some(reverse),
                surface_id,
            },
            Selection::Node {
                node_id,
                mode,
                container_path,
                reverse,
                surface_id,
            } => SelectionDescriptor::Node {
                node_id,
                mode,
                container_path,
                reverse: Some(reverse),
                surface_id,
            },
            Selection::Custom { custom_type, data } => {
                SelectionDescriptor::Custom { custom_type, data }
            }
        }
    }
}
