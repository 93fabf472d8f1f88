//! Committed change records

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use vellum_model::NodeId;

use crate::operations::Operation;
use crate::selection::Selection;

/// Free-form metadata attached to a change by its producer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChangeInfo {
    /// Replayed changes go through commit and notification but are not
    /// recorded in history.
    #[serde(default)]
    pub replay: bool,
    #[serde(default)]
    pub label: Option<String>,
    /// Anything else the producer wants observers to see.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChangeInfo {
    pub fn labeled(label: impl Into<String>) -> Self {
        ChangeInfo {
            label: Some(label.into()),
            ..ChangeInfo::default()
        }
    }

    pub fn for_replay() -> Self {
        ChangeInfo {
            replay: true,
            ..ChangeInfo::default()
        }
    }
}

/// The record of one committed transaction: the operations performed,
/// the selection on both sides, and the node ids the operations touched.
/// Immutable once the history owns it; `updated` is enriched once at
/// commit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChange {
    pub ops: Vec<Operation>,
    pub before: Selection,
    pub after: Selection,
    #[serde(default)]
    pub info: ChangeInfo,
    #[serde(default)]
    pub updated: BTreeSet<NodeId>,
}

impl DocumentChange {
    pub fn new(ops: Vec<Operation>, before: Selection, after: Selection) -> Self {
        DocumentChange {
            ops,
            before,
            after,
            info: ChangeInfo::default(),
            updated: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Fills `updated` from the operations.
    pub fn collect_updated(&mut self) {
        self.updated = self
            .ops
            .iter()
            .map(|op| op.affected_node_id().to_string())
            .collect();
    }

    /// The change that exactly rolls this one back: inverted operations
    /// in reverse order, selections swapped.
    pub fn invert(&self) -> DocumentChange {
        DocumentChange {
            ops: self.ops.iter().rev().map(Operation::invert).collect(),
            before: self.after.clone(),
            after: self.before.clone(),
            info: self.info.clone(),
            updated: self.updated.clone(),
        }
    }
}
