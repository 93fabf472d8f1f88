//! Session-visible editor state and update batching
//!
//! Notifications are batched per domain: at most one pending document
//! update and one pending selection update exist at a time. A volatile
//! node-state refresh arriving while a document update is pending merges
//! into it instead of queueing, so consumers refresh once.

use std::collections::BTreeSet;

use vellum_model::NodeId;

use crate::change::{ChangeInfo, DocumentChange};
use crate::selection::Selection;

/// The logical domains updates are batched under. Flushes always deliver
/// document updates before selection updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UpdateDomain {
    Document,
    Selection,
}

/// One pending "the document changed" notification.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    /// The committed change being reported; absent for volatile
    /// node-state refreshes.
    pub change: Option<DocumentChange>,
    pub info: ChangeInfo,
    /// Every node id affected since the last flush.
    pub updated: BTreeSet<NodeId>,
}

#[derive(Debug, Default)]
pub struct EditorState {
    selection: Selection,
    has_unsaved_changes: bool,
    pending_document: Option<DocumentUpdate>,
    pending_selection: bool,
}

impl EditorState {
    pub fn new() -> Self {
        EditorState::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Updates the selection, marking the selection domain dirty only
    /// when the value actually changed.
    pub(crate) fn set_selection(&mut self, selection: Selection) -> bool {
        if self.selection == selection {
            return false;
        }
        self.selection = selection;
        self.pending_selection = true;
        true
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    pub(crate) fn mark_unsaved(&mut self) {
        self.has_unsaved_changes = true;
    }

    pub(crate) fn mark_saved(&mut self) {
        self.has_unsaved_changes = false;
    }

    pub fn is_dirty(&self, domain: UpdateDomain) -> bool {
        match domain {
            UpdateDomain::Document => self.pending_document.is_some(),
            UpdateDomain::Selection => self.pending_selection,
        }
    }

    /// Records a committed change. Merges with a pending update when one
    /// exists, unioning the affected ids.
    pub(crate) fn record_change(&mut self, change: &DocumentChange, info: &ChangeInfo) {
        match &mut self.pending_document {
            Some(pending) => {
                pending.updated.extend(change.updated.iter().cloned());
                pending.change = Some(change.clone());
                pending.info = info.clone();
            }
            None => {
                self.pending_document = Some(DocumentUpdate {
                    change: Some(change.clone()),
                    info: info.clone(),
                    updated: change.updated.clone(),
                });
            }
        }
    }

    /// Records a volatile per-node refresh, layered onto any in-flight
    /// document update.
    pub(crate) fn record_node_states(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        let pending = self.pending_document.get_or_insert_with(DocumentUpdate::default);
        pending.updated.extend(ids);
    }

    pub(crate) fn take_pending_document(&mut self) -> Option<DocumentUpdate> {
        self.pending_document.take()
    }

    pub(crate) fn take_pending_selection(&mut self) -> bool {
        std::mem::take(&mut self.pending_selection)
    }
}
