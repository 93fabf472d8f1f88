//! Change notification
//!
//! The engine reports through a typed observer interface rather than a
//! string-keyed event bus. Observers see every committed or replayed
//! change synchronously, receive batched per-domain update flushes, and
//! are told to resynchronize when a failed commit forced a rollback.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::change::{ChangeInfo, DocumentChange};
use crate::selection::Selection;
use crate::state::DocumentUpdate;

/// Why an observer rejected a change.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ObserverError(pub String);

pub trait EditorObserver {
    /// Called synchronously for every committed or replayed change. An
    /// error here vetoes the commit: the engine rolls the document back
    /// and surfaces `CommitFailure`.
    fn on_change(
        &mut self,
        _change: &DocumentChange,
        _info: &ChangeInfo,
    ) -> Result<(), ObserverError> {
        Ok(())
    }

    /// One batched document update, flushed after the commit completed.
    fn on_document_update(&mut self, _update: &DocumentUpdate) {}

    fn on_selection_update(&mut self, _selection: &Selection) {}

    /// An already-applied transaction was rolled back because committing
    /// failed; dependent state should reset from the document.
    fn on_rescue(&mut self) {}
}

/// Handle for deregistering an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    observers: BTreeMap<u64, Box<dyn EditorObserver>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        ObserverRegistry::default()
    }

    pub fn add(&mut self, observer: Box<dyn EditorObserver>) -> ObserverId {
        let id = self.next_id;
        self.next_id += 1;
        self.observers.insert(id, observer);
        ObserverId(id)
    }

    pub fn remove(&mut self, id: ObserverId) -> bool {
        self.observers.remove(&id.0).is_some()
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Stops at the first rejection; observers notified before the
    /// failing one will see the rollback through `on_rescue`.
    pub(crate) fn notify_change(
        &mut self,
        change: &DocumentChange,
        info: &ChangeInfo,
    ) -> Result<(), ObserverError> {
        for observer in self.observers.values_mut() {
            observer.on_change(change, info)?;
        }
        Ok(())
    }

    pub(crate) fn notify_document_update(&mut self, update: &DocumentUpdate) {
        for observer in self.observers.values_mut() {
            observer.on_document_update(update);
        }
    }

    pub(crate) fn notify_selection_update(&mut self, selection: &Selection) {
        for observer in self.observers.values_mut() {
            observer.on_selection_update(selection);
        }
    }

    pub(crate) fn notify_rescue(&mut self) {
        for observer in self.observers.values_mut() {
            observer.on_rescue();
        }
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .finish()
    }
}
