//! Linear undo/redo history
//!
//! Committed changes live in one ordered sequence with a cursor between
//! the done and the undone side. Committing after an undo discards the
//! undone tail; there is no branching.

use vellum_model::DocumentGraph;

use crate::change::DocumentChange;
use crate::errors::EditorError;
use crate::operations::revert_all;

#[derive(Debug, Default)]
pub struct ChangeHistory {
    changes: Vec<DocumentChange>,
    cursor: usize,
    max_depth: Option<usize>,
}

impl ChangeHistory {
    pub fn new() -> Self {
        ChangeHistory::default()
    }

    /// A history that keeps at most `max_depth` undoable changes,
    /// dropping the oldest once the bound is exceeded.
    pub fn with_max_depth(max_depth: usize) -> Self {
        ChangeHistory {
            max_depth: Some(max_depth),
            ..ChangeHistory::default()
        }
    }

    /// Appends a committed change, discarding any undone tail.
    pub fn add_change(&mut self, change: DocumentChange) {
        self.changes.truncate(self.cursor);
        self.changes.push(change);
        self.cursor = self.changes.len();
        if let Some(max) = self.max_depth {
            if self.changes.len() > max {
                let excess = self.changes.len() - max;
                self.changes.drain(..excess);
                self.cursor -= excess;
            }
        }
    }

    /// Rolls back the most recent done change. `Ok(None)` when there is
    /// nothing to undo; an inversion failure is surfaced as-is since it
    /// means the history no longer matches the document.
    pub fn undo(&mut self, graph: &mut DocumentGraph) -> Result<Option<DocumentChange>, EditorError> {
        if self.cursor == 0 {
            return Ok(None);
        }
        let change = self.changes[self.cursor - 1].clone();
        revert_all(graph, &change.ops)?;
        self.cursor -= 1;
        Ok(Some(change))
    }

    /// Re-applies the next undone change. `Ok(None)` when there is
    /// nothing to redo.
    pub fn redo(&mut self, graph: &mut DocumentGraph) -> Result<Option<DocumentChange>, EditorError> {
        if self.cursor == self.changes.len() {
            return Ok(None);
        }
        let change = self.changes[self.cursor].clone();
        for op in &change.ops {
            op.apply(graph)?;
        }
        self.cursor += 1;
        Ok(Some(change))
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.changes.len()
    }

    pub fn undo_levels(&self) -> usize {
        self.cursor
    }

    pub fn redo_levels(&self) -> usize {
        self.changes.len() - self.cursor
    }

    /// All recorded changes, done side first.
    pub fn changes(&self) -> &[DocumentChange] {
        &self.changes
    }

    pub fn reset(&mut self) {
        self.changes.clear();
        self.cursor = 0;
    }
}
