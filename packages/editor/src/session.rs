//! # Editing Session
//!
//! The session is the single writer of a document graph. It runs
//! transformations as atomic transactions, keeps the selection and the
//! change history consistent with the graph, and propagates pending
//! updates to observers in a fixed order (document first, selection
//! second) after every externally triggered step.
//!
//! An observer may reject a committed change from its `on_change` hook;
//! the session then rolls the change back, restores the previous
//! selection, and reports the rescue before returning the error to the
//! caller.

use tracing::{debug, warn};

use vellum_model::{DocumentGraph, NodeId};

use crate::change::{ChangeInfo, DocumentChange};
use crate::errors::EditorError;
use crate::history::ChangeHistory;
use crate::observer::{EditorObserver, ObserverId, ObserverRegistry};
use crate::operations::revert_all;
use crate::selection::{Selection, SelectionDescriptor};
use crate::selection_helpers::{augment_selection, create_selection, rectify_selection};
use crate::state::{EditorState, UpdateDomain};
use crate::transaction::Transaction;

// Pending updates are delivered in this order so selection observers
// always see a graph that already reflects the change they follow.
const FLUSH_ORDER: [UpdateDomain; 2] = [UpdateDomain::Document, UpdateDomain::Selection];

pub struct EditorSession {
    graph: DocumentGraph,
    history: ChangeHistory,
    state: EditorState,
    observers: ObserverRegistry,
    in_transaction: bool,
}

impl EditorSession {
    pub fn new(graph: DocumentGraph) -> Self {
        Self::with_history(graph, ChangeHistory::new())
    }

    /// A session whose undo depth is controlled by `history`.
    pub fn with_history(graph: DocumentGraph, history: ChangeHistory) -> Self {
        EditorSession {
            graph,
            history,
            state: EditorState::new(),
            observers: ObserverRegistry::new(),
            in_transaction: false,
        }
    }

    pub fn graph(&self) -> &DocumentGraph {
        &self.graph
    }

    pub fn add_observer(&mut self, observer: Box<dyn EditorObserver>) -> ObserverId {
        self.observers.add(observer)
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    // -- selection ----------------------------------------------------

    pub fn selection(&self) -> &Selection {
        self.state.selection()
    }

    /// Installs `selection` after carrying over context from the current
    /// one and re-validating it against the graph. Returns the selection
    /// that actually took effect.
    pub fn set_selection(&mut self, selection: Selection) -> Selection {
        let previous = self.state.selection().clone();
        let mut selection = selection;
        augment_selection(&mut selection, &previous);
        let selection = rectify_selection(&self.graph, selection);
        self.state.set_selection(selection.clone());
        self.flush();
        selection
    }

    /// Builds a selection from a descriptor and installs it.
    pub fn set_selection_from(
        &mut self,
        descriptor: &SelectionDescriptor,
    ) -> Result<Selection, EditorError> {
        let selection = create_selection(&self.graph, descriptor)?;
        Ok(self.set_selection(selection))
    }

    // -- transactions -------------------------------------------------

    /// Runs `f` as an atomic transaction with default change info.
    pub fn transaction<F>(&mut self, f: F) -> Result<Option<DocumentChange>, EditorError>
    where
        F: FnOnce(&mut Transaction) -> Result<(), EditorError>,
    {
        self.transaction_with(ChangeInfo::default(), f)
    }

    /// Runs `f` as an atomic transaction.
    ///
    /// When `f` returns an error every operation it already applied is
    /// reverted in reverse order and the error is passed through. When
    /// `f` succeeds without logging any operation, only the selection is
    /// updated and `Ok(None)` is returned. Otherwise the resulting
    /// change is committed, recorded in the history, and returned.
    pub fn transaction_with<F>(
        &mut self,
        info: ChangeInfo,
        f: F,
    ) -> Result<Option<DocumentChange>, EditorError>
    where
        F: FnOnce(&mut Transaction) -> Result<(), EditorError>,
    {
        if self.in_transaction {
            return Err(EditorError::ReentrantTransaction);
        }
        self.in_transaction = true;
        let result = self.run_transaction(info, f);
        self.in_transaction = false;
        result
    }

    fn run_transaction<F>(
        &mut self,
        info: ChangeInfo,
        f: F,
    ) -> Result<Option<DocumentChange>, EditorError>
    where
        F: FnOnce(&mut Transaction) -> Result<(), EditorError>,
    {
        let before = self.state.selection().clone();
        let mut tx = Transaction::new(&mut self.graph, before.clone());
        let outcome = f(&mut tx);
        let (ops, after) = tx.finish();

        if let Err(err) = outcome {
            debug!(error = %err, ops = ops.len(), "transaction failed, rolling back");
            revert_all(&mut self.graph, &ops)?;
            return Err(err);
        }

        let mut after = after;
        augment_selection(&mut after, &before);
        let after = rectify_selection(&self.graph, after);

        if ops.is_empty() {
            self.state.set_selection(after);
            self.flush();
            return Ok(None);
        }

        let mut change = DocumentChange::new(ops, before.clone(), after.clone());
        change.info = info.clone();
        change.collect_updated();

        if let Err(rejection) = self.observers.notify_change(&change, &info) {
            warn!(error = %rejection, "change rejected, rolling back");
            revert_all(&mut self.graph, &change.ops)?;
            self.state.set_selection(before);
            self.observers.notify_rescue();
            self.flush();
            return Err(EditorError::CommitFailure(rejection));
        }

        debug!(ops = change.ops.len(), "transaction committed");
        self.state.set_selection(after);
        self.history.add_change(change.clone());
        self.state.record_change(&change, &info);
        self.state.mark_unsaved();
        self.flush();
        Ok(Some(change))
    }

    /// Applies an externally produced change through the same commit
    /// path a transaction uses.
    ///
    /// The change is added to the history unless `info.replay` is set;
    /// a replayed change restores its own `after` selection instead.
    pub fn apply_change(
        &mut self,
        change: DocumentChange,
        info: ChangeInfo,
    ) -> Result<(), EditorError> {
        if self.in_transaction {
            return Err(EditorError::ReentrantTransaction);
        }
        let mut change = change;
        if change.updated.is_empty() {
            change.collect_updated();
        }

        let mut applied = 0;
        let mut failure = None;
        for op in &change.ops {
            if let Err(err) = op.apply(&mut self.graph) {
                failure = Some(err);
                break;
            }
            applied += 1;
        }
        if let Some(err) = failure {
            debug!(error = %err, applied, "external change failed, rolling back");
            revert_all(&mut self.graph, &change.ops[..applied])?;
            return Err(err);
        }

        if let Err(rejection) = self.observers.notify_change(&change, &info) {
            warn!(error = %rejection, "external change rejected, rolling back");
            revert_all(&mut self.graph, &change.ops)?;
            self.observers.notify_rescue();
            self.flush();
            return Err(EditorError::CommitFailure(rejection));
        }

        if info.replay {
            let selection = rectify_selection(&self.graph, change.after.clone());
            self.state.set_selection(selection);
        } else {
            self.history.add_change(change.clone());
        }
        self.state.record_change(&change, &info);
        self.state.mark_unsaved();
        self.flush();
        Ok(())
    }

    // -- history ------------------------------------------------------

    /// Reverts the youngest undone-able change and restores the
    /// selection that was current before it. Returns the change that was
    /// undone, or `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<Option<DocumentChange>, EditorError> {
        if self.in_transaction {
            return Err(EditorError::ReentrantTransaction);
        }
        let change = match self.history.undo(&mut self.graph)? {
            Some(change) => change,
            None => return Ok(None),
        };
        debug!(ops = change.ops.len(), "undo");
        let selection = rectify_selection(&self.graph, change.before.clone());
        self.state.set_selection(selection);
        self.state.record_change(&change.invert(), &ChangeInfo::default());
        self.state.mark_unsaved();
        self.flush();
        Ok(Some(change))
    }

    /// Re-applies the youngest undone change and restores its `after`
    /// selection. Returns the change that was redone, or `None` when
    /// there is nothing to redo.
    pub fn redo(&mut self) -> Result<Option<DocumentChange>, EditorError> {
        if self.in_transaction {
            return Err(EditorError::ReentrantTransaction);
        }
        let change = match self.history.redo(&mut self.graph)? {
            Some(change) => change,
            None => return Ok(None),
        };
        debug!(ops = change.ops.len(), "redo");
        let selection = rectify_selection(&self.graph, change.after.clone());
        self.state.set_selection(selection);
        self.state.record_change(&change, &ChangeInfo::default());
        self.state.mark_unsaved();
        self.flush();
        Ok(Some(change))
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn changes(&self) -> &[DocumentChange] {
        self.history.changes()
    }

    pub fn reset_history(&mut self) {
        self.history.reset();
    }

    // -- volatile node state ------------------------------------------

    /// Marks nodes whose volatile state changed so observers refresh
    /// them with the next document update. With `silent` set the marks
    /// are folded into whatever update is delivered next; otherwise an
    /// update goes out immediately.
    pub fn update_node_states(
        &mut self,
        ids: impl IntoIterator<Item = NodeId>,
        silent: bool,
    ) {
        let ids: Vec<NodeId> = ids
            .into_iter()
            .filter(|id| self.graph.contains(id))
            .collect();
        if ids.is_empty() {
            return;
        }
        self.state.record_node_states(ids);
        if !silent {
            self.flush();
        }
    }

    // -- dirty tracking -----------------------------------------------

    pub fn has_unsaved_changes(&self) -> bool {
        self.state.has_unsaved_changes()
    }

    pub fn mark_saved(&mut self) {
        self.state.mark_saved();
    }

    // -- update propagation -------------------------------------------

    fn flush(&mut self) {
        for domain in FLUSH_ORDER {
            if !self.state.is_dirty(domain) {
                continue;
            }
            match domain {
                UpdateDomain::Document => {
                    if let Some(update) = self.state.take_pending_document() {
                        self.observers.notify_document_update(&update);
                    }
                }
                UpdateDomain::Selection => {
                    if self.state.take_pending_selection() {
                        self.observers.notify_selection_update(self.state.selection());
                    }
                }
            }
        }
    }
}
