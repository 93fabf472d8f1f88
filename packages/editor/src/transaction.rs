//! The scoped editing context
//!
//! A `Transaction` borrows the document graph for the duration of one
//! transformation. Every mutation constructs an operation, applies it
//! immediately, and appends it to the log, so the transformation sees
//! consistent intermediate state and the session can roll the whole log
//! back if anything fails. A transaction that errors leaves no trace.

use std::collections::HashSet;

use vellum_model::{DocumentGraph, ModelError, Node, NodeId, Path, Value};

use crate::errors::EditorError;
use crate::operations::Operation;
use crate::selection::Selection;

pub struct Transaction<'a> {
    graph: &'a mut DocumentGraph,
    ops: Vec<Operation>,
    selection: Selection,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(graph: &'a mut DocumentGraph, selection: Selection) -> Self {
        Transaction {
            graph,
            ops: Vec::new(),
            selection,
        }
    }

    /// Read access to the live document, including edits made earlier in
    /// this transaction.
    pub fn graph(&self) -> &DocumentGraph {
        self.graph
    }

    /// The operations logged so far, in application order.
    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Sets the selection the session should end up with when this
    /// transaction commits.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub(crate) fn finish(self) -> (Vec<Operation>, Selection) {
        (self.ops, self.selection)
    }

    // Applies an operation and logs it. Nothing is logged when the
    // application fails, so the log always mirrors the graph.
    fn record(&mut self, op: Operation) -> Result<(), EditorError> {
        op.apply(self.graph)?;
        self.ops.push(op);
        Ok(())
    }

    pub fn create(&mut self, node: Node) -> Result<(), EditorError> {
        self.record(Operation::Create { node })
    }

    pub fn delete(&mut self, id: &str) -> Result<(), EditorError> {
        let node = self.graph.get_strict(id)?.clone();
        self.record(Operation::Delete { node })
    }

    /// Deletes a node together with every node its `Ids` properties
    /// transitively own. Membership of the node in some other collection
    /// is not touched; remove it with [`Transaction::remove_from_collection`].
    pub fn deep_delete(&mut self, id: &str) -> Result<(), EditorError> {
        let mut visited = HashSet::new();
        self.deep_delete_inner(id, &mut visited)
    }

    fn deep_delete_inner(
        &mut self,
        id: &str,
        visited: &mut HashSet<String>,
    ) -> Result<(), EditorError> {
        if !visited.insert(id.to_string()) {
            return Ok(());
        }
        let node = self.graph.get_strict(id)?.clone();
        for value in node.properties.values() {
            if let Value::Ids(children) = value {
                for child in children {
                    if self.graph.contains(child) {
                        self.deep_delete_inner(child, visited)?;
                    }
                }
            }
        }
        self.delete(id)
    }

    pub fn set(&mut self, path: &Path, value: impl Into<Value>) -> Result<(), EditorError> {
        let new = value.into();
        self.graph.get_strict(path.node_id())?;
        let old = self.graph.value(path).cloned().unwrap_or(Value::Null);
        self.record(Operation::Set {
            path: path.clone(),
            old,
            new,
        })
    }

    pub fn insert_at(
        &mut self,
        path: &Path,
        index: usize,
        id: impl Into<NodeId>,
    ) -> Result<(), EditorError> {
        self.record(Operation::Insert {
            path: path.clone(),
            index,
            id: id.into(),
        })
    }

    /// Removes and returns the entry at `index` of the collection at
    /// `path`.
    pub fn remove_at(&mut self, path: &Path, index: usize) -> Result<NodeId, EditorError> {
        let entries = self.graph.ids(path)?;
        let id = entries.get(index).cloned().ok_or_else(|| {
            EditorError::Model(ModelError::IndexOutOfBounds {
                path: path.clone(),
                index,
                len: entries.len(),
            })
        })?;
        self.record(Operation::Remove {
            path: path.clone(),
            index,
            id: id.clone(),
        })?;
        Ok(id)
    }

    pub fn append(&mut self, path: &Path, id: impl Into<NodeId>) -> Result<(), EditorError> {
        let index = self.graph.ids(path)?.len();
        self.insert_at(path, index, id)
    }

    /// Removes `id` from the collection at `path`, wherever it sits.
    pub fn remove_from_collection(&mut self, path: &Path, id: &str) -> Result<(), EditorError> {
        self.graph.ids(path)?;
        let index = self
            .graph
            .position_of(path, id)
            .ok_or_else(|| EditorError::Model(ModelError::MissingParent(id.to_string())))?;
        self.remove_at(path, index)?;
        Ok(())
    }

    /// Moves the entry at `from` to position `to`, where `to` addresses
    /// the collection as it looks after the removal.
    pub fn move_item(&mut self, path: &Path, from: usize, to: usize) -> Result<(), EditorError> {
        let id = self.remove_at(path, from)?;
        self.insert_at(path, to, id)
    }

    /// Inserts `text` at a character offset of the text property at
    /// `path`.
    pub fn insert_text(&mut self, path: &Path, offset: usize, text: &str) -> Result<(), EditorError> {
        let old = self.graph.text(path)?.to_string();
        let byte = char_to_byte(&old, offset).ok_or_else(|| EditorError::InvalidRange {
            path: path.clone(),
            start: offset,
            end: offset,
            len: old.chars().count(),
        })?;
        let mut new = old.clone();
        new.insert_str(byte, text);
        self.record(Operation::Set {
            path: path.clone(),
            old: Value::Text(old),
            new: Value::Text(new),
        })
    }

    /// Deletes the character range `start..end` of the text property at
    /// `path`.
    pub fn delete_text(
        &mut self,
        path: &Path,
        start: usize,
        end: usize,
    ) -> Result<(), EditorError> {
        let old = self.graph.text(path)?.to_string();
        let len = old.chars().count();
        if start > end || end > len {
            return Err(EditorError::InvalidRange {
                path: path.clone(),
                start,
                end,
                len,
            });
        }
        let start_byte = char_to_byte(&old, start).unwrap_or(old.len());
        let end_byte = char_to_byte(&old, end).unwrap_or(old.len());
        let mut new = old.clone();
        new.replace_range(start_byte..end_byte, "");
        self.record(Operation::Set {
            path: path.clone(),
            old: Value::Text(old),
            new: Value::Text(new),
        })
    }
}

// Byte position of the `offset`-th character boundary, including the
// end-of-string boundary.
fn char_to_byte(s: &str, offset: usize) -> Option<usize> {
    s.char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(s.len()))
        .nth(offset)
}
