//! # Vellum Editor
//!
//! Session layer for editing a structured document graph.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: nodes, schema, document graph        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditorSession                       │
//! │  - Atomic transactions over the graph       │
//! │  - Selection construction + normalization   │
//! │  - Undo/redo via invertible changes         │
//! │  - Batched updates to observers             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ observers: rendering, persistence, sync     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The graph is source of truth**: selections and updates are
//!    derived views and are re-validated against it
//! 2. **Changes are invertible**: every committed change can be rolled
//!    back operation by operation, which is what undo does
//! 3. **All or nothing**: a failed transformation leaves the graph
//!    exactly as it was
//! 4. **One writer**: a session never runs two transactions at once
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vellum_editor::EditorSession;
//! use vellum_model::{DocumentGraph, Path};
//!
//! let mut session = EditorSession::new(graph);
//!
//! // Edit atomically
//! session.transaction(|tx| {
//!     tx.insert_text(&Path::property("p1", "content"), 0, "Hello ")
//! })?;
//!
//! // Roll it back
//! session.undo()?;
//! ```

mod change;
mod coordinate;
mod errors;
mod history;
mod observer;
mod operations;
mod selection;
mod selection_helpers;
mod session;
mod state;
mod transaction;

pub use change::{ChangeInfo, DocumentChange};
pub use coordinate::{compare_coordinates, Coordinate};
pub use errors::EditorError;
pub use history::ChangeHistory;
pub use observer::{EditorObserver, ObserverError, ObserverId, ObserverRegistry};
pub use operations::Operation;
pub use selection::{NodeSelectionMode, Selection, SelectionDescriptor};
pub use selection_helpers::{
    augment_selection, covered_node_ids, create_node_selection, create_selection,
    is_entirely_selected, is_first, is_last, rectify_selection, set_cursor,
};
pub use session::EditorSession;
pub use state::{DocumentUpdate, UpdateDomain};
pub use transaction::Transaction;

// Re-export model types for convenience
pub use vellum_model::{DocumentGraph, Node, NodeId, Path, Schema, Value};
