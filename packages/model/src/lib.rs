//! Document model for the Vellum editing engine
//!
//! This crate provides the node graph the editing layer mutates: typed
//! nodes with scalar and ordered-reference properties, a schema registry
//! describing how each node type behaves under editing, and path-based
//! addressing into node properties.

pub mod errors;
pub mod graph;
pub mod node;
pub mod path;
pub mod schema;

pub use errors::*;
pub use graph::*;
pub use node::*;
pub use path::*;
pub use schema::*;
