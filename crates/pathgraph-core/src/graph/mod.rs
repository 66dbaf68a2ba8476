//! Directed graph storage.
//!
//! - [`store`]: the generic [`Graph`] container: numeric ids with optional
//!   string aliases, one edge per ordered pair, insertion-ordered snapshots
//!   and a deterministic JSON form.

pub mod store;

pub use store::{EdgeId, EdgeView, Graph, GraphError, NodeId, NodeRef};
