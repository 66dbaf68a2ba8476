//! pathgraph-core library.
//!
//! Turns a pathbuilder (a tree of bundles and fields, each described by a
//! path through an ontology) into a deduplicated model graph of classes,
//! literals and the properties between them.
//!
//! ```
//! use pathgraph_core::model::{DedupOptions, Deduplication, ModelGraphBuilder};
//! use pathgraph_core::pathbuilder::{PathRecord, PathTree};
//!
//! let tree = PathTree::from_paths([
//!     PathRecord::bundle("person", &["ex:Person"]),
//!     PathRecord::field("name", &["ex:Person"], "ex:name").in_group("person"),
//! ])?;
//! let mut builder =
//!     ModelGraphBuilder::new(&tree, DedupOptions::default(), Deduplication::Parents);
//! let graph = builder.build()?;
//! assert_eq!(graph.node_count(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums with an [`ErrorCode`] inside the library;
//!   `anyhow::Result` only for configuration loading.
//! - **Logging**: `tracing` macros. Input problems are `warn!` and never
//!   abort a build. No subscriber is installed here.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod graph;
pub mod inverse;
pub mod model;
pub mod pathbuilder;

pub use error::ErrorCode;
pub use graph::Graph;
pub use inverse::InverseMap;
pub use model::{DedupOptions, Deduplication, ModelGraph, ModelGraphBuilder};
pub use pathbuilder::{PathRecord, PathTree};
