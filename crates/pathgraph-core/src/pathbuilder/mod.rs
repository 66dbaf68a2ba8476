//! Read-only pathbuilder input model.
//!
//! ## Submodules
//!
//! - [`path`]: one [`PathRecord`] (group or field) as stored in a pathbuilder.
//! - [`tree`]: [`PathTree`]: records nested by group, walked in pre-order.
//! - [`element`]: the annotated concept/property sequence of each node.

pub mod element;
pub mod path;
pub mod tree;

pub use element::{ElementKind, PathElement, PropertyRole, path_elements};
pub use path::PathRecord;
pub use tree::{NodeKind, PathTree, TreeError, TreeIndex, TreeNode, Walk};
