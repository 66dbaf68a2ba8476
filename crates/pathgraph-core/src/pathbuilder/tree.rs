//! Pathbuilder tree: bundles nesting further bundles and fields.
//!
//! A pathbuilder is stored as a flat list of [`PathRecord`]s where each
//! record names its enclosing group through `group_id`.
//! [`PathTree::from_paths`] nests them and fixes the walk order.
//!
//! # Anomalies
//!
//! Structural problems that still leave every path placeable are logged
//! and repaired by moving the path to the top level:
//!
//! - `group_id` names no known path,
//! - `group_id` names a field (fields cannot have children),
//! - the group chain loops back onto itself.
//!
//! Missing or duplicate ids make the input unaddressable and are rejected
//! with a [`TreeError`].

use std::collections::{HashMap, HashSet};
use std::ops::Index;

use tracing::{instrument, warn};

use super::element::{PathElement, path_elements};
use super::path::PathRecord;
use crate::error::ErrorCode;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Position of a node in its [`PathTree`]; equal to the input index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreeIndex(usize);

impl TreeIndex {
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Bundle,
    Field,
}

/// A bundle or field in the tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    index: TreeIndex,
    kind: NodeKind,
    path: PathRecord,
    parent: Option<TreeIndex>,
    children: Vec<TreeIndex>,
}

impl TreeNode {
    #[must_use]
    pub const fn index(&self) -> TreeIndex {
        self.index
    }

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub const fn path(&self) -> &PathRecord {
        &self.path
    }

    /// Shorthand for `self.path().id`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.path.id
    }

    #[must_use]
    pub const fn parent(&self) -> Option<TreeIndex> {
        self.parent
    }

    /// Children in walk order.
    #[must_use]
    pub fn children(&self) -> &[TreeIndex] {
        &self.children
    }

    #[must_use]
    pub const fn is_bundle(&self) -> bool {
        matches!(self.kind, NodeKind::Bundle)
    }
}

/// Errors that make a path list impossible to assemble into a tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("duplicate path id {0:?}")]
    DuplicatePathId(String),

    #[error("path at input position {0} has an empty id")]
    EmptyPathId(usize),
}

impl TreeError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::DuplicatePathId(_) => ErrorCode::DuplicatePathId,
            Self::EmptyPathId(_) => ErrorCode::EmptyPathId,
        }
    }
}

/// A read-only tree of bundles and fields.
#[derive(Debug, Clone, Default)]
pub struct PathTree {
    nodes: Vec<TreeNode>,
    roots: Vec<TreeIndex>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl PathTree {
    /// Nest a flat list of paths by their `group_id`.
    ///
    /// Siblings are ordered by `(weight, input position)`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::EmptyPathId`] or [`TreeError::DuplicatePathId`]
    /// if the ids do not identify paths uniquely.
    #[instrument(skip_all)]
    pub fn from_paths(paths: impl IntoIterator<Item = PathRecord>) -> Result<Self, TreeError> {
        let paths: Vec<PathRecord> = paths.into_iter().collect();

        let mut by_id: HashMap<&str, usize> = HashMap::with_capacity(paths.len());
        for (i, path) in paths.iter().enumerate() {
            if path.id.is_empty() {
                return Err(TreeError::EmptyPathId(i));
            }
            if by_id.insert(path.id.as_str(), i).is_some() {
                return Err(TreeError::DuplicatePathId(path.id.clone()));
            }
        }

        let mut parents: Vec<Option<usize>> = paths
            .iter()
            .enumerate()
            .map(|(i, path)| resolve_group(&paths, &by_id, i, path))
            .collect();
        break_cycles(&paths, &mut parents);

        let mut nodes: Vec<TreeNode> = paths
            .into_iter()
            .zip(&parents)
            .enumerate()
            .map(|(i, (path, parent))| TreeNode {
                index: TreeIndex(i),
                kind: if path.is_group {
                    NodeKind::Bundle
                } else {
                    NodeKind::Field
                },
                path,
                parent: parent.map(TreeIndex),
                children: Vec::new(),
            })
            .collect();

        let mut roots = Vec::new();
        for (i, parent) in parents.iter().enumerate() {
            match parent {
                Some(p) => nodes[*p].children.push(TreeIndex(i)),
                None => roots.push(TreeIndex(i)),
            }
        }

        let sort_key = |nodes: &[TreeNode], i: &TreeIndex| (nodes[i.0].path.weight, i.0);
        roots.sort_by_key(|i| sort_key(&nodes, i));
        for i in 0..nodes.len() {
            let mut children = std::mem::take(&mut nodes[i].children);
            children.sort_by_key(|c| sort_key(&nodes, c));
            nodes[i].children = children;
        }

        Ok(Self { nodes, roots })
    }
}

/// Find the parent index for path `i`, or `None` for the top level.
fn resolve_group(
    paths: &[PathRecord],
    by_id: &HashMap<&str, usize>,
    i: usize,
    path: &PathRecord,
) -> Option<usize> {
    if path.is_top_level() {
        return None;
    }
    let Some(&parent) = by_id.get(path.group_id.as_str()) else {
        warn!(
            path_id = %path.id,
            group_id = %path.group_id,
            "group does not exist; placing path at top level"
        );
        return None;
    };
    if parent == i {
        warn!(path_id = %path.id, "path is its own group; placing path at top level");
        return None;
    }
    if !paths[parent].is_group {
        warn!(
            path_id = %path.id,
            group_id = %path.group_id,
            "group id names a field; placing path at top level"
        );
        return None;
    }
    Some(parent)
}

/// Detach the first-visited member of every group cycle.
fn break_cycles(paths: &[PathRecord], parents: &mut [Option<usize>]) {
    for start in 0..parents.len() {
        let mut seen = HashSet::new();
        seen.insert(start);
        let mut current = parents[start];
        while let Some(p) = current {
            if p == start {
                warn!(
                    path_id = %paths[start].id,
                    "group cycle detected; placing path at top level"
                );
                parents[start] = None;
                break;
            }
            if !seen.insert(p) {
                // Cycle further up, not through `start`; handled when its
                // own members are visited.
                break;
            }
            current = parents[p];
        }
    }
}

// ---------------------------------------------------------------------------
// Access
// ---------------------------------------------------------------------------

impl PathTree {
    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level nodes in walk order.
    #[must_use]
    pub fn roots(&self) -> &[TreeIndex] {
        &self.roots
    }

    #[must_use]
    pub fn get(&self, index: TreeIndex) -> Option<&TreeNode> {
        self.nodes.get(index.0)
    }

    /// Look up a node by path id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        self.nodes.iter().find(|node| node.path.id == id)
    }

    #[must_use]
    pub fn parent(&self, node: &TreeNode) -> Option<&TreeNode> {
        node.parent.and_then(|p| self.get(p))
    }

    /// Nearest bundle enclosing `node`, or `node` itself if it is a bundle.
    #[must_use]
    pub fn enclosing_bundle<'t>(&'t self, node: &'t TreeNode) -> Option<&'t TreeNode> {
        if node.is_bundle() {
            return Some(node);
        }
        self.parent(node)
    }

    /// Depth-first pre-order walk; siblings in `(weight, input)` order.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            tree: self,
            stack: self.roots.iter().rev().copied().collect(),
        }
    }

    /// Annotated element sequence of `node` relative to its parent.
    #[must_use]
    pub fn elements(&self, node: &TreeNode) -> Vec<PathElement> {
        path_elements(&node.path, self.parent(node).map(TreeNode::path))
    }
}

impl Index<TreeIndex> for PathTree {
    type Output = TreeNode;

    fn index(&self, index: TreeIndex) -> &TreeNode {
        &self.nodes[index.0]
    }
}

/// Iterator returned by [`PathTree::walk`].
#[derive(Debug, Clone)]
pub struct Walk<'t> {
    tree: &'t PathTree,
    stack: Vec<TreeIndex>,
}

impl<'t> Iterator for Walk<'t> {
    type Item = &'t TreeNode;

    fn next(&mut self) -> Option<&'t TreeNode> {
        let index = self.stack.pop()?;
        let node = self.tree.get(index)?;
        self.stack.extend(node.children.iter().rev().copied());
        Some(node)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
