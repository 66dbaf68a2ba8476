//! Path element model: the annotated concept/property sequence of a path.
//!
//! Each element carries two offsets used by deduplication strategies:
//!
//! - **common**: `index − shared`, where `shared` is how many leading
//!   `path_array` entries this path has in common with its parent's own
//!   path (cut back so the shared prefix ends on a concept). A negative
//!   value means the element lies inside the shared prefix. `None` for
//!   top-level paths.
//! - **disambiguation**: offset from the disambiguating concept, or `None`
//!   when the path declares no disambiguation.

use serde::Serialize;

use super::path::PathRecord;

/// What a property element connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyRole {
    /// Object property between two concepts.
    Relation,
    /// Datatype property ending in a literal.
    Datatype,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Concept {
        concept_index: usize,
    },
    Property {
        property_index: usize,
        role: PropertyRole,
    },
}

/// One URI position in a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathElement {
    #[serde(flatten)]
    pub kind: ElementKind,
    pub uri: String,
    /// Position in the element sequence.
    pub index: usize,
    pub common: Option<isize>,
    pub disambiguation: Option<isize>,
}

impl PathElement {
    #[must_use]
    pub const fn is_concept(&self) -> bool {
        matches!(self.kind, ElementKind::Concept { .. })
    }

    #[must_use]
    pub const fn concept_index(&self) -> Option<usize> {
        match self.kind {
            ElementKind::Concept { concept_index } => Some(concept_index),
            ElementKind::Property { .. } => None,
        }
    }

    /// Role of a property element; `None` for concepts.
    #[must_use]
    pub const fn role(&self) -> Option<PropertyRole> {
        match self.kind {
            ElementKind::Property { role, .. } => Some(role),
            ElementKind::Concept { .. } => None,
        }
    }

    /// Returns `true` if this element lies in the prefix shared with the
    /// parent path.
    #[must_use]
    pub const fn is_shared_with_parent(&self) -> bool {
        matches!(self.common, Some(common) if common < 0)
    }
}

/// Number of leading entries `own` shares with `parent`, cut back to end on
/// a concept.
fn shared_prefix(own: &[String], parent: &[String]) -> usize {
    let shared = own
        .iter()
        .zip(parent)
        .take_while(|(a, b)| a == b)
        .count();
    if shared % 2 == 0 {
        shared.saturating_sub(1)
    } else {
        shared
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn offset(index: usize, origin: usize) -> isize {
    index as isize - origin as isize
}

/// Build the annotated element sequence for `path`, given the path of its
/// parent in the tree (if any).
///
/// A datatype element is appended only when the path declares a datatype
/// property and its `path_array` ends on a concept.
#[must_use]
pub fn path_elements(path: &PathRecord, parent: Option<&PathRecord>) -> Vec<PathElement> {
    let shared = parent.map(|p| shared_prefix(&path.path_array, &p.path_array));
    let disambiguation = (path.disambiguation > 0).then(|| 2 * (path.disambiguation - 1));

    let annotate = |kind: ElementKind, uri: &str, index: usize| PathElement {
        kind,
        uri: uri.to_string(),
        index,
        common: shared.map(|s| offset(index, s)),
        disambiguation: disambiguation.map(|d| offset(index, d)),
    };

    let mut elements: Vec<PathElement> = path
        .path_array
        .iter()
        .enumerate()
        .map(|(index, uri)| {
            let kind = if index % 2 == 0 {
                ElementKind::Concept {
                    concept_index: index / 2,
                }
            } else {
                ElementKind::Property {
                    property_index: index / 2,
                    role: PropertyRole::Relation,
                }
            };
            annotate(kind, uri, index)
        })
        .collect();

    let ends_on_concept = path.path_array.len() % 2 == 1;
    if !path.is_group && path.has_datatype_property() && ends_on_concept {
        let index = path.path_array.len();
        elements.push(annotate(
            ElementKind::Property {
                property_index: index / 2,
                role: PropertyRole::Datatype,
            },
            &path.datatype_property,
            index,
        ));
    }

    elements
}
