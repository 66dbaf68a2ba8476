//! One pathbuilder entry.

use serde::{Deserialize, Serialize};

/// A single pathbuilder path: either a group (bundle) or a field.
///
/// `path_array` alternates concept and property URIs, starting and ending
/// with a concept. A field may additionally end in a datatype property
/// that leads to a literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRecord {
    /// Unique machine id of the path.
    pub id: String,
    /// Human-readable label.
    #[serde(default)]
    pub name: String,
    /// Alternating concept / property URIs.
    #[serde(default)]
    pub path_array: Vec<String>,
    /// Datatype property terminating a field; empty when absent.
    #[serde(default)]
    pub datatype_property: String,
    /// 1-based concept position used for disambiguation; `0` for none.
    #[serde(default)]
    pub disambiguation: usize,
    /// Id of the enclosing group; empty or `"0"` for top level.
    #[serde(default)]
    pub group_id: String,
    /// Whether this path is a group (bundle) rather than a field.
    #[serde(default)]
    pub is_group: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Sort key among siblings; ties keep input order.
    #[serde(default)]
    pub weight: i64,
}

const fn default_true() -> bool {
    true
}

impl PathRecord {
    fn new(id: &str, path_array: &[&str], is_group: bool) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            path_array: path_array.iter().map(ToString::to_string).collect(),
            datatype_property: String::new(),
            disambiguation: 0,
            group_id: String::new(),
            is_group,
            enabled: true,
            weight: 0,
        }
    }

    /// A top-level group with the given concept/property sequence.
    #[must_use]
    pub fn bundle(id: &str, path_array: &[&str]) -> Self {
        Self::new(id, path_array, true)
    }

    /// A top-level field with the given sequence and datatype property
    /// (pass `""` for none).
    #[must_use]
    pub fn field(id: &str, path_array: &[&str], datatype_property: &str) -> Self {
        Self {
            datatype_property: datatype_property.to_string(),
            ..Self::new(id, path_array, false)
        }
    }

    /// Place this path inside the group `group_id`.
    #[must_use]
    pub fn in_group(mut self, group_id: &str) -> Self {
        self.group_id = group_id.to_string();
        self
    }

    #[must_use]
    pub const fn with_weight(mut self, weight: i64) -> Self {
        self.weight = weight;
        self
    }

    #[must_use]
    pub const fn with_disambiguation(mut self, concept: usize) -> Self {
        self.disambiguation = concept;
        self
    }

    /// Returns `true` if this path is not nested in any group.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.group_id.is_empty() || self.group_id == "0"
    }

    /// Returns `true` if a datatype property is declared.
    #[must_use]
    pub fn has_datatype_property(&self) -> bool {
        !self.datatype_property.is_empty()
    }

    /// Concept URIs in order (even positions of `path_array`).
    pub fn concepts(&self) -> impl Iterator<Item = &str> {
        self.path_array.iter().step_by(2).map(String::as_str)
    }
}
