//! Inverse property map.
//!
//! Registers pairs `(canonical, inverse)` of property URIs. An edge drawn
//! along an inverse property is rewritten to the canonical property with
//! its endpoints swapped, so the same relationship always renders in one
//! direction no matter which side a path walked it from.

use std::collections::HashMap;

use tracing::warn;

/// Result of [`InverseMap::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InverseCheck<'a> {
    pub canonical: &'a str,
    pub inverse: &'a str,
    /// `true` if the checked URI was the inverse side of the pair.
    pub is_inverted: bool,
}

/// An edge after canonicalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalEdge<T> {
    pub uri: String,
    pub inverse: Option<String>,
    pub source: T,
    pub target: T,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InverseMap {
    inverse_of: HashMap<String, String>,
    canonical_of: HashMap<String, String>,
    order: Vec<(String, String)>,
}

impl InverseMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `inverse` as the inverse of `canonical`.
    ///
    /// A URI may take part in at most one pair. Conflicting registrations
    /// are logged and ignored; the first registration wins. Returns whether
    /// the pair was added.
    pub fn insert(&mut self, canonical: &str, inverse: &str) -> bool {
        let taken =
            |uri: &str| self.inverse_of.contains_key(uri) || self.canonical_of.contains_key(uri);
        if taken(canonical) || taken(inverse) {
            warn!(canonical, inverse, "property already has a registered inverse; ignoring pair");
            return false;
        }
        self.inverse_of
            .insert(canonical.to_string(), inverse.to_string());
        self.canonical_of
            .insert(inverse.to_string(), canonical.to_string());
        self.order.push((canonical.to_string(), inverse.to_string()));
        true
    }

    /// Number of registered pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Registered pairs in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order.iter().map(|(c, i)| (c.as_str(), i.as_str()))
    }

    /// Look up the pair `uri` belongs to, if any.
    #[must_use]
    pub fn check(&self, uri: &str) -> Option<InverseCheck<'_>> {
        if let Some((canonical, inverse)) = self.inverse_of.get_key_value(uri) {
            return Some(InverseCheck {
                canonical,
                inverse,
                is_inverted: false,
            });
        }
        self.canonical_of
            .get_key_value(uri)
            .map(|(inverse, canonical)| InverseCheck {
                canonical,
                inverse,
                is_inverted: true,
            })
    }

    /// Rewrite an edge `source --uri--> target` into canonical form.
    ///
    /// Unregistered URIs pass through unchanged with no inverse. When `uri`
    /// is the inverse side of a pair, the canonical URI is used and the
    /// endpoints are swapped.
    #[must_use]
    pub fn canonicalize_edge<T>(&self, uri: &str, source: T, target: T) -> CanonicalEdge<T> {
        match self.check(uri) {
            None => CanonicalEdge {
                uri: uri.to_string(),
                inverse: None,
                source,
                target,
            },
            Some(check) => {
                let (source, target) = if check.is_inverted {
                    (target, source)
                } else {
                    (source, target)
                };
                CanonicalEdge {
                    uri: check.canonical.to_string(),
                    inverse: Some(check.inverse.to_string()),
                    source,
                    target,
                }
            }
        }
    }
}

impl<S: AsRef<str>> FromIterator<(S, S)> for InverseMap {
    fn from_iter<I: IntoIterator<Item = (S, S)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (canonical, inverse) in iter {
            map.insert(canonical.as_ref(), inverse.as_ref());
        }
        map
    }
}
