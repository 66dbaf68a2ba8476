//! TOML configuration.
//!
//! ```toml
//! [graph]
//! deduplication = "parents"
//! exclude = ["internal_notes"]
//! skip_disabled = true
//!
//! [inverses]
//! pairs = [["ex:hasChild", "ex:childOf"]]
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::inverse::InverseMap;
use crate::model::{DedupOptions, Deduplication};

/// Name of the per-directory config file.
pub const LOCAL_CONFIG_FILE: &str = ".pathgraph.toml";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PathgraphConfig {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub inverses: InverseConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub deduplication: Deduplication,
    /// Path ids to leave out of the graph.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Treat paths with `enabled = false` as excluded.
    #[serde(default = "default_true")]
    pub skip_disabled: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            deduplication: Deduplication::default(),
            exclude: Vec::new(),
            skip_disabled: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InverseConfig {
    /// `[canonical, inverse]` property URI pairs.
    #[serde(default)]
    pub pairs: Vec<(String, String)>,
}

impl PathgraphConfig {
    #[must_use]
    pub fn inverse_map(&self) -> InverseMap {
        self.inverses
            .pairs
            .iter()
            .map(|(canonical, inverse)| (canonical.as_str(), inverse.as_str()))
            .collect()
    }

    /// Build options: the inverse map plus an include predicate derived
    /// from `exclude` and `skip_disabled`.
    #[must_use]
    pub fn dedup_options(&self) -> DedupOptions<'static> {
        let options = DedupOptions::new(self.inverse_map());
        let excluded: HashSet<String> = self.graph.exclude.iter().cloned().collect();
        let skip_disabled = self.graph.skip_disabled;
        if excluded.is_empty() && !skip_disabled {
            return options;
        }
        options.with_include(move |node| {
            !excluded.contains(node.id()) && (!skip_disabled || node.path().enabled)
        })
    }
}

/// Load a config file that must exist.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML for
/// [`PathgraphConfig`].
pub fn load_config(path: &Path) -> Result<PathgraphConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<PathgraphConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the effective configuration.
///
/// Lookup order: `explicit`, then `.pathgraph.toml` in `cwd`, then
/// `pathgraph/config.toml` in the user config directory. Defaults apply
/// when none of them exists.
///
/// # Errors
///
/// Returns an error if the chosen file cannot be read or parsed. A
/// missing `explicit` file is an error too.
pub fn resolve_config(explicit: Option<&Path>, cwd: &Path) -> Result<PathgraphConfig> {
    let user_dir = dirs::config_dir().map(|dir| dir.join("pathgraph"));
    resolve_config_in(explicit, cwd, user_dir.as_deref())
}

fn resolve_config_in(
    explicit: Option<&Path>,
    cwd: &Path,
    user_dir: Option<&Path>,
) -> Result<PathgraphConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match find_config(cwd, user_dir) {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path)
        }
        None => Ok(PathgraphConfig::default()),
    }
}

fn find_config(cwd: &Path, user_dir: Option<&Path>) -> Option<PathBuf> {
    let local = cwd.join(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }
    user_dir
        .map(|dir| dir.join("config.toml"))
        .filter(|path| path.exists())
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathbuilder::{PathRecord, PathTree};

    #[test]
    fn missing_config_uses_defaults() {
        let cwd = tempfile::tempdir().expect("tempdir");
        let cfg = resolve_config_in(None, cwd.path(), None).expect("load should succeed");
        assert_eq!(cfg, PathgraphConfig::default());
        assert_eq!(cfg.graph.deduplication, Deduplication::Parents);
        assert!(cfg.graph.skip_disabled);
    }

    #[test]
    fn local_config_wins_over_user_config() {
        let cwd = tempfile::tempdir().expect("tempdir");
        let user = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            cwd.path().join(LOCAL_CONFIG_FILE),
            "[graph]\ndeduplication = \"full\"\n",
        )
        .expect("write local");
        std::fs::write(
            user.path().join("config.toml"),
            "[graph]\ndeduplication = \"none\"\n",
        )
        .expect("write user");

        let cfg = resolve_config_in(None, cwd.path(), Some(user.path())).expect("load");
        assert_eq!(cfg.graph.deduplication, Deduplication::Full);

        std::fs::remove_file(cwd.path().join(LOCAL_CONFIG_FILE)).expect("remove");
        let cfg = resolve_config_in(None, cwd.path(), Some(user.path())).expect("load");
        assert_eq!(cfg.graph.deduplication, Deduplication::None);
    }

    #[test]
    fn explicit_path_must_exist() {
        let cwd = tempfile::tempdir().expect("tempdir");
        let missing = cwd.path().join("nope.toml");
        assert!(resolve_config_in(Some(&missing), cwd.path(), None).is_err());
    }

    #[test]
    fn parses_inverse_pairs() {
        let cfg: PathgraphConfig = toml::from_str(
            r#"
[graph]
exclude = ["hidden"]

[inverses]
pairs = [["ex:hasChild", "ex:childOf"], ["ex:owns", "ex:ownedBy"]]
"#,
        )
        .expect("parse");
        assert_eq!(cfg.graph.exclude, ["hidden"]);
        let map = cfg.inverse_map();
        assert_eq!(map.len(), 2);
        assert!(map.check("ex:childOf").is_some_and(|c| c.is_inverted));
    }

    #[test]
    fn rejects_unknown_mode() {
        let parsed = toml::from_str::<PathgraphConfig>("[graph]\ndeduplication = \"most\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn include_predicate_honours_exclude_and_enabled() {
        let mut disabled = PathRecord::field("off", &["ex:A"], "");
        disabled.enabled = false;
        let tree = PathTree::from_paths([
            PathRecord::field("on", &["ex:A"], ""),
            PathRecord::field("hidden", &["ex:A"], ""),
            disabled,
        ])
        .expect("tree");

        let mut cfg = PathgraphConfig::default();
        cfg.graph.exclude.push("hidden".into());
        let options = cfg.dedup_options();
        let included: Vec<&str> = tree
            .walk()
            .filter(|node| options.includes(node))
            .map(|node| node.id())
            .collect();
        assert_eq!(included, ["on"]);

        cfg.graph.skip_disabled = false;
        let options = cfg.dedup_options();
        assert!(options.includes(tree.find("off").expect("off")));
    }
}
