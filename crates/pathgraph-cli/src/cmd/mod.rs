//! Subcommand implementations.
//!
//! `build` and `stats` share [`GraphArgs`] and the load-and-build pipeline
//! in [`build_graph`].

pub mod build;
pub mod stats;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use pathgraph_core::config::{PathgraphConfig, resolve_config};
use pathgraph_core::model::{Deduplication, ModelGraph, ModelGraphBuilder};
use pathgraph_core::pathbuilder::{PathRecord, PathTree};
use tracing::info;

/// Input and deduplication flags common to graph-producing commands.
#[derive(Args, Debug, Default)]
pub struct GraphArgs {
    /// JSON file holding an array of path records (`-` for stdin).
    #[arg(value_name = "PATHS")]
    pub input: PathBuf,

    /// Deduplication strategy: none, bundle, parents or full.
    #[arg(long, value_name = "MODE")]
    pub dedup: Option<Deduplication>,

    /// Register an inverse property pair (repeatable).
    #[arg(long = "inverse", value_name = "CANONICAL=INVERSE", value_parser = parse_inverse)]
    pub inverses: Vec<(String, String)>,

    /// Leave a path out of the graph (repeatable).
    #[arg(long = "exclude", value_name = "PATH_ID")]
    pub exclude: Vec<String>,
}

fn parse_inverse(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((canonical, inverse)) if !canonical.is_empty() && !inverse.is_empty() => {
            Ok((canonical.to_string(), inverse.to_string()))
        }
        _ => Err(format!("expected CANONICAL=INVERSE, got {raw:?}")),
    }
}

impl GraphArgs {
    /// Layer the command-line flags over the file configuration.
    fn apply(&self, config: &mut PathgraphConfig) {
        if let Some(mode) = self.dedup {
            config.graph.deduplication = mode;
        }
        config.inverses.pairs.extend(self.inverses.iter().cloned());
        config.graph.exclude.extend(self.exclude.iter().cloned());
    }
}

/// A built graph plus what produced it.
pub struct Built {
    pub mode: Deduplication,
    pub paths: usize,
    pub graph: ModelGraph,
}

fn read_paths(input: &Path) -> Result<Vec<PathRecord>> {
    let content = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read paths from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?
    };
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse path records from {}", input.display()))
}

/// Resolve configuration, load the paths and build the graph.
pub fn build_graph(args: &GraphArgs, config_path: Option<&Path>, cwd: &Path) -> Result<Built> {
    let mut config = resolve_config(config_path, cwd)?;
    args.apply(&mut config);

    let records = read_paths(&args.input)?;
    let paths = records.len();
    let tree = PathTree::from_paths(records)
        .with_context(|| format!("Invalid pathbuilder in {}", args.input.display()))?;

    let mode = config.graph.deduplication;
    let graph = ModelGraphBuilder::new(&tree, config.dedup_options(), mode).into_graph()?;
    info!(
        strategy = %mode,
        paths,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "model graph ready"
    );
    Ok(Built { mode, paths, graph })
}
