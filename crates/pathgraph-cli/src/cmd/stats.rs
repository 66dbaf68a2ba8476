//! `pathgraph stats`: node and edge counts.

use std::io::{self, Write};
use std::path::Path;

use clap::Args;
use pathgraph_core::model::ModelGraphStats;
use serde::Serialize;

use super::{GraphArgs, build_graph};
use crate::output::{OutputMode, kv, render};

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub graph: GraphArgs,
}

/// Report payload for `pathgraph stats`.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub strategy: &'static str,
    pub paths: usize,
    pub nodes: usize,
    pub edges: usize,
    #[serde(flatten)]
    pub counts: ModelGraphStats,
    pub content_hash: String,
}

/// Execute `pathgraph stats`.
pub fn run_stats(
    args: &StatsArgs,
    config: Option<&Path>,
    cwd: &Path,
    output: OutputMode,
) -> anyhow::Result<()> {
    let built = build_graph(&args.graph, config, cwd)?;
    let report = StatsReport {
        strategy: built.mode.as_str(),
        paths: built.paths,
        nodes: built.graph.node_count(),
        edges: built.graph.edge_count(),
        counts: ModelGraphStats::of(&built.graph),
        content_hash: built.graph.content_hash()?,
    };
    render(output, &report, render_stats_human)
}

fn render_stats_human(report: &StatsReport, w: &mut dyn Write) -> io::Result<()> {
    kv(w, "strategy", report.strategy)?;
    kv(w, "paths", report.paths.to_string())?;
    kv(w, "concept nodes", report.counts.concept_nodes.to_string())?;
    kv(w, "literal nodes", report.counts.literal_nodes.to_string())?;
    kv(w, "property edges", report.counts.property_edges.to_string())?;
    kv(w, "data edges", report.counts.data_edges.to_string())?;
    kv(
        w,
        "acyclic",
        if report.counts.definitely_acyclic {
            "guaranteed"
        } else {
            "not guaranteed"
        },
    )?;
    kv(w, "hash", &report.content_hash)
}
