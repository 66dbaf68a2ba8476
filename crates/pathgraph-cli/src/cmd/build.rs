//! `pathgraph build`: print the model graph.

use std::io::{self, Write};
use std::path::Path;

use clap::Args;
use pathgraph_core::model::{ModelEdge, ModelGraph, ModelGraphStats, ModelNode};

use super::{GraphArgs, build_graph};
use crate::output::{OutputMode, kv, render};

#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub graph: GraphArgs,
}

/// Execute `pathgraph build`.
///
/// JSON output is the graph's structural form
/// (`{"nodes": [[id, label]], "edges": [[id, from, to, label]]}`).
pub fn run_build(
    args: &BuildArgs,
    config: Option<&Path>,
    cwd: &Path,
    output: OutputMode,
) -> anyhow::Result<()> {
    let built = build_graph(&args.graph, config, cwd)?;
    let json = built.graph.to_json()?;
    render(output, &json, |_, w| render_build_human(&built.graph, built.mode.as_str(), w))
}

fn render_build_human(graph: &ModelGraph, strategy: &str, w: &mut dyn Write) -> io::Result<()> {
    let stats = ModelGraphStats::of(graph);
    kv(w, "strategy", strategy)?;
    kv(
        w,
        "nodes",
        format!(
            "{} ({} concept, {} literal)",
            graph.node_count(),
            stats.concept_nodes,
            stats.literal_nodes
        ),
    )?;
    kv(w, "edges", graph.edge_count().to_string())?;
    writeln!(w)?;

    for (id, node) in graph.nodes() {
        match node {
            ModelNode::Concept(concept) => {
                write!(w, "#{id} {}", concept.clz)?;
                if !concept.bundles.is_empty() {
                    write!(w, "  bundles: {}", join(&concept.bundles))?;
                }
                if !concept.fields.is_empty() {
                    write!(w, "  fields: {}", join(&concept.fields))?;
                }
                writeln!(w)?;
            }
            ModelNode::Literal(literal) => {
                writeln!(w, "#{id} literal  fields: {}", join(&literal.fields))?;
            }
        }
    }
    if graph.edge_count() > 0 {
        writeln!(w)?;
    }
    for edge in graph.edges() {
        let arrow = match edge.label {
            ModelEdge::Property(_) => "->",
            ModelEdge::Data(_) => "=>",
        };
        write!(w, "#{} -{}{arrow} #{}", edge.from, edge.label.property(), edge.to)?;
        if let Some(inverse) = edge.label.inverse_property() {
            write!(w, "  (inverse {inverse})")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
