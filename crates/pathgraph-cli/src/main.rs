#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "pathgraph: model graphs from pathbuilder definitions",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Config file to use instead of .pathgraph.toml / the user config.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Build the model graph",
        long_about = "Build the deduplicated model graph for a pathbuilder and print it.",
        after_help = "EXAMPLES:\n    # Build with the configured strategy\n    pathgraph build paths.json\n\n    # Share every class globally and emit the graph as JSON\n    pathgraph build paths.json --dedup full --json\n\n    # Read from stdin, register an inverse pair\n    cat paths.json | pathgraph build - --inverse ex:parentOf=ex:childOf"
    )]
    Build(cmd::build::BuildArgs),

    #[command(
        about = "Print model graph statistics",
        long_about = "Build the model graph and print node and edge counts only.",
        after_help = "EXAMPLES:\n    # Compare strategies\n    pathgraph stats paths.json --dedup none\n    pathgraph stats paths.json --dedup parents\n\n    # Emit machine-readable output\n    pathgraph stats paths.json --json"
    )]
    Stats(cmd::stats::StatsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PATHGRAPH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "pathgraph=debug,info"
        } else {
            "pathgraph=info,warn"
        })
    });

    let format = env::var("PATHGRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays parseable.
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let output = cli.output_mode();
    let cwd = env::current_dir()?;
    let config = cli.config.as_deref();

    let command_result = match &cli.command {
        Commands::Build(args) => cmd::build::run_build(args, config, &cwd, output),
        Commands::Stats(args) => cmd::stats::run_stats(args, config, &cwd, output),
    };

    if let Err(err) = command_result {
        tracing::debug!(error = ?err, "command failed");
        output::render_error(output, &CliError::from_anyhow(&err))?;
        std::process::exit(1);
    }
    Ok(())
}
