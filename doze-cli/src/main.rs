//! doze - minimal incremental build tool for C projects
//!
//! Reads a `doze.yml` manifest describing compilation units and a link
//! target, decides what changed since the last pass, recompiles only
//! that, and relinks. The heavy lifting lives in `doze-build` and
//! `doze-graph`; this binary is parsing, dispatch and presentation.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod manifest;

use commands::{Cli, Commands};
use manifest::Overrides;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doze_cli=info,doze_build=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Build {
            file,
            compiler,
            source_root,
            output_root,
            include,
            lib_path,
            lib,
            timestamps,
            jobs,
            json,
        } => {
            let overrides = Overrides {
                compiler,
                source_root,
                output_root,
                includes: include,
                lib_paths: lib_path,
                libs: lib,
            };
            commands::build::execute(&file, overrides, timestamps, jobs, json).await
        }
        Commands::Graph { file, json } => commands::graph::execute(&file, json).await,
        Commands::Clean { file } => commands::clean::execute(&file).await,
    }
}
