//! doze command-line interface
//!
//! Subcommands:
//! - `build`: run one incremental build pass
//! - `graph`: print the assembled graph and its resolution order
//! - `clean`: remove derived objects, the target and the state file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod build;
pub mod clean;
pub mod graph;

/// doze - minimal incremental build tool for C projects
#[derive(Parser)]
#[command(name = "doze")]
#[command(about = "Minimal incremental build tool for C projects")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the target, compiling only what changed
    Build {
        /// Path to the build manifest
        #[arg(short = 'f', long, default_value = "doze.yml")]
        file: PathBuf,

        /// Compiler executable, overriding the manifest
        #[arg(short = 'C', long)]
        compiler: Option<String>,

        /// Directory unit files are resolved under
        #[arg(short = 'S', long)]
        source_root: Option<PathBuf>,

        /// Directory objects and the target land in
        #[arg(short = 'B', long)]
        output_root: Option<PathBuf>,

        /// Additional include directory (repeatable)
        #[arg(short = 'I', long = "include")]
        include: Vec<PathBuf>,

        /// Additional library search path (repeatable)
        #[arg(short = 'L', long = "lib-path")]
        lib_path: Vec<PathBuf>,

        /// Additional library to link against (repeatable)
        #[arg(short = 'l', long = "lib")]
        lib: Vec<String>,

        /// Compare mtimes against the last link instead of content digests
        #[arg(long)]
        timestamps: bool,

        /// Maximum concurrent compile processes (default: CPU count)
        #[arg(short = 'j', long)]
        jobs: Option<usize>,

        /// Print the build report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the assembled graph without building
    Graph {
        /// Path to the build manifest
        #[arg(short = 'f', long, default_value = "doze.yml")]
        file: PathBuf,

        /// Print the graph as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove derived objects, the target and the state file
    Clean {
        /// Path to the build manifest
        #[arg(short = 'f', long, default_value = "doze.yml")]
        file: PathBuf,
    },
}
