//! doze-build - incremental build passes over compilation unit graphs
//!
//! This crate turns a [`doze_graph::BuildGraph`] into compiled objects and a
//! linked target:
//!
//! - **project**: assemble a graph from configured units ([`GraphBuilder`])
//! - **staleness**: decide what rebuilds, by content digest or mtime
//!   ([`StalenessEngine`])
//! - **command**: synthesize compile and link argv vectors, pure
//! - **runner**: execute commands ([`SystemRunner`]), swappable in tests
//! - **builder**: drive a full pass with bounded parallel compiles
//!   ([`Builder`])
//! - **state**: persist digests between runs ([`StateFile`])
//!
//! ## Usage
//!
//! ```no_run
//! use doze_build::{BuildOptions, Builder, GraphBuilder, SystemRunner};
//! use std::sync::Arc;
//! # async fn example() -> Result<(), doze_build::BuildError> {
//! let options = BuildOptions {
//!     compiler: Some("cc".to_string()),
//!     ..BuildOptions::default()
//! };
//!
//! let mut project = GraphBuilder::new(options.clone());
//! let main = project.create_unit(&["main.c".into()])?;
//! project.create_target("app", vec![main])?;
//! let (mut graph, options) = project.finish();
//!
//! let builder = Builder::new(options, Arc::new(SystemRunner));
//! let report = builder.build(&mut graph).await?;
//! report.display();
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod command;
pub mod error;
pub mod options;
pub mod probe;
pub mod project;
pub mod runner;
pub mod staleness;
pub mod state;

pub use builder::{BuildReport, Builder};
pub use error::{BuildError, BuildResult};
pub use options::BuildOptions;
pub use project::GraphBuilder;
pub use runner::{CommandRunner, SystemRunner};
pub use staleness::{StalenessEngine, StalenessStrategy};
pub use state::{StateFile, STATE_FILE_NAME};

// Re-export the graph types callers assemble and inspect.
pub use doze_graph::{
    BuildGraph, ContentDigest, FileRole, GraphError, LinkTarget, NodeRef, SourceFile, Unit, UnitId,
};
