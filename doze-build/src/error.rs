//! Error types of the build engine.

use doze_graph::GraphError;
use std::path::PathBuf;

/// Errors surfaced by the build engine.
///
/// Configuration problems (`CompilerNotSet`, `NoTarget` and the graph
/// construction errors wrapped in `Graph`) fail fast before any process is
/// spawned. `CompileFailed` and `LinkFailed` are fatal: the pass stops at
/// the first nonzero exit and objects already produced stay on disk.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Graph construction or resolution failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Command synthesis needs a compiler and none was configured.
    #[error("no compiler configured")]
    CompilerNotSet,

    /// A build was requested on a graph without a link target.
    #[error("build graph has no link target")]
    NoTarget,

    /// A compiler invocation exited nonzero.
    #[error("compiling {} failed with status {status}", .file.display())]
    CompileFailed {
        /// The source file being compiled.
        file: PathBuf,
        /// Exit status, -1 when the process was killed by a signal.
        status: i32,
    },

    /// The link invocation exited nonzero.
    #[error("linking failed with status {status}")]
    LinkFailed {
        /// Exit status, -1 when the process was killed by a signal.
        status: i32,
    },

    /// Spawning a process or touching the file system failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted state file is malformed or from a different schema.
    #[error("invalid state file: {0}")]
    State(String),
}

/// Result type for engine operations.
pub type BuildResult<T> = Result<T, BuildError>;
