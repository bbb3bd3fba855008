//! Graph assembly: applies configuration while units and the target are
//! created.
//!
//! This is where paths meet the file system. Candidate files are resolved
//! under the source root, probed and classified; anything unusable is
//! dropped silently. The storage layer underneath never touches the disk.

use crate::error::BuildResult;
use crate::options::BuildOptions;
use crate::probe;
use crate::state::StateFile;
use doze_graph::{BuildGraph, GraphLimits, LinkTarget, SourceFile, UnitId};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Assembles a [`BuildGraph`] from configuration.
pub struct GraphBuilder {
    options: BuildOptions,
    graph: BuildGraph,
    seed: Option<StateFile>,
}

impl GraphBuilder {
    /// Start assembling with default graph limits.
    #[must_use]
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            graph: BuildGraph::new(),
            seed: None,
        }
    }

    /// Start assembling with explicit graph limits.
    #[must_use]
    pub fn with_limits(options: BuildOptions, limits: GraphLimits) -> Self {
        Self {
            options,
            graph: BuildGraph::with_limits(limits),
            seed: None,
        }
    }

    /// Seed file records with digests persisted by a previous run, so the
    /// content-hash strategy stays incremental across process restarts.
    #[must_use]
    pub fn with_state(mut self, state: StateFile) -> Self {
        self.seed = Some(state);
        self
    }

    /// The options this builder resolves paths against.
    #[must_use]
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Create a unit from candidate paths.
    ///
    /// Each path is resolved under the source root, then probed: files
    /// with unrecognised extensions or that are not readable regular
    /// files are dropped silently.
    ///
    /// # Errors
    ///
    /// Returns the wrapped `GraphError::EmptyUnit` when no candidate
    /// survives probing; a unit with nothing usable in it is a
    /// configuration mistake worth failing fast on.
    pub fn create_unit(&mut self, paths: &[PathBuf]) -> BuildResult<UnitId> {
        let mut files = Vec::new();
        for path in paths {
            let resolved = self.options.source_path(path);
            let Some(role) = probe::classify(&resolved) else {
                debug!("ignoring {} (unrecognised extension)", resolved.display());
                continue;
            };
            if !probe::is_usable(&resolved) {
                debug!("ignoring {} (not a readable file)", resolved.display());
                continue;
            }

            let mut record = SourceFile::new(resolved, role);
            if let Some(state) = &self.seed {
                record.digest = state.digest_for(&record.path);
            }
            files.push(record);
        }

        let id = self.graph.insert_unit(files)?;
        debug!("created {id} with {} file(s)", self.graph.unit(id)?.files().len());
        Ok(id)
    }

    /// Record that `from` depends on `to`.
    ///
    /// # Errors
    ///
    /// Returns the wrapped `GraphError::UnknownUnit` for ids this graph
    /// never issued.
    pub fn add_dependency(&mut self, from: UnitId, to: UnitId) -> BuildResult<()> {
        self.graph.add_dependency(from, to)?;
        Ok(())
    }

    /// Create the link target from a name resolved under the output root.
    ///
    /// When the output file already exists its mtime becomes the initial
    /// link stamp, which keeps the timestamp strategy meaningful on the
    /// first pass of a new process.
    ///
    /// # Errors
    ///
    /// Returns the wrapped graph error when a target is already set or a
    /// root id is unknown.
    pub fn create_target(&mut self, name: &str, roots: Vec<UnitId>) -> BuildResult<()> {
        let path = self.options.output_path(Path::new(name));
        let last_linked = probe::last_modified(&path);
        if last_linked.is_some() {
            debug!("target {} exists, keeping its mtime", path.display());
        }
        self.graph.set_target(LinkTarget::new(path, last_linked, roots))?;
        Ok(())
    }

    /// Finish assembly, handing the graph and options to the build.
    #[must_use]
    pub fn finish(self) -> (BuildGraph, BuildOptions) {
        (self.graph, self.options)
    }
}
