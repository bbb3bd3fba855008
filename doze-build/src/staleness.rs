//! Change detection: decides which units must rebuild and why.
//!
//! Dirtiness flows along the actual dependency edges of each unit, never
//! along id adjacency. Evaluation is a depth-first walk memoized per graph
//! generation, so a diamond reachable through several paths is probed once
//! per pass and the whole walk stays linear in units plus edges.

use crate::error::BuildResult;
use crate::probe;
use doze_graph::{BuildGraph, Unit, UnitId};
use std::time::SystemTime;
use tracing::debug;

/// How file changes are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalenessStrategy {
    /// Compare content digests against the ones recorded last pass.
    /// Precise: rewriting a file with identical bytes does not rebuild.
    #[default]
    ContentHash,
    /// Compare file mtimes against the target's last link time. Cheaper
    /// (no file reads), but a plain `touch` triggers a rebuild.
    Timestamp,
}

/// Evaluates dirtiness over a graph, one pass at a time.
///
/// Create a fresh engine per pass; the changed-file counter covers one
/// evaluation run.
#[derive(Debug)]
pub struct StalenessEngine {
    strategy: StalenessStrategy,
    changed_files: usize,
}

impl StalenessEngine {
    /// Create an engine for one pass.
    #[must_use]
    pub fn new(strategy: StalenessStrategy) -> Self {
        Self {
            strategy,
            changed_files: 0,
        }
    }

    /// The strategy this engine applies.
    #[must_use]
    pub fn strategy(&self) -> StalenessStrategy {
        self.strategy
    }

    /// Files whose own content was detected as changed so far this pass.
    ///
    /// Files in units that rebuild because a dependency is dirty are
    /// refreshed but not counted; they recompile via propagation, not
    /// because they changed.
    #[must_use]
    pub fn changed_files(&self) -> usize {
        self.changed_files
    }

    /// Evaluate `unit`, recursing into its dependencies first.
    ///
    /// A unit is dirty when any of its own files changed or any of its
    /// dependencies is dirty. Results are cached on the unit for the
    /// current graph generation, so revisiting a unit within the same
    /// pass returns the cached answer instead of probing again.
    ///
    /// # Errors
    ///
    /// Returns a wrapped `GraphError::UnknownUnit` for an id the graph
    /// never issued.
    pub fn evaluate(&mut self, graph: &mut BuildGraph, unit: UnitId) -> BuildResult<bool> {
        let generation = graph.generation();
        if let Some(dirty) = graph.unit(unit)?.evaluated_in(generation) {
            return Ok(dirty);
        }

        let deps = graph.unit(unit)?.depends_on().to_vec();
        let mut dep_dirty = false;
        for dep in deps {
            if self.evaluate(graph, dep)? {
                dep_dirty = true;
            }
        }

        let last_linked = graph.target().and_then(|target| target.last_linked());

        let dirty = if dep_dirty {
            // Rebuilding regardless; refresh the records so the next pass
            // compares against current contents, without touching the
            // changed counter.
            self.refresh_records(graph.unit_mut(unit)?);
            true
        } else {
            let changed = self.count_changes(graph.unit_mut(unit)?, last_linked);
            self.changed_files += changed;
            changed > 0
        };

        graph.unit_mut(unit)?.mark_evaluated(generation, dirty);
        if dirty {
            debug!(
                "{unit} is dirty ({})",
                if dep_dirty { "dependency" } else { "own files" }
            );
        }
        Ok(dirty)
    }

    /// Probe a unit's own files, updating records and counting changes.
    /// Files that cannot be observed any more are skipped silently.
    fn count_changes(&self, unit: &mut Unit, last_linked: Option<SystemTime>) -> usize {
        let mut changed = 0;
        for record in unit.files_mut() {
            match self.strategy {
                StalenessStrategy::ContentHash => {
                    let Some(digest) = probe::digest(&record.path) else {
                        debug!("skipping unreadable {}", record.path.display());
                        continue;
                    };
                    record.last_modified = probe::last_modified(&record.path);
                    // No recorded digest counts as changed.
                    let differs = record.digest != Some(digest);
                    record.digest = Some(digest);
                    if differs {
                        changed += 1;
                    }
                }
                StalenessStrategy::Timestamp => {
                    let Some(mtime) = probe::last_modified(&record.path) else {
                        debug!("skipping unobservable {}", record.path.display());
                        continue;
                    };
                    record.last_modified = Some(mtime);
                    // A target that never linked makes everything newer.
                    let newer = last_linked.is_none_or(|linked| mtime > linked);
                    if newer {
                        changed += 1;
                    }
                }
            }
        }
        changed
    }

    /// Re-observe a unit's files without counting anything.
    fn refresh_records(&self, unit: &mut Unit) {
        for record in unit.files_mut() {
            if let Some(mtime) = probe::last_modified(&record.path) {
                record.last_modified = Some(mtime);
            }
            if self.strategy == StalenessStrategy::ContentHash {
                if let Some(digest) = probe::digest(&record.path) {
                    record.digest = Some(digest);
                }
            }
        }
    }
}
