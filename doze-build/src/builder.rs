//! The build pass: resolve, evaluate staleness, compile, link.

use crate::command;
use crate::error::{BuildError, BuildResult};
use crate::options::BuildOptions;
use crate::runner::CommandRunner;
use crate::staleness::{StalenessEngine, StalenessStrategy};
use doze_graph::{BuildGraph, UnitId};
use futures::future::join_all;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

/// Outcome of one build pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Files handed to the compiler.
    pub compiled: usize,
    /// Files whose own content was detected as changed.
    pub changed: usize,
    /// Whether the target was linked.
    pub linked: bool,
}

impl BuildReport {
    /// Print the one-line summary.
    pub fn display(&self) {
        if self.linked {
            println!("doze: compiled {} file(s)", self.compiled);
        } else {
            println!("doze: nothing to do");
        }
    }
}

/// Drives complete build passes over a graph.
///
/// One builder serves many passes; per-pass state (resolution order,
/// dirty flags, counters) lives on the graph and in a fresh staleness
/// engine each time.
pub struct Builder {
    options: BuildOptions,
    strategy: StalenessStrategy,
    runner: Arc<dyn CommandRunner>,
    max_parallel: usize,
}

impl Builder {
    /// Create a builder with the default strategy (content hashing) and
    /// one compile slot per CPU.
    pub fn new(options: BuildOptions, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            options,
            strategy: StalenessStrategy::default(),
            runner,
            max_parallel: num_cpus::get(),
        }
    }

    /// Select the staleness strategy for subsequent passes.
    #[must_use]
    pub fn with_strategy(mut self, strategy: StalenessStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Bound the number of concurrent compile processes. Clamped to at
    /// least one.
    #[must_use]
    pub fn with_parallelism(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// The options commands are synthesized from.
    #[must_use]
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Run one build pass.
    ///
    /// Resolves every root of the target (skipping roots an earlier root
    /// already covered), evaluates staleness over the resulting order,
    /// compiles the sources of dirty units, and links when anything was
    /// dirty. Clean passes stop before linking and report nothing to do.
    ///
    /// # Errors
    ///
    /// - `BuildError::NoTarget` when the graph has no link target
    /// - wrapped `GraphError::CircularDependency` when resolution finds a
    ///   cycle
    /// - `BuildError::CompileFailed` / `BuildError::LinkFailed` on the
    ///   first nonzero exit; objects already produced stay on disk
    pub async fn build(&self, graph: &mut BuildGraph) -> BuildResult<BuildReport> {
        let roots: Vec<UnitId> = graph
            .target()
            .ok_or(BuildError::NoTarget)?
            .depends_on()
            .to_vec();

        graph.begin_pass();
        for root in roots {
            if graph.resolution().is_resolved(root) {
                continue;
            }
            graph.resolve(root)?;
        }
        let order = graph.resolution().order().to_vec();
        debug!("resolved {} unit(s)", order.len());

        let mut engine = StalenessEngine::new(self.strategy);
        for &unit in &order {
            let _ = engine.evaluate(graph, unit)?;
        }
        let changed = engine.changed_files();

        let mut objects: Vec<PathBuf> = Vec::new();
        let mut compiled = 0usize;
        let mut dirty_units = 0usize;

        for &id in &order {
            let unit = graph.unit(id)?;
            let sources: Vec<PathBuf> = unit
                .files()
                .iter()
                .filter(|file| !file.is_header())
                .map(|file| file.path.clone())
                .collect();
            let unit_objects: Vec<PathBuf> = sources
                .iter()
                .map(|source| command::object_path(&self.options, source))
                .collect();

            if unit.is_dirty() {
                dirty_units += 1;
                if !sources.is_empty() {
                    compiled += self.compile_unit(&sources, &unit_objects).await?;
                }
            }
            // Clean units contribute their objects too; a link consumes
            // the full list.
            objects.extend(unit_objects);
        }

        if dirty_units == 0 {
            info!("all {} unit(s) clean, nothing to do", order.len());
            return Ok(BuildReport {
                compiled: 0,
                changed,
                linked: false,
            });
        }

        let target = graph.target().ok_or(BuildError::NoTarget)?;
        info!(
            "linking {} from {} object(s)",
            target.path().display(),
            objects.len()
        );
        let argv = command::link_command(&self.options, target, &objects)?;
        let status = self.run_detached(argv).await?;
        if status != 0 {
            return Err(BuildError::LinkFailed { status });
        }

        if let Some(target) = graph.target_mut() {
            target.set_last_linked(SystemTime::now());
        }

        Ok(BuildReport {
            compiled,
            changed,
            linked: true,
        })
    }

    /// Compile one unit's sources in waves of at most `max_parallel`
    /// concurrent processes. Every wave completes before the next starts,
    /// and the unit's objects only count as ready once all waves did.
    async fn compile_unit(&self, sources: &[PathBuf], objects: &[PathBuf]) -> BuildResult<usize> {
        let mut compiled = 0;
        let pairs: Vec<(&PathBuf, &PathBuf)> = sources.iter().zip(objects.iter()).collect();

        for wave in pairs.chunks(self.max_parallel) {
            let mut futures = Vec::with_capacity(wave.len());
            for &(source, object) in wave {
                let argv = command::compile_command(&self.options, source, object)?;
                let runner = Arc::clone(&self.runner);
                let source = source.clone();
                debug!("compiling {}", source.display());
                futures.push(tokio::task::spawn_blocking(move || {
                    let status = runner.run(&argv);
                    (source, status)
                }));
            }

            for joined in join_all(futures).await {
                let (source, status) =
                    joined.map_err(|err| BuildError::Io(std::io::Error::other(err)))?;
                let status = status?;
                if status != 0 {
                    return Err(BuildError::CompileFailed {
                        file: source,
                        status,
                    });
                }
                compiled += 1;
            }
        }
        Ok(compiled)
    }

    async fn run_detached(&self, argv: Vec<String>) -> BuildResult<i32> {
        let runner = Arc::clone(&self.runner);
        tokio::task::spawn_blocking(move || runner.run(&argv))
            .await
            .map_err(|err| BuildError::Io(std::io::Error::other(err)))?
    }
}
