//! Compilation-unit dependency graph for the doze build engine.
//!
//! This crate provides the data model the engine operates on:
//! - Compilation units (batches of source and header files) with dense ids
//! - A single link target with an ordered root list
//! - Append-only dependency edges between units
//! - Depth-first resolution into a dependency-ordered schedule
//! - Cycle detection reporting both endpoints of the offending edge
//! - Content digests for change detection
//!
//! # Example
//!
//! ```
//! use doze_graph::{BuildGraph, FileRole, LinkTarget, SourceFile};
//!
//! let mut graph = BuildGraph::new();
//! let util = graph
//!     .insert_unit(vec![SourceFile::new("util.h", FileRole::Header)])
//!     .unwrap();
//! let main = graph
//!     .insert_unit(vec![SourceFile::new("main.c", FileRole::Source)])
//!     .unwrap();
//! graph.add_dependency(main, util).unwrap();
//! graph
//!     .set_target(LinkTarget::new("app", None, vec![main]))
//!     .unwrap();
//!
//! graph.begin_pass();
//! graph.resolve(main).unwrap();
//! // Dependencies come before dependents.
//! assert_eq!(graph.resolution().order(), &[util, main]);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(unused_results)]

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a compilation unit.
///
/// Ids are dense and sequential: the first unit inserted into a graph gets
/// id 0, the next id 1, and so on. Ids are only meaningful for the graph
/// that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnitId(u32);

impl UnitId {
    /// Create an id from a raw index.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The id as a vector index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit {}", self.0)
    }
}

/// Error types for graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Two units depend on each other, directly or through intermediates.
    /// `from` is the unit whose dependency edge closed the cycle, `to` the
    /// unit it reached back to.
    #[error("circular dependency detected: {from} <-> {to}")]
    CircularDependency {
        /// Unit whose edge closed the cycle.
        from: UnitId,
        /// Unit reached back while still being resolved.
        to: UnitId,
    },

    /// An id that was never issued by this graph.
    #[error("{0} not found in graph")]
    UnknownUnit(UnitId),

    /// The graph already carries a link target.
    #[error("link target is already set")]
    TargetAlreadySet,

    /// A unit must contain at least one usable file.
    #[error("unit has no usable files")]
    EmptyUnit,

    /// A configured capacity limit was exceeded.
    #[error("{what} limit exceeded (max {limit})")]
    LimitExceeded {
        /// Which limit was hit.
        what: &'static str,
        /// The configured maximum.
        limit: usize,
    },
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Sha256 digest of a file's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Digest a byte slice.
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hasher.finalize().into())
    }

    /// Full lowercase hex rendering, suitable for persistence.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a digest back from its full hex rendering.
    #[must_use]
    pub fn from_hex(text: &str) -> Option<Self> {
        let bytes = hex::decode(text).ok()?;
        let raw: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(raw))
    }
}

impl fmt::Display for ContentDigest {
    /// Short form for logs: first 8 hex chars.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..8])
    }
}

/// How a file participates in a compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FileRole {
    /// Included, never compiled on its own. Changes dirty the unit.
    Header,
    /// Compiled into an object file.
    Source,
}

/// One file of a compilation unit.
///
/// Identity (`path`, `role`) is fixed when the unit is created. The
/// observations (`last_modified`, `digest`) are refreshed by staleness
/// checks; `digest` stays `None` until a content-based check first runs.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Location on disk, as probed.
    pub path: PathBuf,
    /// Header or source.
    pub role: FileRole,
    /// Modification time recorded at the last staleness check.
    pub last_modified: Option<SystemTime>,
    /// Content digest recorded at the last content-based check.
    pub digest: Option<ContentDigest>,
}

impl SourceFile {
    /// Create a record with no observations yet.
    pub fn new(path: impl Into<PathBuf>, role: FileRole) -> Self {
        Self {
            path: path.into(),
            role,
            last_modified: None,
            digest: None,
        }
    }

    /// Whether this file is a header.
    #[must_use]
    pub fn is_header(&self) -> bool {
        self.role == FileRole::Header
    }
}

/// A compilation unit: a batch of files compiled and considered together.
///
/// The file list is fixed at creation. Dependency edges are append-only.
/// The dirty flag and evaluation generation are transient and recomputed
/// on every build pass.
#[derive(Debug, Clone)]
pub struct Unit {
    id: UnitId,
    files: Vec<SourceFile>,
    depends_on: Vec<UnitId>,
    dirty: bool,
    generation: u64,
}

impl Unit {
    /// This unit's id.
    #[must_use]
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// The unit's files. The list never grows or shrinks after creation.
    #[must_use]
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Mutable access to the file records, for refreshing observations.
    pub fn files_mut(&mut self) -> &mut [SourceFile] {
        &mut self.files
    }

    /// Units this unit depends on, in insertion order, duplicate-free.
    #[must_use]
    pub fn depends_on(&self) -> &[UnitId] {
        &self.depends_on
    }

    /// Dirty flag from the most recent evaluation.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The cached dirty result if this unit was already evaluated in
    /// `generation`, `None` otherwise.
    #[must_use]
    pub fn evaluated_in(&self, generation: u64) -> Option<bool> {
        if self.generation == generation {
            Some(self.dirty)
        } else {
            None
        }
    }

    /// Record the outcome of a staleness evaluation for `generation`.
    pub fn mark_evaluated(&mut self, generation: u64, dirty: bool) {
        self.generation = generation;
        self.dirty = dirty;
    }
}

/// The executable (or other artifact) the build links.
#[derive(Debug, Clone)]
pub struct LinkTarget {
    path: PathBuf,
    last_linked: Option<SystemTime>,
    depends_on: Vec<UnitId>,
}

impl LinkTarget {
    /// Create a target.
    ///
    /// `last_linked` carries the existing output's mtime when the caller
    /// probed one, which keeps timestamp-based staleness meaningful across
    /// process restarts. `depends_on` lists the root units in the order
    /// they should be resolved.
    pub fn new(
        path: impl Into<PathBuf>,
        last_linked: Option<SystemTime>,
        depends_on: Vec<UnitId>,
    ) -> Self {
        Self {
            path: path.into(),
            last_linked,
            depends_on,
        }
    }

    /// Output location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the target was last linked, if ever.
    #[must_use]
    pub fn last_linked(&self) -> Option<SystemTime> {
        self.last_linked
    }

    /// Root units, in resolution order.
    #[must_use]
    pub fn depends_on(&self) -> &[UnitId] {
        &self.depends_on
    }

    /// Stamp the target as linked at `at`.
    pub fn set_last_linked(&mut self, at: SystemTime) {
        self.last_linked = Some(at);
    }
}

/// View of one graph node, dispatched by `match`.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    /// A compilation unit.
    Unit(&'a Unit),
    /// The link target.
    Target(&'a LinkTarget),
}

/// Soft capacity limits for a graph.
///
/// These are configuration, not architecture: storage is dynamic and the
/// limits only bound runaway configurations.
#[derive(Debug, Clone, Copy)]
pub struct GraphLimits {
    /// Maximum number of units in one graph.
    pub max_units: usize,
    /// Maximum number of files in one unit.
    pub max_files_per_unit: usize,
}

impl Default for GraphLimits {
    fn default() -> Self {
        Self {
            max_units: 2048,
            max_files_per_unit: 2048,
        }
    }
}

/// Transient state of one resolution pass.
///
/// Owned by the graph and cleared at the start of every pass, so a graph
/// serves exactly one in-flight build at a time.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    on_stack: HashSet<UnitId>,
    resolved: HashSet<UnitId>,
    order: Vec<UnitId>,
}

impl Resolution {
    /// Whether `id` already finished resolving in this pass.
    ///
    /// Callers iterate a target's roots and skip the ones already covered
    /// by an earlier root's traversal.
    #[must_use]
    pub fn is_resolved(&self, id: UnitId) -> bool {
        self.resolved.contains(&id)
    }

    /// The dependency-ordered schedule accumulated so far. Every resolved
    /// unit appears exactly once, after all of its dependencies.
    #[must_use]
    pub fn order(&self) -> &[UnitId] {
        &self.order
    }

    fn clear(&mut self) {
        self.on_stack.clear();
        self.resolved.clear();
        self.order.clear();
    }
}

/// The build graph: all units, at most one link target, and the transient
/// resolution state of the current pass.
#[derive(Debug, Clone, Default)]
pub struct BuildGraph {
    units: Vec<Unit>,
    target: Option<LinkTarget>,
    resolution: Resolution,
    generation: u64,
    limits: GraphLimits,
}

impl BuildGraph {
    /// Create an empty graph with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with explicit limits.
    #[must_use]
    pub fn with_limits(limits: GraphLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Insert a unit and return its id. Ids are issued densely in
    /// insertion order.
    ///
    /// # Errors
    ///
    /// - `GraphError::EmptyUnit` if `files` is empty
    /// - `GraphError::LimitExceeded` if a capacity limit would be crossed
    pub fn insert_unit(&mut self, files: Vec<SourceFile>) -> GraphResult<UnitId> {
        if files.is_empty() {
            return Err(GraphError::EmptyUnit);
        }
        if self.units.len() >= self.limits.max_units {
            return Err(GraphError::LimitExceeded {
                what: "units",
                limit: self.limits.max_units,
            });
        }
        if files.len() > self.limits.max_files_per_unit {
            return Err(GraphError::LimitExceeded {
                what: "files per unit",
                limit: self.limits.max_files_per_unit,
            });
        }

        let id = UnitId(u32::try_from(self.units.len()).map_err(|_| {
            GraphError::LimitExceeded {
                what: "units",
                limit: self.limits.max_units,
            }
        })?);
        self.units.push(Unit {
            id,
            files,
            depends_on: Vec::new(),
            dirty: false,
            generation: 0,
        });
        Ok(id)
    }

    /// Record that `from` depends on `to`. Duplicate edges are ignored.
    ///
    /// A self-edge is accepted here and reported by [`resolve`] as the
    /// degenerate cycle it is; the resolver is the single cycle authority.
    ///
    /// [`resolve`]: BuildGraph::resolve
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownUnit` if either id is out of range.
    pub fn add_dependency(&mut self, from: UnitId, to: UnitId) -> GraphResult<()> {
        self.check_unit(from)?;
        self.check_unit(to)?;
        let unit = &mut self.units[from.index()];
        if !unit.depends_on.contains(&to) {
            unit.depends_on.push(to);
        }
        Ok(())
    }

    /// Install the link target. A graph carries at most one.
    ///
    /// # Errors
    ///
    /// - `GraphError::TargetAlreadySet` on a second call
    /// - `GraphError::UnknownUnit` if a root id is out of range
    pub fn set_target(&mut self, target: LinkTarget) -> GraphResult<()> {
        if self.target.is_some() {
            return Err(GraphError::TargetAlreadySet);
        }
        for &root in &target.depends_on {
            self.check_unit(root)?;
        }
        self.target = Some(target);
        Ok(())
    }

    /// Get a unit by id.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownUnit` if the id is out of range.
    pub fn unit(&self, id: UnitId) -> GraphResult<&Unit> {
        self.units
            .get(id.index())
            .ok_or(GraphError::UnknownUnit(id))
    }

    /// Get a unit by id, mutably.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownUnit` if the id is out of range.
    pub fn unit_mut(&mut self, id: UnitId) -> GraphResult<&mut Unit> {
        self.units
            .get_mut(id.index())
            .ok_or(GraphError::UnknownUnit(id))
    }

    /// All units, in id order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// The link target, if one is set.
    #[must_use]
    pub fn target(&self) -> Option<&LinkTarget> {
        self.target.as_ref()
    }

    /// The link target, mutably.
    pub fn target_mut(&mut self) -> Option<&mut LinkTarget> {
        self.target.as_mut()
    }

    /// Number of units.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Whether the graph has no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterate all nodes: units in id order, then the target.
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.units
            .iter()
            .map(NodeRef::Unit)
            .chain(self.target.iter().map(NodeRef::Target))
    }

    /// The current pass generation. Starts at 0; a unit's cached dirty
    /// result is only valid for the generation it was evaluated in.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new build pass: bump the generation and clear the
    /// resolution state of the previous pass.
    pub fn begin_pass(&mut self) {
        self.generation += 1;
        self.resolution.clear();
    }

    /// The resolution state of the current pass.
    #[must_use]
    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// Resolve the subgraph reachable from `root`, appending units to the
    /// pass order so that every dependency precedes its dependents.
    ///
    /// Units already resolved in this pass are not traversed again, so a
    /// diamond is scheduled once. Callers resolving several roots should
    /// skip roots for which [`Resolution::is_resolved`] already holds.
    ///
    /// # Errors
    ///
    /// - `GraphError::UnknownUnit` if `root` is out of range
    /// - `GraphError::CircularDependency` if the traversal reaches a unit
    ///   that is still on the resolution stack
    pub fn resolve(&mut self, root: UnitId) -> GraphResult<()> {
        self.check_unit(root)?;
        self.resolve_from(root)
    }

    fn resolve_from(&mut self, node: UnitId) -> GraphResult<()> {
        let _ = self.resolution.on_stack.insert(node);

        // Owned copy so the recursion can borrow the graph again.
        let deps = self.units[node.index()].depends_on.clone();
        for dep in deps {
            if self.resolution.resolved.contains(&dep) {
                continue;
            }
            if self.resolution.on_stack.contains(&dep) {
                return Err(GraphError::CircularDependency {
                    from: node,
                    to: dep,
                });
            }
            self.resolve_from(dep)?;
        }

        let _ = self.resolution.on_stack.remove(&node);
        self.resolution.order.push(node);
        let _ = self.resolution.resolved.insert(node);
        Ok(())
    }

    fn check_unit(&self, id: UnitId) -> GraphResult<()> {
        if id.index() < self.units.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownUnit(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str) -> SourceFile {
        SourceFile::new(name, FileRole::Source)
    }

    fn header(name: &str) -> SourceFile {
        SourceFile::new(name, FileRole::Header)
    }

    #[test]
    fn empty_graph() {
        let graph = BuildGraph::new();
        assert_eq!(graph.unit_count(), 0);
        assert!(graph.is_empty());
        assert!(graph.target().is_none());
    }

    #[test]
    fn unit_ids_are_dense() {
        let mut graph = BuildGraph::new();
        let a = graph.insert_unit(vec![source("a.c")]).unwrap();
        let b = graph.insert_unit(vec![source("b.c")]).unwrap();
        let c = graph.insert_unit(vec![source("c.c")]).unwrap();

        assert_eq!(a, UnitId::new(0));
        assert_eq!(b, UnitId::new(1));
        assert_eq!(c, UnitId::new(2));
        assert_eq!(graph.unit_count(), 3);
        assert_eq!(graph.unit(b).unwrap().files()[0].path.to_str(), Some("b.c"));
    }

    #[test]
    fn empty_unit_rejected() {
        let mut graph = BuildGraph::new();
        let result = graph.insert_unit(vec![]);
        assert!(matches!(result, Err(GraphError::EmptyUnit)));
    }

    #[test]
    fn unit_limit_enforced() {
        let mut graph = BuildGraph::with_limits(GraphLimits {
            max_units: 2,
            max_files_per_unit: 16,
        });
        let _ = graph.insert_unit(vec![source("a.c")]).unwrap();
        let _ = graph.insert_unit(vec![source("b.c")]).unwrap();

        let result = graph.insert_unit(vec![source("c.c")]);
        assert!(matches!(
            result,
            Err(GraphError::LimitExceeded { what: "units", .. })
        ));
    }

    #[test]
    fn file_limit_enforced() {
        let mut graph = BuildGraph::with_limits(GraphLimits {
            max_units: 16,
            max_files_per_unit: 1,
        });
        let result = graph.insert_unit(vec![source("a.c"), header("a.h")]);
        assert!(matches!(
            result,
            Err(GraphError::LimitExceeded {
                what: "files per unit",
                ..
            })
        ));
    }

    #[test]
    fn dependency_on_unknown_unit_rejected() {
        let mut graph = BuildGraph::new();
        let a = graph.insert_unit(vec![source("a.c")]).unwrap();

        let result = graph.add_dependency(a, UnitId::new(7));
        assert!(matches!(result, Err(GraphError::UnknownUnit(id)) if id == UnitId::new(7)));
        let result = graph.add_dependency(UnitId::new(7), a);
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_dependency_ignored() {
        let mut graph = BuildGraph::new();
        let a = graph.insert_unit(vec![source("a.c")]).unwrap();
        let b = graph.insert_unit(vec![source("b.c")]).unwrap();

        graph.add_dependency(a, b).unwrap();
        graph.add_dependency(a, b).unwrap();
        assert_eq!(graph.unit(a).unwrap().depends_on(), &[b]);
    }

    #[test]
    fn second_target_rejected() {
        let mut graph = BuildGraph::new();
        let a = graph.insert_unit(vec![source("a.c")]).unwrap();
        graph
            .set_target(LinkTarget::new("app", None, vec![a]))
            .unwrap();

        let result = graph.set_target(LinkTarget::new("app2", None, vec![a]));
        assert!(matches!(result, Err(GraphError::TargetAlreadySet)));
    }

    #[test]
    fn target_with_unknown_root_rejected() {
        let mut graph = BuildGraph::new();
        let result = graph.set_target(LinkTarget::new("app", None, vec![UnitId::new(0)]));
        assert!(matches!(result, Err(GraphError::UnknownUnit(_))));
    }

    #[test]
    fn resolve_orders_dependencies_first() {
        let mut graph = BuildGraph::new();
        let a = graph.insert_unit(vec![source("a.c")]).unwrap();
        let b = graph.insert_unit(vec![source("b.c")]).unwrap();
        let c = graph.insert_unit(vec![source("c.c")]).unwrap();

        // c -> b -> a
        graph.add_dependency(c, b).unwrap();
        graph.add_dependency(b, a).unwrap();

        graph.begin_pass();
        graph.resolve(c).unwrap();
        assert_eq!(graph.resolution().order(), &[a, b, c]);
    }

    #[test]
    fn diamond_resolved_once() {
        let mut graph = BuildGraph::new();
        let base = graph.insert_unit(vec![source("base.c")]).unwrap();
        let left = graph.insert_unit(vec![source("left.c")]).unwrap();
        let right = graph.insert_unit(vec![source("right.c")]).unwrap();
        let top = graph.insert_unit(vec![source("top.c")]).unwrap();

        graph.add_dependency(left, base).unwrap();
        graph.add_dependency(right, base).unwrap();
        graph.add_dependency(top, left).unwrap();
        graph.add_dependency(top, right).unwrap();

        graph.begin_pass();
        graph.resolve(top).unwrap();

        let order = graph.resolution().order();
        assert_eq!(order.len(), 4);
        assert_eq!(order.iter().filter(|&&id| id == base).count(), 1);

        let pos = |id| order.iter().position(|&u| u == id).unwrap();
        assert!(pos(base) < pos(left));
        assert!(pos(base) < pos(right));
        assert!(pos(left) < pos(top));
        assert!(pos(right) < pos(top));
    }

    #[test]
    fn cycle_reports_both_endpoints() {
        let mut graph = BuildGraph::new();
        let a = graph.insert_unit(vec![source("a.c")]).unwrap();
        let b = graph.insert_unit(vec![source("b.c")]).unwrap();

        graph.add_dependency(a, b).unwrap();
        graph.add_dependency(b, a).unwrap();

        graph.begin_pass();
        let result = graph.resolve(a);
        match result {
            Err(GraphError::CircularDependency { from, to }) => {
                assert_eq!(from, b);
                assert_eq!(to, a);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn long_cycle_detected() {
        let mut graph = BuildGraph::new();
        let a = graph.insert_unit(vec![source("a.c")]).unwrap();
        let b = graph.insert_unit(vec![source("b.c")]).unwrap();
        let c = graph.insert_unit(vec![source("c.c")]).unwrap();
        let d = graph.insert_unit(vec![source("d.c")]).unwrap();

        graph.add_dependency(a, b).unwrap();
        graph.add_dependency(b, c).unwrap();
        graph.add_dependency(c, d).unwrap();
        graph.add_dependency(d, b).unwrap();

        graph.begin_pass();
        let result = graph.resolve(a);
        assert!(matches!(
            result,
            Err(GraphError::CircularDependency { from, to }) if from == d && to == b
        ));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let mut graph = BuildGraph::new();
        let a = graph.insert_unit(vec![source("a.c")]).unwrap();
        graph.add_dependency(a, a).unwrap();

        graph.begin_pass();
        let result = graph.resolve(a);
        assert!(matches!(
            result,
            Err(GraphError::CircularDependency { from, to }) if from == a && to == a
        ));
    }

    #[test]
    fn second_root_skips_resolved_subgraph() {
        let mut graph = BuildGraph::new();
        let shared = graph.insert_unit(vec![source("shared.c")]).unwrap();
        let first = graph.insert_unit(vec![source("first.c")]).unwrap();
        let second = graph.insert_unit(vec![source("second.c")]).unwrap();

        graph.add_dependency(first, shared).unwrap();
        graph.add_dependency(second, shared).unwrap();

        graph.begin_pass();
        graph.resolve(first).unwrap();
        assert!(graph.resolution().is_resolved(first));
        assert!(graph.resolution().is_resolved(shared));
        assert!(!graph.resolution().is_resolved(second));

        graph.resolve(second).unwrap();
        assert_eq!(graph.resolution().order(), &[shared, first, second]);
    }

    #[test]
    fn begin_pass_resets_resolution_and_bumps_generation() {
        let mut graph = BuildGraph::new();
        let a = graph.insert_unit(vec![source("a.c")]).unwrap();

        graph.begin_pass();
        assert_eq!(graph.generation(), 1);
        graph.resolve(a).unwrap();
        assert_eq!(graph.resolution().order().len(), 1);

        graph.begin_pass();
        assert_eq!(graph.generation(), 2);
        assert!(graph.resolution().order().is_empty());
        assert!(!graph.resolution().is_resolved(a));
    }

    #[test]
    fn evaluation_cache_is_per_generation() {
        let mut graph = BuildGraph::new();
        let a = graph.insert_unit(vec![source("a.c")]).unwrap();

        graph.begin_pass();
        let generation = graph.generation();
        assert_eq!(graph.unit(a).unwrap().evaluated_in(generation), None);

        graph.unit_mut(a).unwrap().mark_evaluated(generation, true);
        assert_eq!(graph.unit(a).unwrap().evaluated_in(generation), Some(true));
        assert!(graph.unit(a).unwrap().is_dirty());

        graph.begin_pass();
        assert_eq!(graph.unit(a).unwrap().evaluated_in(graph.generation()), None);
    }

    #[test]
    fn nodes_iterates_units_then_target() {
        let mut graph = BuildGraph::new();
        let a = graph.insert_unit(vec![header("a.h")]).unwrap();
        graph
            .set_target(LinkTarget::new("out", None, vec![a]))
            .unwrap();

        let nodes: Vec<_> = graph.nodes().collect();
        assert_eq!(nodes.len(), 2);
        assert!(matches!(nodes[0], NodeRef::Unit(unit) if unit.id() == a));
        assert!(matches!(nodes[1], NodeRef::Target(target) if target.path() == Path::new("out")));
    }

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        let one = ContentDigest::of_bytes(b"int main() {}\n");
        let two = ContentDigest::of_bytes(b"int main() {}\n");
        let three = ContentDigest::of_bytes(b"int main() { return 1; }\n");

        assert_eq!(one, two);
        assert_ne!(one, three);
        assert_eq!(one.to_hex().len(), 64);
        assert_eq!(format!("{one}").len(), 8);
    }

    #[test]
    fn digest_hex_round_trip() {
        let digest = ContentDigest::of_bytes(b"round trip");
        let parsed = ContentDigest::from_hex(&digest.to_hex());
        assert_eq!(parsed, Some(digest));

        assert_eq!(ContentDigest::from_hex("not hex"), None);
        assert_eq!(ContentDigest::from_hex("abcd"), None);
    }

    #[test]
    fn target_link_stamp() {
        let mut target = LinkTarget::new("app", None, vec![]);
        assert_eq!(target.last_linked(), None);

        let now = SystemTime::now();
        target.set_last_linked(now);
        assert_eq!(target.last_linked(), Some(now));
    }
}
