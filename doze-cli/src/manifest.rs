//! Manifest loading: turns a `doze.yml` into a build graph.
//!
//! The manifest is the only place unit names exist. Assembly maps each
//! name to a dense id and hands over a graph that is name-free; the
//! returned name table is for presentation only.

use doze_build::{BuildOptions, GraphBuilder, StateFile, probe};
use doze_graph::{BuildGraph, UnitId};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

type Error = Box<dyn std::error::Error + Send + Sync>;

/// A parsed `doze.yml`.
///
/// The option table sits at the top level of the document; `units` and
/// `target` describe the graph.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    /// Build options, flattened into the document root.
    #[serde(flatten)]
    pub options: BuildOptions,
    /// Compilation units, in declaration order.
    #[serde(default)]
    pub units: Vec<UnitEntry>,
    /// The link target. A manifest without one can still be inspected,
    /// but not built.
    pub target: Option<TargetEntry>,
}

/// One `units:` entry.
#[derive(Debug, Deserialize)]
pub struct UnitEntry {
    /// Unique name other entries refer to.
    pub name: String,
    /// Files (or directories, expanded recursively) making up the unit.
    pub files: Vec<PathBuf>,
    /// Names of units this one depends on.
    #[serde(default)]
    pub deps: Vec<String>,
}

/// The `target:` entry.
#[derive(Debug, Deserialize)]
pub struct TargetEntry {
    /// Output name, resolved under the output root.
    pub name: String,
    /// Names of the root units.
    #[serde(default)]
    pub deps: Vec<String>,
}

/// Command-line overrides applied on top of the manifest options.
///
/// Scalars replace the manifest value; list flags append to it.
#[derive(Debug, Default)]
pub struct Overrides {
    pub compiler: Option<String>,
    pub source_root: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
    pub includes: Vec<PathBuf>,
    pub lib_paths: Vec<PathBuf>,
    pub libs: Vec<String>,
}

impl Overrides {
    /// Fold these overrides into `options`.
    pub fn apply(self, options: &mut BuildOptions) {
        if let Some(compiler) = self.compiler {
            options.compiler = Some(compiler);
        }
        if let Some(root) = self.source_root {
            options.source_root = Some(root);
        }
        if let Some(root) = self.output_root {
            options.output_root = Some(root);
        }
        options.includes.extend(self.includes);
        options.lib_paths.extend(self.lib_paths);
        options.libs.extend(self.libs);
    }
}

/// An assembled project: the graph plus the names it was built from.
pub struct Project {
    /// The assembled graph.
    pub graph: BuildGraph,
    /// Options after assembly, for command synthesis.
    pub options: BuildOptions,
    /// Unit names indexed by dense unit id.
    pub names: Vec<String>,
}

impl Manifest {
    /// Parse a manifest document.
    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Read and parse the manifest at `path`.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| format!("reading {}: {err}", path.display()))?;
        let manifest = Self::parse(&text)?;
        info!(
            "loaded {} with {} unit(s)",
            path.display(),
            manifest.units.len()
        );
        Ok(manifest)
    }

    /// Assemble the graph described by this manifest.
    ///
    /// `options` is usually `self.options` with CLI overrides already
    /// applied; `state` seeds file records with digests from a previous
    /// run. Unknown or duplicate unit names are configuration errors.
    pub fn assemble(
        &self,
        options: BuildOptions,
        state: Option<StateFile>,
    ) -> Result<Project, Error> {
        let mut builder = match state {
            Some(state) => GraphBuilder::new(options).with_state(state),
            None => GraphBuilder::new(options),
        };

        let mut ids_by_name: HashMap<&str, UnitId> = HashMap::new();
        let mut ids = Vec::with_capacity(self.units.len());
        for entry in &self.units {
            if ids_by_name.contains_key(entry.name.as_str()) {
                return Err(format!("duplicate unit name '{}'", entry.name).into());
            }
            let mut paths = Vec::new();
            for file in &entry.files {
                paths.extend(expand_entry(builder.options(), file));
            }
            let id = builder.create_unit(&paths)?;
            ids_by_name.insert(entry.name.as_str(), id);
            ids.push(id);
        }

        // Edges second, so a unit may depend on one declared after it.
        for (entry, &from) in self.units.iter().zip(&ids) {
            for dep in &entry.deps {
                let to = *ids_by_name.get(dep.as_str()).ok_or_else(|| {
                    format!("unit '{}' depends on unknown unit '{dep}'", entry.name)
                })?;
                builder.add_dependency(from, to)?;
            }
        }

        if let Some(target) = &self.target {
            let mut roots = Vec::with_capacity(target.deps.len());
            for dep in &target.deps {
                let root = *ids_by_name
                    .get(dep.as_str())
                    .ok_or_else(|| format!("target depends on unknown unit '{dep}'"))?;
                roots.push(root);
            }
            builder.create_target(&target.name, roots)?;
        }

        let (graph, options) = builder.finish();
        Ok(Project {
            graph,
            options,
            names: self.units.iter().map(|entry| entry.name.clone()).collect(),
        })
    }
}

/// Expand one `files:` entry into unit-relative paths.
///
/// A plain file stays as written. A directory is walked recursively and
/// every recognised source or header under it joins the unit, sorted for
/// a stable unit layout. Paths stay relative to the entry so the graph
/// builder resolves them under the source root exactly once.
fn expand_entry(options: &BuildOptions, entry: &Path) -> Vec<PathBuf> {
    let resolved = options.source_path(entry);
    if !resolved.is_dir() {
        return vec![entry.to_path_buf()];
    }

    let mut found = Vec::new();
    for walked in WalkDir::new(&resolved).into_iter().filter_map(Result::ok) {
        if !walked.file_type().is_file() {
            continue;
        }
        if probe::classify(walked.path()).is_none() {
            continue;
        }
        if let Ok(relative) = walked.path().strip_prefix(&resolved) {
            found.push(entry.join(relative));
        }
    }
    found.sort();
    debug!("{} expanded to {} file(s)", entry.display(), found.len());
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use doze_build::{BuildError, FileRole, GraphError};
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn parses_a_full_manifest() {
        let manifest = Manifest::parse(
            r#"
compiler: gcc
source_root: src
output_root: build
includes: [include]
libs: [m]
compile_flags: [-Wall]
units:
  - name: util
    files: [util.h]
  - name: main
    files: [main.c]
    deps: [util]
target:
  name: app
  deps: [main]
"#,
        )
        .unwrap();

        assert_eq!(manifest.options.compiler.as_deref(), Some("gcc"));
        assert_eq!(manifest.options.includes, vec![PathBuf::from("include")]);
        assert_eq!(manifest.options.compile_flags, vec!["-Wall".to_string()]);
        assert_eq!(manifest.units.len(), 2);
        assert_eq!(manifest.units[1].deps, vec!["util".to_string()]);
        assert_eq!(manifest.target.as_ref().unwrap().name, "app");
    }

    #[test]
    fn minimal_manifest_defaults_everything() {
        let manifest = Manifest::parse("units: []\n").unwrap();
        assert!(manifest.options.compiler.is_none());
        assert!(manifest.units.is_empty());
        assert!(manifest.target.is_none());
    }

    #[test]
    fn assembles_names_into_dense_ids() {
        let dir = TempDir::new().unwrap();
        let _ = write(&dir, "util.h", "#define N 1\n");
        let _ = write(&dir, "main.c", "int main() { return N; }\n");

        let manifest = Manifest::parse(&format!(
            r#"
compiler: cc
source_root: {}
units:
  - name: util
    files: [util.h]
  - name: main
    files: [main.c]
    deps: [util]
target:
  name: app
  deps: [main]
"#,
            dir.path().display()
        ))
        .unwrap();

        let project = manifest.assemble(manifest.options.clone(), None).unwrap();
        assert_eq!(project.names, vec!["util".to_string(), "main".to_string()]);
        assert_eq!(project.graph.unit_count(), 2);

        let main = project.graph.unit(UnitId::new(1)).unwrap();
        assert_eq!(main.depends_on(), &[UnitId::new(0)]);
        let target = project.graph.target().unwrap();
        assert_eq!(target.depends_on(), &[UnitId::new(1)]);
    }

    #[test]
    fn unknown_dependency_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let _ = write(&dir, "main.c", "int main() {}\n");

        let manifest = Manifest::parse(&format!(
            r#"
source_root: {}
units:
  - name: main
    files: [main.c]
    deps: [nothere]
"#,
            dir.path().display()
        ))
        .unwrap();

        let err = manifest
            .assemble(manifest.options.clone(), None)
            .err()
            .unwrap();
        assert!(err.to_string().contains("nothere"));
    }

    #[test]
    fn unknown_target_dependency_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let _ = write(&dir, "main.c", "int main() {}\n");

        let manifest = Manifest::parse(&format!(
            r#"
source_root: {}
units:
  - name: main
    files: [main.c]
target:
  name: app
  deps: [ghost]
"#,
            dir.path().display()
        ))
        .unwrap();

        let err = manifest
            .assemble(manifest.options.clone(), None)
            .err()
            .unwrap();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn duplicate_unit_names_are_rejected() {
        let dir = TempDir::new().unwrap();
        let _ = write(&dir, "a.c", "int a;\n");

        let manifest = Manifest::parse(&format!(
            r#"
source_root: {}
units:
  - name: twice
    files: [a.c]
  - name: twice
    files: [a.c]
"#,
            dir.path().display()
        ))
        .unwrap();

        let err = manifest
            .assemble(manifest.options.clone(), None)
            .err()
            .unwrap();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn empty_unit_is_a_config_error() {
        let dir = TempDir::new().unwrap();

        let manifest = Manifest::parse(&format!(
            r#"
source_root: {}
units:
  - name: hollow
    files: [missing.c]
"#,
            dir.path().display()
        ))
        .unwrap();

        let err = manifest
            .assemble(manifest.options.clone(), None)
            .err()
            .unwrap();
        let build = err.downcast_ref::<BuildError>().unwrap();
        assert!(matches!(build, BuildError::Graph(GraphError::EmptyUnit)));
    }

    #[test]
    fn directory_entries_expand_recursively_and_sorted() {
        let dir = TempDir::new().unwrap();
        let _ = write(&dir, "lib/net/io.c", "int io;\n");
        let _ = write(&dir, "lib/net/io.h", "extern int io;\n");
        let _ = write(&dir, "lib/core.c", "int core;\n");
        let _ = write(&dir, "lib/README.md", "not code\n");

        let manifest = Manifest::parse(&format!(
            r#"
source_root: {}
units:
  - name: lib
    files: [lib]
"#,
            dir.path().display()
        ))
        .unwrap();

        let project = manifest.assemble(manifest.options.clone(), None).unwrap();
        let unit = project.graph.unit(UnitId::new(0)).unwrap();

        let names: Vec<String> = unit
            .files()
            .iter()
            .map(|file| {
                file.path
                    .strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["lib/core.c", "lib/net/io.c", "lib/net/io.h"]);

        let roles: Vec<FileRole> = unit.files().iter().map(|file| file.role).collect();
        assert_eq!(
            roles,
            vec![FileRole::Source, FileRole::Source, FileRole::Header]
        );
    }

    #[test]
    fn overrides_replace_scalars_and_append_lists() {
        let mut options = BuildOptions {
            compiler: Some("gcc".to_string()),
            includes: vec![PathBuf::from("include")],
            ..BuildOptions::default()
        };

        let overrides = Overrides {
            compiler: Some("clang".to_string()),
            includes: vec![PathBuf::from("vendor")],
            ..Overrides::default()
        };
        overrides.apply(&mut options);

        assert_eq!(options.compiler.as_deref(), Some("clang"));
        assert_eq!(
            options.includes,
            vec![PathBuf::from("include"), PathBuf::from("vendor")]
        );
    }
}
