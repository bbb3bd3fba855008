//! Build configuration: a flat table of options.
//!
//! Everything is optional at the table level. An unset scalar means "omit"
//! (paths resolve relative to the working directory, no flags are emitted);
//! the compiler is the one entry a build cannot proceed without, checked
//! when the first command is synthesized rather than here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options shared by every command of a build.
///
/// Deserializes straight out of the build manifest; command-line flags
/// override individual fields afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Compiler executable, also used as the link driver.
    pub compiler: Option<String>,
    /// Directory unit file paths are resolved under.
    pub source_root: Option<PathBuf>,
    /// Directory objects, the target and the state file land in.
    pub output_root: Option<PathBuf>,
    /// Include directories, emitted as fused `-Idir` flags in order.
    pub includes: Vec<PathBuf>,
    /// Library search paths, emitted as fused `-Ldir` flags at link time.
    pub lib_paths: Vec<PathBuf>,
    /// Libraries, emitted as fused `-lname` flags at link time.
    pub libs: Vec<String>,
    /// Extra flags appended verbatim to every compile command.
    pub compile_flags: Vec<String>,
    /// Extra flags appended verbatim to the link command.
    pub link_flags: Vec<String>,
}

impl BuildOptions {
    /// Resolve a unit file path under the source root.
    #[must_use]
    pub fn source_path(&self, name: &Path) -> PathBuf {
        match &self.source_root {
            Some(root) => root.join(name),
            None => name.to_path_buf(),
        }
    }

    /// Resolve an output (object, target, state) path under the output root.
    #[must_use]
    pub fn output_path(&self, name: &Path) -> PathBuf {
        match &self.output_root {
            Some(root) => root.join(name),
            None => name.to_path_buf(),
        }
    }
}
