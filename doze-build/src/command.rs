//! Compile and link command synthesis.
//!
//! Pure functions: no file system access, no process spawning. Commands
//! are argv vectors with the program as the first element, never joined
//! shell strings, so paths with spaces survive untouched.

use crate::error::{BuildError, BuildResult};
use crate::options::BuildOptions;
use doze_graph::LinkTarget;
use std::path::{Path, PathBuf};

/// Derive the object file location for a source file.
///
/// The source path is flattened by replacing every path separator with
/// `_`, the extension becomes `o`, and the result lands under the output
/// root when one is set. `src/net/io.c` with output root `build` becomes
/// `build/src_net_io.o`, which keeps equal file names from distinct
/// directories apart.
#[must_use]
pub fn object_path(options: &BuildOptions, source: &Path) -> PathBuf {
    let flat: String = source
        .to_string_lossy()
        .chars()
        .map(|c| if std::path::is_separator(c) { '_' } else { c })
        .collect();
    let mut name = PathBuf::from(flat);
    let _ = name.set_extension("o");
    options.output_path(&name)
}

/// Synthesize the compile command for one source file.
///
/// Shape: `compiler -c source -o object -I<dir>... <extra flags>...`.
///
/// # Errors
///
/// Returns `BuildError::CompilerNotSet` when the options carry no compiler.
pub fn compile_command(
    options: &BuildOptions,
    source: &Path,
    object: &Path,
) -> BuildResult<Vec<String>> {
    let compiler = options.compiler.as_ref().ok_or(BuildError::CompilerNotSet)?;

    let mut argv = vec![
        compiler.clone(),
        "-c".to_string(),
        source.to_string_lossy().into_owned(),
        "-o".to_string(),
        object.to_string_lossy().into_owned(),
    ];
    for include in &options.includes {
        argv.push(format!("-I{}", include.display()));
    }
    argv.extend(options.compile_flags.iter().cloned());
    Ok(argv)
}

/// Synthesize the link command for the target.
///
/// Shape: `compiler -o target <objects>... -L<dir>... -l<name>...
/// <extra flags>...`. The caller passes every accumulated object, clean
/// units included; a link always consumes the full object list.
///
/// # Errors
///
/// Returns `BuildError::CompilerNotSet` when the options carry no compiler.
pub fn link_command(
    options: &BuildOptions,
    target: &LinkTarget,
    objects: &[PathBuf],
) -> BuildResult<Vec<String>> {
    let compiler = options.compiler.as_ref().ok_or(BuildError::CompilerNotSet)?;

    let mut argv = vec![
        compiler.clone(),
        "-o".to_string(),
        target.path().to_string_lossy().into_owned(),
    ];
    argv.extend(objects.iter().map(|o| o.to_string_lossy().into_owned()));
    for dir in &options.lib_paths {
        argv.push(format!("-L{}", dir.display()));
    }
    for lib in &options.libs {
        argv.push(format!("-l{lib}"));
    }
    argv.extend(options.link_flags.iter().cloned());
    Ok(argv)
}
