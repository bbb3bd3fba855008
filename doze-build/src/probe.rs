//! File system probing: usability, roles, timestamps and digests.
//!
//! Probes never error. A file that cannot be observed yields `None` (or
//! `false`) and the caller decides whether to drop it or skip it; unusable
//! files are excluded silently rather than aborting a build.

use doze_graph::{ContentDigest, FileRole};
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

const HEADER_EXTENSIONS: [&str; 3] = ["h", "hh", "hpp"];
const SOURCE_EXTENSIONS: [&str; 3] = ["c", "cc", "cpp"];

/// Classify a path by extension, case-insensitively.
///
/// Returns `None` for extensions the engine does not recognise (and for
/// paths without an extension), which callers treat as "not usable".
#[must_use]
pub fn classify(path: &Path) -> Option<FileRole> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if HEADER_EXTENSIONS.contains(&ext.as_str()) {
        Some(FileRole::Header)
    } else if SOURCE_EXTENSIONS.contains(&ext.as_str()) {
        Some(FileRole::Source)
    } else {
        None
    }
}

/// Whether `path` is a readable regular file.
#[must_use]
pub fn is_usable(path: &Path) -> bool {
    fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false)
}

/// Modification time of `path`, `None` when it cannot be observed.
#[must_use]
pub fn last_modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

/// Content digest of `path`, `None` when it cannot be read.
#[must_use]
pub fn digest(path: &Path) -> Option<ContentDigest> {
    match fs::read(path) {
        Ok(bytes) => Some(ContentDigest::of_bytes(&bytes)),
        Err(err) => {
            debug!("cannot digest {}: {}", path.display(), err);
            None
        }
    }
}
