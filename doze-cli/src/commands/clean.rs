//! Clean command: remove everything a build derives, keep the sources.

use crate::manifest::Manifest;
use doze_build::{command, state};
use doze_graph::NodeRef;
use std::path::Path;
use tracing::debug;

/// Remove the objects, target and state file the manifest's build
/// would produce. Files that are already gone are not an error.
pub async fn execute(file: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let manifest = Manifest::load(file).await?;
    let project = manifest.assemble(manifest.options.clone(), None)?;

    let mut removed = 0usize;
    for node in project.graph.nodes() {
        match node {
            NodeRef::Unit(unit) => {
                for record in unit.files() {
                    if record.is_header() {
                        continue;
                    }
                    let object = command::object_path(&project.options, &record.path);
                    if tokio::fs::remove_file(&object).await.is_ok() {
                        debug!("removed {}", object.display());
                        removed += 1;
                    }
                }
            }
            NodeRef::Target(target) => {
                if tokio::fs::remove_file(target.path()).await.is_ok() {
                    debug!("removed {}", target.path().display());
                    removed += 1;
                }
            }
        }
    }

    let state_path = state::default_location(&project.options);
    if tokio::fs::remove_file(&state_path).await.is_ok() {
        debug!("removed {}", state_path.display());
        removed += 1;
    }

    println!("doze: removed {removed} file(s)");
    Ok(())
}
