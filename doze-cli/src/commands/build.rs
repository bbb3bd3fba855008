//! Build command: one incremental pass from manifest to linked target.

use crate::manifest::{Manifest, Overrides};
use doze_build::state::{self, StateFile};
use doze_build::{Builder, StalenessStrategy, SystemRunner};
use std::path::Path;
use std::sync::Arc;

/// Run one build pass driven by the manifest at `file`.
pub async fn execute(
    file: &Path,
    overrides: Overrides,
    timestamps: bool,
    jobs: Option<usize>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let manifest = Manifest::load(file).await?;
    let mut options = manifest.options.clone();
    overrides.apply(&mut options);

    let strategy = if timestamps {
        StalenessStrategy::Timestamp
    } else {
        StalenessStrategy::ContentHash
    };

    // Digest state only matters for the content strategy; mtimes are
    // probed from disk every pass.
    let state_path = state::default_location(&options);
    let state = match strategy {
        StalenessStrategy::ContentHash => StateFile::load(&state_path).await?,
        StalenessStrategy::Timestamp => None,
    };

    let project = manifest.assemble(options, state)?;
    let mut graph = project.graph;

    let mut builder =
        Builder::new(project.options, Arc::new(SystemRunner)).with_strategy(strategy);
    if let Some(jobs) = jobs {
        builder = builder.with_parallelism(jobs);
    }

    let report = builder.build(&mut graph).await?;

    if strategy == StalenessStrategy::ContentHash {
        StateFile::capture(&graph).save(&state_path).await?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.display();
    }
    Ok(())
}
