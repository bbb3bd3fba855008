//! Graph command: show what the manifest assembles into.

use crate::manifest::Manifest;
use doze_graph::{BuildGraph, FileRole, NodeRef, UnitId};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct GraphDump<'a> {
    units: Vec<UnitDump<'a>>,
    target: Option<TargetDump<'a>>,
    order: Vec<UnitId>,
}

#[derive(Serialize)]
struct UnitDump<'a> {
    id: UnitId,
    name: &'a str,
    files: Vec<FileDump<'a>>,
    depends_on: &'a [UnitId],
}

#[derive(Serialize)]
struct FileDump<'a> {
    path: &'a Path,
    role: FileRole,
}

#[derive(Serialize)]
struct TargetDump<'a> {
    path: &'a Path,
    depends_on: &'a [UnitId],
}

/// Assemble the graph at `file`, resolve it, and print every node.
pub async fn execute(
    file: &Path,
    json: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let manifest = Manifest::load(file).await?;
    let project = manifest.assemble(manifest.options.clone(), None)?;
    let mut graph = project.graph;
    let names = project.names;

    // Resolve up front; a cycle is worth reporting here rather than at
    // build time.
    let roots = graph
        .target()
        .map(|target| target.depends_on().to_vec())
        .unwrap_or_default();
    graph.begin_pass();
    for root in roots {
        if graph.resolution().is_resolved(root) {
            continue;
        }
        graph.resolve(root)?;
    }

    if json {
        let dump = collect(&graph, &names);
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(());
    }

    for node in graph.nodes() {
        match node {
            NodeRef::Unit(unit) => {
                let name = name_of(&names, unit.id());
                println!("{} ({name})", unit.id());
                for file in unit.files() {
                    let role = match file.role {
                        FileRole::Header => "header",
                        FileRole::Source => "source",
                    };
                    println!("  {} [{role}]", file.path.display());
                }
                if !unit.depends_on().is_empty() {
                    println!("  depends on: {}", join_ids(unit.depends_on()));
                }
            }
            NodeRef::Target(target) => {
                println!("target {}", target.path().display());
                if !target.depends_on().is_empty() {
                    println!("  depends on: {}", join_ids(target.depends_on()));
                }
            }
        }
    }

    let order = graph.resolution().order();
    if !order.is_empty() {
        println!("order: {}", join_ids(order));
    }
    Ok(())
}

fn collect<'a>(graph: &'a BuildGraph, names: &'a [String]) -> GraphDump<'a> {
    let units = graph
        .units()
        .iter()
        .map(|unit| UnitDump {
            id: unit.id(),
            name: name_of(names, unit.id()),
            files: unit
                .files()
                .iter()
                .map(|file| FileDump {
                    path: &file.path,
                    role: file.role,
                })
                .collect(),
            depends_on: unit.depends_on(),
        })
        .collect();

    GraphDump {
        units,
        target: graph.target().map(|target| TargetDump {
            path: target.path(),
            depends_on: target.depends_on(),
        }),
        order: graph.resolution().order().to_vec(),
    }
}

fn name_of(names: &[String], id: UnitId) -> &str {
    names.get(id.index()).map_or("?", String::as_str)
}

fn join_ids(ids: &[UnitId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
