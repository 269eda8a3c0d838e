//! CLI command implementations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use stagehand_config::{VariableContext, load_topology_file};
use stagehand_constructs::Topology;
use std::path::Path;
use tracing::{info, warn};

/// Document printed by `synth`.
#[derive(Debug, Serialize)]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub topology: Topology,
}

fn load(path: &Path) -> Result<Topology> {
    let vars = VariableContext::from_env();
    let loaded = load_topology_file(path, &vars)
        .with_context(|| format!("invalid topology in {}", path.display()))?;
    for name in &loaded.unresolved {
        warn!(variable = %name, "Unresolved variable left verbatim");
    }
    Ok(loaded.topology)
}

pub fn validate(path: &Path) -> Result<()> {
    let topology = load(path)?;
    let deploy_actions = topology
        .pipeline()
        .deploy_stage()
        .map(|stage| stage.actions.len())
        .unwrap_or(0);
    info!(
        kind = topology.kind(),
        pipeline = %topology.pipeline().name(),
        deploy_actions,
        "Topology assembled"
    );
    println!("Configuration is valid");
    Ok(())
}

pub fn synth(path: &Path, compact: bool) -> Result<()> {
    let topology = load(path)?;
    let manifest = Manifest {
        generated_at: Utc::now(),
        topology,
    };
    let json = if compact {
        serde_json::to_string(&manifest)
    } else {
        serde_json::to_string_pretty(&manifest)
    }
    .context("failed to serialize manifest")?;
    println!("{}", json);
    Ok(())
}
