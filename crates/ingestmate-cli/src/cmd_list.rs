use ingestmate_core::{AgentIntervention, RemediationStatus};
use ingestmate_ledger::{LedgerStore, WorkspacePaths};
use std::path::Path;

use crate::render::intervention_line;

pub fn execute(
    repo_root: &Path,
    pipeline: Option<&str>,
    status: Option<RemediationStatus>,
    json: bool,
) -> anyhow::Result<()> {
    let matches = list(repo_root, pipeline, status)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }
    if matches.is_empty() {
        println!("(no interventions)");
        return Ok(());
    }
    for i in &matches {
        println!("{}", intervention_line(i));
    }
    Ok(())
}

/// Interventions in ledger order, optionally filtered.
pub fn list(
    repo_root: &Path,
    pipeline: Option<&str>,
    status: Option<RemediationStatus>,
) -> anyhow::Result<Vec<AgentIntervention>> {
    let store = LedgerStore::open(&WorkspacePaths::discover(repo_root))?;
    let ledger = store.load()?;
    Ok(ledger
        .iter()
        .filter(|i| pipeline.map_or(true, |p| i.pipeline.as_str() == p))
        .filter(|i| status.map_or(true, |s| i.status == s))
        .cloned()
        .collect())
}
