use anyhow::Context;
use ingestmate_core::{
    detect_all, AgentIntervention, AgentMode, PipelineRef, RemediationEngine, TelemetrySnapshot,
};
use ingestmate_ledger::rules::load_rules;
use ingestmate_ledger::{LedgerStore, MonitorConfig, WorkspacePaths};
use serde::Serialize;
use std::path::Path;

use crate::render::intervention_line;

pub struct ScanParams<'a> {
    pub repo_root: &'a Path,
    pub telemetry: &'a Path,
    pub mode: Option<AgentMode>,
    pub pipeline: Option<&'a str>,
    pub dry_run: bool,
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct ScanOutcome {
    pub mode: AgentMode,
    pub detections: usize,
    pub dry_run: bool,
    pub interventions: Vec<AgentIntervention>,
}

/// Read and validate a telemetry snapshot file.
pub fn read_telemetry(path: &Path) -> anyhow::Result<TelemetrySnapshot> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let snapshot: TelemetrySnapshot = serde_json::from_str(&content)
        .with_context(|| format!("parsing telemetry {}", path.display()))?;
    snapshot
        .validate()
        .with_context(|| format!("invalid telemetry {}", path.display()))?;
    Ok(snapshot)
}

pub fn execute(params: &ScanParams<'_>) -> anyhow::Result<()> {
    let outcome = scan(params)?;

    if params.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let verb = if outcome.dry_run { "would record" } else { "recorded" };
    println!(
        "{} detection(s), {verb} {} intervention(s) [{} mode]",
        outcome.detections,
        outcome.interventions.len(),
        outcome.mode
    );
    for i in &outcome.interventions {
        println!("  {}", intervention_line(i));
    }
    Ok(())
}

/// One evaluation pass: detect, dedup against the ledger, append.
pub fn scan(params: &ScanParams<'_>) -> anyhow::Result<ScanOutcome> {
    let paths = WorkspacePaths::discover(params.repo_root);
    let store = LedgerStore::open(&paths)?;
    let config = MonitorConfig::load(&paths)?;
    let mode = params.mode.unwrap_or(config.agent_mode);

    let mut snapshot = read_telemetry(params.telemetry)?;
    if let Some(pipeline) = params.pipeline {
        snapshot = snapshot.for_pipeline(&PipelineRef::from(pipeline));
    }
    let rules = load_rules(&paths)?;
    let detections = detect_all(&snapshot, &rules);
    tracing::info!(detections = detections.len(), %mode, "telemetry scanned");

    let engine = RemediationEngine;
    let interventions = if params.dry_run {
        let ledger = store.load()?;
        engine.process_detections(&detections, mode, ledger.as_slice())
    } else {
        store.update(|ledger| {
            let new = engine.process_detections(&detections, mode, ledger.as_slice());
            ledger.append(new.clone());
            Ok(new)
        })?
    };

    Ok(ScanOutcome {
        mode,
        detections: detections.len(),
        dry_run: params.dry_run,
        interventions,
    })
}
