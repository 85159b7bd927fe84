use ingestmate_core::{SystemMetrics, TelemetrySnapshot};
use ingestmate_ledger::{LedgerStore, WorkspacePaths};
use std::path::Path;
use time::OffsetDateTime;

use crate::cmd_scan::read_telemetry;

pub fn execute(repo_root: &Path, telemetry: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let m = compute(repo_root, telemetry, OffsetDateTime::now_utc())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&m)?);
        return Ok(());
    }

    println!(
        "Pipelines:      {} total, {} running, {} failed, {} warning",
        m.total_pipelines, m.active_pipelines, m.failed_pipelines, m.warning_pipelines
    );
    println!(
        "Interventions:  {} total, {} applied, {} failed, {} pending",
        m.agent_interventions,
        m.successful_interventions,
        m.failed_interventions,
        m.pending_interventions
    );
    match m.success_rate {
        Some(rate) => println!("Success rate:   {:.1}%", rate * 100.0),
        None => println!("Success rate:   n/a"),
    }
    println!("MTTR:           {:.1} min", m.mttr_minutes);
    println!("Avg latency:    {:.1} s", m.avg_latency);
    println!("Avg deviation:  {:.1}%", m.avg_deviation);
    Ok(())
}

pub fn compute(
    repo_root: &Path,
    telemetry: Option<&Path>,
    now: OffsetDateTime,
) -> anyhow::Result<SystemMetrics> {
    let store = LedgerStore::open(&WorkspacePaths::discover(repo_root))?;
    let ledger = store.load()?;
    let snapshot = match telemetry {
        Some(path) => read_telemetry(path)?,
        None => TelemetrySnapshot::default(),
    };
    Ok(SystemMetrics::compute(
        &snapshot.pipelines,
        ledger.as_slice(),
        &snapshot.latency_records,
        now,
    ))
}
