use serde::Serialize;
use time::OffsetDateTime;

use crate::types::{AgentIntervention, LatencyRecord, Pipeline, RemediationStatus, RunStatus};

/// Fleet-wide health and intervention KPIs.
#[derive(Debug, Clone, Serialize)]
pub struct SystemMetrics {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub total_pipelines: usize,
    pub active_pipelines: usize,
    pub failed_pipelines: usize,
    pub warning_pipelines: usize,
    pub agent_interventions: usize,
    pub successful_interventions: usize,
    pub failed_interventions: usize,
    pub pending_interventions: usize,
    /// Applied / (applied + failed); `None` before anything has resolved.
    pub success_rate: Option<f64>,
    /// Mean time to resolution in minutes, detection to sign-off.
    pub mttr_minutes: f64,
    /// Mean of pipeline average runtimes, seconds.
    pub avg_latency: f64,
    /// Mean absolute runtime deviation, percent.
    pub avg_deviation: f64,
}

impl SystemMetrics {
    pub fn compute(
        pipelines: &[Pipeline],
        interventions: &[AgentIntervention],
        latency_records: &[LatencyRecord],
        now: OffsetDateTime,
    ) -> Self {
        let pipelines_in = |s: RunStatus| pipelines.iter().filter(|p| p.status == s).count();
        let interventions_in =
            |s: RemediationStatus| interventions.iter().filter(|i| i.status == s).count();

        let applied = interventions_in(RemediationStatus::Applied);
        let failed = interventions_in(RemediationStatus::Failed);

        let resolution_minutes: Vec<f64> = interventions
            .iter()
            .filter(|i| i.status == RemediationStatus::Applied)
            .filter_map(|i| i.approved_at().map(|at| (at - i.timestamp).as_seconds_f64() / 60.0))
            .collect();

        Self {
            timestamp: now,
            total_pipelines: pipelines.len(),
            active_pipelines: pipelines_in(RunStatus::Running),
            failed_pipelines: pipelines_in(RunStatus::Failed),
            warning_pipelines: pipelines_in(RunStatus::Warning),
            agent_interventions: interventions.len(),
            successful_interventions: applied,
            failed_interventions: failed,
            pending_interventions: interventions_in(RemediationStatus::Pending),
            success_rate: (applied + failed > 0)
                .then(|| applied as f64 / (applied + failed) as f64),
            mttr_minutes: mean(resolution_minutes.iter().copied()),
            avg_latency: mean(pipelines.iter().map(|p| p.avg_runtime)),
            avg_deviation: mean(latency_records.iter().map(|r| r.deviation.abs())),
        }
    }
}

/// Arithmetic mean, 0 for an empty sequence.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}
