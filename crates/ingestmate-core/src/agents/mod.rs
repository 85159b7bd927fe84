//! Detection + remediation agents.
//!
//! Each agent owns one telemetry kind and one issue-type namespace:
//!
//! - [`SchemaAgent`]: schema changes, `schema_drift_*`
//! - [`JobAgent`]: failed job runs, `job_failure_*`
//! - [`LatencyAgent`]: anomalous runtimes, `latency_*`
//!
//! `detect` and `remediate` are pure. Rules passed to `detect` are advisory
//! metadata only; the detection logic of each agent is fixed.

pub mod job;
pub mod latency;
pub mod schema;

pub use job::JobAgent;
pub use latency::LatencyAgent;
pub use schema::SchemaAgent;

use crate::detection::{DetectionResult, RemediationResult};
use crate::telemetry::TelemetrySnapshot;
use crate::types::{AgentMode, AgentRule, AgentType};

/// A named detector + remediator over one telemetry kind.
pub trait Agent {
    type Telemetry;

    const KIND: AgentType;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Turn raw telemetry into detections. Never fails on valid input.
    fn detect(&self, telemetry: &[Self::Telemetry], rules: &[AgentRule]) -> Vec<DetectionResult>;

    /// Propose (supervised) or apply (autonomous) a remediation for one record.
    fn remediate(&self, telemetry: &Self::Telemetry, mode: AgentMode) -> RemediationResult;
}

/// Number of enabled rules targeting `agent`.
pub(crate) fn enabled_rules(rules: &[AgentRule], agent: AgentType) -> usize {
    rules
        .iter()
        .filter(|r| r.enabled && r.agent_type == agent)
        .count()
}

/// Name and description of each agent, in dispatch order.
pub fn catalog() -> [(AgentType, &'static str, &'static str); 3] {
    [
        (SchemaAgent::KIND, SchemaAgent.name(), SchemaAgent.description()),
        (JobAgent::KIND, JobAgent.name(), JobAgent.description()),
        (LatencyAgent::KIND, LatencyAgent.name(), LatencyAgent.description()),
    ]
}

/// Run every agent over a snapshot: schema changes, then job runs, then latency.
pub fn detect_all(snapshot: &TelemetrySnapshot, rules: &[AgentRule]) -> Vec<DetectionResult> {
    let mut detections = SchemaAgent.detect(&snapshot.schema_changes, rules);
    detections.extend(JobAgent.detect(&snapshot.job_runs, rules));
    detections.extend(LatencyAgent.detect(&snapshot.latency_records, rules));
    tracing::debug!(count = detections.len(), "detection pass complete");
    detections
}

#[cfg(test)]
pub(crate) mod fixtures {
    use time::OffsetDateTime;

    use crate::types::{
        JobRun, LatencyRecord, PipelineRef, RecordCounts, RunStatus, SchemaChange,
        SchemaChangeKind, SchemaColumn, Severity,
    };

    pub fn ts(secs: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_767_225_600 + secs).unwrap()
    }

    pub fn schema_change(pipeline: &str, kind: SchemaChangeKind, impact: Severity) -> SchemaChange {
        SchemaChange {
            id: format!("sc-{}", kind.column().name),
            pipeline: PipelineRef::from(pipeline),
            from_version: 1,
            to_version: 2,
            timestamp: ts(0),
            description: format!("{} column {}", kind.label(), kind.column().name),
            kind,
            impact,
        }
    }

    pub fn column(name: &str, data_type: &str) -> SchemaColumn {
        SchemaColumn::new(name, data_type, true)
    }

    pub fn failed_run(pipeline: &str, error_type: Option<&str>, end: i64) -> JobRun {
        JobRun {
            id: format!("run-{end}"),
            pipeline: PipelineRef::from(pipeline),
            start_time: ts(end - 60),
            end_time: Some(ts(end)),
            status: RunStatus::Failed,
            records: RecordCounts {
                processed: 1000,
                failed: 12,
                skipped: 0,
            },
            runtime: 60.0,
            error_message: error_type.map(|e| format!("Error processing data: {e}")),
            error_type: error_type.map(|e| e.to_string()),
            error_stack_trace: None,
            memory_usage_mb: None,
            cpu_usage_pct: None,
        }
    }

    pub fn latency(pipeline: &str, deviation: f64, is_anomaly: bool) -> LatencyRecord {
        LatencyRecord {
            id: format!("lat-{deviation}"),
            pipeline: PipelineRef::from(pipeline),
            timestamp: ts(0),
            runtime: 100.0 * (1.0 + deviation / 100.0),
            expected_runtime: 100.0,
            deviation,
            is_anomaly,
        }
    }
}
