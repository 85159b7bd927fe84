//! Telemetry snapshot handed to a detection pass, plus input validation.

use serde::{Deserialize, Serialize};

use crate::types::{JobRun, LatencyRecord, Pipeline, PipelineRef, RunStatus, SchemaChange};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TelemetryError {
    #[error("job run {id}: status is {status} but end_time is {}", presence(.has_end))]
    EndTimeMismatch {
        id: String,
        status: RunStatus,
        has_end: bool,
    },
    #[error("job run {id}: end_time precedes start_time")]
    EndBeforeStart { id: String },
    #[error("{kind} {id}: runtime must be a finite, non-negative number of seconds")]
    InvalidRuntime { kind: &'static str, id: String },
    #[error("latency record {id}: expected_runtime must be positive")]
    InvalidExpectedRuntime { id: String },
    #[error("latency record {id}: deviation {deviation} disagrees with runtime vs expected")]
    DeviationMismatch { id: String, deviation: f64 },
}

fn presence(has_end: &bool) -> &'static str {
    if *has_end {
        "set"
    } else {
        "missing"
    }
}

/// Everything one evaluation pass looks at. Owned and passed explicitly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    #[serde(default)]
    pub pipelines: Vec<Pipeline>,
    #[serde(default)]
    pub schema_changes: Vec<SchemaChange>,
    #[serde(default)]
    pub job_runs: Vec<JobRun>,
    #[serde(default)]
    pub latency_records: Vec<LatencyRecord>,
}

impl TelemetrySnapshot {
    /// Check the invariants the type system cannot express. Stops at the first violation.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        for run in &self.job_runs {
            validate_job_run(run)?;
        }
        for record in &self.latency_records {
            validate_latency(record)?;
        }
        Ok(())
    }

    /// Restrict the snapshot to a single pipeline.
    pub fn for_pipeline(&self, pipeline: &PipelineRef) -> Self {
        Self {
            pipelines: self
                .pipelines
                .iter()
                .filter(|p| &p.id == pipeline)
                .cloned()
                .collect(),
            schema_changes: self
                .schema_changes
                .iter()
                .filter(|c| &c.pipeline == pipeline)
                .cloned()
                .collect(),
            job_runs: self
                .job_runs
                .iter()
                .filter(|r| &r.pipeline == pipeline)
                .cloned()
                .collect(),
            latency_records: self
                .latency_records
                .iter()
                .filter(|r| &r.pipeline == pipeline)
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.schema_changes.is_empty() && self.job_runs.is_empty() && self.latency_records.is_empty()
    }
}

fn validate_job_run(run: &JobRun) -> Result<(), TelemetryError> {
    let running = run.status == RunStatus::Running;
    if running == run.end_time.is_some() {
        return Err(TelemetryError::EndTimeMismatch {
            id: run.id.clone(),
            status: run.status,
            has_end: run.end_time.is_some(),
        });
    }
    if let Some(end) = run.end_time {
        if end < run.start_time {
            return Err(TelemetryError::EndBeforeStart { id: run.id.clone() });
        }
    }
    if !run.runtime.is_finite() || run.runtime < 0.0 {
        return Err(TelemetryError::InvalidRuntime {
            kind: "job run",
            id: run.id.clone(),
        });
    }
    Ok(())
}

fn validate_latency(record: &LatencyRecord) -> Result<(), TelemetryError> {
    if !record.runtime.is_finite() || record.runtime < 0.0 {
        return Err(TelemetryError::InvalidRuntime {
            kind: "latency record",
            id: record.id.clone(),
        });
    }
    if !record.expected_runtime.is_finite() || record.expected_runtime <= 0.0 {
        return Err(TelemetryError::InvalidExpectedRuntime {
            id: record.id.clone(),
        });
    }
    let actual = record.runtime - record.expected_runtime;
    let sign_disagrees = (actual > 0.0 && record.deviation <= 0.0)
        || (actual < 0.0 && record.deviation >= 0.0);
    if !record.deviation.is_finite() || sign_disagrees {
        return Err(TelemetryError::DeviationMismatch {
            id: record.id.clone(),
            deviation: record.deviation,
        });
    }
    Ok(())
}
