use serde::Serialize;
use time::OffsetDateTime;

use crate::types::{
    AgentMode, AgentType, JobRun, LatencyRecord, PipelineRef, RemediationStatus, SchemaChange,
    Severity,
};

/// The telemetry record a detection was raised from.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum DetectionPayload {
    SchemaChange(SchemaChange),
    JobRun(JobRun),
    Latency(LatencyRecord),
}

impl DetectionPayload {
    /// Agent that owns this telemetry kind.
    pub fn agent_type(&self) -> AgentType {
        match self {
            Self::SchemaChange(_) => AgentType::Schema,
            Self::JobRun(_) => AgentType::Job,
            Self::Latency(_) => AgentType::Latency,
        }
    }
}

/// One anomaly found during a detection pass. Built fresh each pass and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    pub pipeline: PipelineRef,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Namespaced, e.g. `schema_drift_add`, `job_failure_timeout`, `latency_slow`.
    pub issue_type: String,
    pub description: String,
    pub severity: Severity,
    pub payload: DetectionPayload,
}

/// Output of an agent's remediation step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemediationResult {
    pub action: String,
    pub confidence: f64,
    pub status: RemediationStatus,
    pub reasoning: String,
    /// Present only when the remediation was applied autonomously.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_actions: Option<Vec<String>>,
}

impl RemediationResult {
    /// Fill status and applied actions from the operating mode.
    pub(crate) fn for_mode(
        mode: AgentMode,
        action: String,
        confidence: f64,
        reasoning: String,
        applied_actions: Vec<String>,
    ) -> Self {
        match mode {
            AgentMode::Autonomous => Self {
                action,
                confidence,
                status: RemediationStatus::Applied,
                reasoning,
                applied_actions: Some(applied_actions),
            },
            AgentMode::Supervised => Self {
                action,
                confidence,
                status: RemediationStatus::Pending,
                reasoning,
                applied_actions: None,
            },
        }
    }

    /// Human-readable summary of what was applied, if anything.
    pub fn applied_summary(&self) -> Option<String> {
        self.applied_actions
            .as_ref()
            .map(|actions| format!("Applied actions: {}", actions.join(", ")))
    }
}
