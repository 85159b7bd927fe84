use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Opaque identifier correlating telemetry and interventions to one pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineRef(String);

impl PipelineRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PipelineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PipelineRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PipelineRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Implements `Display` and `FromStr` over the snake_case wire names.
macro_rules! str_enum {
    ($ty:ident, $what:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    other => Err(format!(concat!("unknown ", $what, ": {}"), other)),
                }
            }
        }
    };
}

// ── Enums ──

/// Severity of a detection; also used as the impact level of a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

str_enum!(Severity, "severity", { Low => "low", Medium => "medium", High => "high" });

/// Whether remediations wait for a human (`supervised`) or apply immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    Supervised,
    #[default]
    Autonomous,
}

str_enum!(AgentMode, "agent mode", { Supervised => "supervised", Autonomous => "autonomous" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Schema,
    Job,
    Latency,
}

str_enum!(AgentType, "agent type", { Schema => "schema", Job => "job", Latency => "latency" });

impl AgentType {
    /// Issue-type namespace owned by this agent.
    pub fn issue_prefix(&self) -> &'static str {
        match self {
            Self::Schema => "schema_drift",
            Self::Job => "job_failure",
            Self::Latency => "latency",
        }
    }

    /// Select the agent responsible for a namespaced issue type.
    /// Unknown namespaces yield `None`.
    pub fn for_issue_type(issue_type: &str) -> Option<Self> {
        [Self::Schema, Self::Job, Self::Latency]
            .into_iter()
            .find(|a| issue_type.starts_with(a.issue_prefix()))
    }
}

/// Lifecycle status of an intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationStatus {
    Pending,
    Approved,
    Rejected,
    Applied,
    Failed,
}

str_enum!(RemediationStatus, "remediation status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Applied => "applied",
    Failed => "failed",
});

// Manual fixes bypass this table: they may move any status to `Applied`.
const VALID_TRANSITIONS: &[(RemediationStatus, &[RemediationStatus])] = &[
    (
        RemediationStatus::Pending,
        &[
            RemediationStatus::Approved,
            RemediationStatus::Applied,
            RemediationStatus::Failed,
            RemediationStatus::Rejected,
        ],
    ),
    (
        RemediationStatus::Approved,
        &[RemediationStatus::Applied, RemediationStatus::Failed],
    ),
    (RemediationStatus::Failed, &[RemediationStatus::Applied]),
];

impl RemediationStatus {
    pub fn can_transition_to(self, next: RemediationStatus) -> bool {
        VALID_TRANSITIONS
            .iter()
            .any(|(from, targets)| *from == self && targets.contains(&next))
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Applied | Self::Rejected | Self::Failed)
    }

    /// An existing intervention in this status means the issue is already being handled.
    pub fn blocks_redetection(self) -> bool {
        !matches!(self, Self::Failed | Self::Rejected)
    }
}

/// Run status shared by pipelines and individual job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Failed,
    Completed,
    Warning,
}

str_enum!(RunStatus, "run status", {
    Running => "running",
    Failed => "failed",
    Completed => "completed",
    Warning => "warning",
});

// ── Pipelines ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: PipelineRef,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: RunStatus,
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Average runtime in seconds.
    pub avg_runtime: f64,
    /// Health score 0-100.
    pub health: u8,
}

// ── Schema ──

/// Shape of one column at a schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SchemaColumn {
    pub fn new(name: &str, data_type: &str, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable,
            description: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub id: String,
    pub pipeline: PipelineRef,
    pub version: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub columns: Vec<SchemaColumn>,
}

/// What changed between two schema versions. Only `Modify` carries the previous column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change_type", rename_all = "snake_case")]
pub enum SchemaChangeKind {
    Add {
        column: SchemaColumn,
    },
    Remove {
        column: SchemaColumn,
    },
    Modify {
        column: SchemaColumn,
        previous_column: SchemaColumn,
    },
    Rename {
        column: SchemaColumn,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous_name: Option<String>,
    },
}

impl SchemaChangeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Modify { .. } => "modify",
            Self::Rename { .. } => "rename",
        }
    }

    /// The column as it exists after the change (or as it was, for removals).
    pub fn column(&self) -> &SchemaColumn {
        match self {
            Self::Add { column }
            | Self::Remove { column }
            | Self::Modify { column, .. }
            | Self::Rename { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaChange {
    pub id: String,
    pub pipeline: PipelineRef,
    pub from_version: u32,
    pub to_version: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(flatten)]
    pub kind: SchemaChangeKind,
    pub impact: Severity,
    pub description: String,
}

// ── Jobs ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCounts {
    pub processed: u64,
    pub failed: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
    pub id: String,
    pub pipeline: PipelineRef,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    /// Absent iff the run is still `running`.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<OffsetDateTime>,
    pub status: RunStatus,
    #[serde(default)]
    pub records: RecordCounts,
    /// Seconds.
    pub runtime: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_stack_trace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage_mb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_usage_pct: Option<f64>,
}

// ── Latency ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyRecord {
    pub id: String,
    pub pipeline: PipelineRef,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Seconds.
    pub runtime: f64,
    /// Seconds.
    pub expected_runtime: f64,
    /// Signed percentage; positive means slower than expected.
    pub deviation: f64,
    pub is_anomaly: bool,
}

/// Default `|deviation|` (percent) at which a latency observation counts as an anomaly.
pub const DEFAULT_ANOMALY_THRESHOLD_PCT: f64 = 30.0;

impl LatencyRecord {
    /// Build a record from a measured runtime, deriving deviation and the anomaly flag.
    pub fn observe(
        id: impl Into<String>,
        pipeline: PipelineRef,
        timestamp: OffsetDateTime,
        runtime: f64,
        expected_runtime: f64,
        anomaly_threshold_pct: f64,
    ) -> Self {
        let deviation = deviation_pct(runtime, expected_runtime);
        Self {
            id: id.into(),
            pipeline,
            timestamp,
            runtime,
            expected_runtime,
            deviation,
            is_anomaly: deviation.abs() >= anomaly_threshold_pct,
        }
    }

    pub fn is_slow(&self) -> bool {
        self.deviation > 0.0
    }
}

/// `(runtime - expected) / expected * 100`.
pub fn deviation_pct(runtime: f64, expected_runtime: f64) -> f64 {
    (runtime - expected_runtime) / expected_runtime * 100.0
}

// ── Interventions ──

/// Who signed off on an intervention, and when. Both are always set together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approval {
    pub by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

/// A proposed or applied remediation tied to one detected issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentIntervention {
    pub id: String,
    pub pipeline: PipelineRef,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub agent_type: AgentType,
    pub issue: String,
    /// Namespaced issue type of the detection that raised this intervention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
    pub action: String,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub status: RemediationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<Approval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub reasoning: String,
}

impl AgentIntervention {
    pub fn approved_by(&self) -> Option<&str> {
        self.approval.as_ref().map(|a| a.by.as_str())
    }

    pub fn approved_at(&self) -> Option<OffsetDateTime> {
        self.approval.as_ref().map(|a| a.at)
    }
}

// ── Rules ──

/// Advisory rule metadata shown alongside an agent. Detection logic does not depend on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub agent_type: AgentType,
    pub trigger_condition: String,
    pub action: String,
    pub enabled: bool,
    pub requires_approval: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_type_selected_by_issue_prefix() {
        assert_eq!(
            AgentType::for_issue_type("schema_drift_add"),
            Some(AgentType::Schema)
        );
        assert_eq!(
            AgentType::for_issue_type("job_failure_timeout"),
            Some(AgentType::Job)
        );
        assert_eq!(
            AgentType::for_issue_type("latency_fast"),
            Some(AgentType::Latency)
        );
        assert_eq!(AgentType::for_issue_type("cost_spike"), None);
    }

    #[test]
    fn status_transitions_follow_lifecycle() {
        use RemediationStatus::*;
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Applied));
        assert!(Approved.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Applied));
        assert!(!Rejected.can_transition_to(Pending));
        assert!(!Applied.can_transition_to(Pending));
        assert!(!Applied.can_transition_to(Rejected));
        assert!(!Failed.can_transition_to(Pending));
        assert!(Failed.is_terminal() && Rejected.is_terminal() && Applied.is_terminal());
        assert!(!Pending.is_terminal() && !Approved.is_terminal());
    }

    #[test]
    fn only_failed_and_rejected_allow_redetection() {
        use RemediationStatus::*;
        assert!(Pending.blocks_redetection());
        assert!(Approved.blocks_redetection());
        assert!(Applied.blocks_redetection());
        assert!(!Failed.blocks_redetection());
        assert!(!Rejected.blocks_redetection());
    }

    #[test]
    fn status_display_parse_roundtrip() {
        for s in [
            RemediationStatus::Pending,
            RemediationStatus::Approved,
            RemediationStatus::Rejected,
            RemediationStatus::Applied,
            RemediationStatus::Failed,
        ] {
            let parsed: RemediationStatus = s.to_string().parse().unwrap();
            assert_eq!(parsed, s);
        }
        assert!("done".parse::<RemediationStatus>().is_err());
    }

    #[test]
    fn agent_mode_defaults_to_autonomous() {
        assert_eq!(AgentMode::default(), AgentMode::Autonomous);
        assert_eq!("supervised".parse::<AgentMode>(), Ok(AgentMode::Supervised));
    }

    #[test]
    fn schema_change_modify_requires_previous_column() {
        let json = r#"{
            "id": "c1", "pipeline": "p1", "from_version": 1, "to_version": 2,
            "timestamp": "2026-03-01T10:00:00Z", "change_type": "modify",
            "column": {"name": "amount", "type": "decimal", "nullable": false},
            "impact": "medium", "description": "type change"
        }"#;
        assert!(serde_json::from_str::<SchemaChange>(json).is_err());
    }

    #[test]
    fn schema_change_deserializes_tagged_kind() {
        let json = r#"{
            "id": "c1", "pipeline": "p1", "from_version": 1, "to_version": 2,
            "timestamp": "2026-03-01T10:00:00Z", "change_type": "modify",
            "column": {"name": "amount", "type": "decimal", "nullable": false},
            "previous_column": {"name": "amount", "type": "float", "nullable": true},
            "impact": "medium", "description": "type change"
        }"#;
        let change: SchemaChange = serde_json::from_str(json).unwrap();
        assert_eq!(change.kind.label(), "modify");
        assert_eq!(change.kind.column().data_type, "decimal");
        match change.kind {
            SchemaChangeKind::Modify {
                previous_column, ..
            } => assert_eq!(previous_column.data_type, "float"),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn latency_observe_derives_deviation() {
        let ts = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let slow = LatencyRecord::observe("l1", "p1".into(), ts, 150.0, 100.0, DEFAULT_ANOMALY_THRESHOLD_PCT);
        assert!((slow.deviation - 50.0).abs() < 1e-9);
        assert!(slow.is_anomaly);
        assert!(slow.is_slow());

        let near = LatencyRecord::observe("l2", "p1".into(), ts, 90.0, 100.0, DEFAULT_ANOMALY_THRESHOLD_PCT);
        assert!((near.deviation + 10.0).abs() < 1e-9);
        assert!(!near.is_anomaly);
        assert!(!near.is_slow());
    }

    #[test]
    fn intervention_approval_fields_move_together() {
        let json = r#"{
            "id": "int_1", "pipeline": "p1", "timestamp": "2026-03-01T10:00:00Z",
            "agent_type": "job", "issue": "Job failed", "action": "retry",
            "confidence": 0.8, "status": "applied",
            "approval": {"by": "ops", "at": "2026-03-01T10:30:00Z"},
            "reasoning": "r"
        }"#;
        let i: AgentIntervention = serde_json::from_str(json).unwrap();
        assert_eq!(i.approved_by(), Some("ops"));
        assert!(i.approved_at().is_some());
        assert!(i.result.is_none());
    }
}
