use crate::agents::{enabled_rules, Agent};
use crate::detection::{DetectionPayload, DetectionResult, RemediationResult};
use crate::types::{AgentMode, AgentRule, AgentType, SchemaChange, SchemaChangeKind, Severity};

/// Detects and remediates schema drift.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaAgent;

impl Agent for SchemaAgent {
    type Telemetry = SchemaChange;

    const KIND: AgentType = AgentType::Schema;

    fn name(&self) -> &'static str {
        "Schema Drift Agent"
    }

    fn description(&self) -> &'static str {
        "Detects and remediates schema changes across pipelines"
    }

    fn detect(&self, changes: &[SchemaChange], rules: &[AgentRule]) -> Vec<DetectionResult> {
        tracing::debug!(
            changes = changes.len(),
            rules = enabled_rules(rules, Self::KIND),
            "schema agent detecting"
        );
        changes
            .iter()
            .map(|change| {
                let severity = match change.kind {
                    SchemaChangeKind::Remove { .. } if change.impact == Severity::High => {
                        Severity::High
                    }
                    _ => change.impact,
                };
                DetectionResult {
                    pipeline: change.pipeline.clone(),
                    timestamp: change.timestamp,
                    issue_type: format!("schema_drift_{}", change.kind.label()),
                    description: change.description.clone(),
                    severity,
                    payload: DetectionPayload::SchemaChange(change.clone()),
                }
            })
            .collect()
    }

    fn remediate(&self, change: &SchemaChange, mode: AgentMode) -> RemediationResult {
        let (action, reasoning, confidence, applied) = match &change.kind {
            SchemaChangeKind::Add { column } => (
                format!("Add mapping for new column {}", column.name),
                "New column detected in schema. Added mapping to downstream tables and processes."
                    .to_string(),
                0.90,
                vec![
                    format!("Created mapping for column {}", column.name),
                    "Updated downstream dependencies".to_string(),
                ],
            ),
            SchemaChangeKind::Remove { column } => (
                format!("Remove references to deleted column {}", column.name),
                "Column was removed from source schema. Updated downstream dependencies to handle missing field."
                    .to_string(),
                0.85,
                vec![
                    format!("Removed references to column {}", column.name),
                    "Applied null handling for downstream consumers".to_string(),
                ],
            ),
            SchemaChangeKind::Modify {
                column,
                previous_column,
            } => (
                format!("Update data transformations for modified column {}", column.name),
                format!(
                    "Column type changed from {} to {}. Adjusted transformations accordingly.",
                    previous_column.data_type, column.data_type
                ),
                0.75,
                vec![
                    format!("Updated transformation logic for column {}", column.name),
                    "Added data type validation".to_string(),
                ],
            ),
            SchemaChangeKind::Rename { column, .. } => (
                format!("Investigate schema change for column {}", column.name),
                "Unrecognized schema change pattern. Needs manual review.".to_string(),
                0.60,
                vec![format!("Flagged column {} for manual review", column.name)],
            ),
        };
        RemediationResult::for_mode(mode, action, confidence, reasoning, applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::fixtures::{column, schema_change};
    use crate::types::RemediationStatus;

    #[test]
    fn detect_maps_every_change() {
        let changes = vec![
            schema_change(
                "p1",
                SchemaChangeKind::Add {
                    column: column("email", "varchar"),
                },
                Severity::Low,
            ),
            schema_change(
                "p1",
                SchemaChangeKind::Remove {
                    column: column("legacy_id", "int"),
                },
                Severity::High,
            ),
        ];
        let detections = SchemaAgent.detect(&changes, &[]);
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].issue_type, "schema_drift_add");
        assert_eq!(detections[0].severity, Severity::Low);
        assert_eq!(detections[1].issue_type, "schema_drift_remove");
        assert_eq!(detections[1].severity, Severity::High);
    }

    #[test]
    fn remediate_add_is_mode_sensitive() {
        let change = schema_change(
            "p1",
            SchemaChangeKind::Add {
                column: column("email", "varchar"),
            },
            Severity::Low,
        );

        let auto = SchemaAgent.remediate(&change, AgentMode::Autonomous);
        assert_eq!(auto.status, RemediationStatus::Applied);
        assert_eq!(auto.confidence, 0.90);
        let applied = auto.applied_actions.unwrap();
        assert!(!applied.is_empty());
        assert!(applied[0].contains("email"));

        let supervised = SchemaAgent.remediate(&change, AgentMode::Supervised);
        assert_eq!(supervised.status, RemediationStatus::Pending);
        assert!(supervised.applied_actions.is_none());
    }

    #[test]
    fn remediate_modify_cites_old_and_new_type() {
        let change = schema_change(
            "p1",
            SchemaChangeKind::Modify {
                column: column("amount", "decimal"),
                previous_column: column("amount", "float"),
            },
            Severity::Medium,
        );
        let r = SchemaAgent.remediate(&change, AgentMode::Supervised);
        assert_eq!(r.confidence, 0.75);
        assert!(r.action.contains("Update data transformations for modified column"));
        assert!(r.reasoning.contains("from float to decimal"));
    }

    #[test]
    fn remediate_rename_falls_back_to_investigation() {
        let change = schema_change(
            "p1",
            SchemaChangeKind::Rename {
                column: column("customer_name", "varchar"),
                previous_name: Some("name".into()),
            },
            Severity::Low,
        );
        let r = SchemaAgent.remediate(&change, AgentMode::Supervised);
        assert_eq!(r.confidence, 0.60);
        assert!(r.action.starts_with("Investigate schema change"));
    }
}
