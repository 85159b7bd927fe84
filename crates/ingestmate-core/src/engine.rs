//! Remediation engine: dedup detections, dispatch to agents, materialize interventions.
//!
//! The engine never touches the ledger. It reads the snapshot it is given and
//! returns the new interventions; the caller appends them. Two passes running
//! concurrently against the same pipeline can both miss each other's output,
//! so callers serialize passes (the CLI holds the workspace lock).

use std::collections::HashMap;

use time::OffsetDateTime;

use crate::agents::{Agent, JobAgent, LatencyAgent, SchemaAgent};
use crate::detection::{DetectionPayload, DetectionResult, RemediationResult};
use crate::types::{AgentIntervention, AgentMode, AgentType, PipelineRef};

/// Intervention ID format: `int_<ulid>`.
pub fn new_intervention_id() -> String {
    format!("int_{}", ulid::Ulid::new().to_string().to_lowercase())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RemediationEngine;

impl RemediationEngine {
    /// Turn a batch of detections into new interventions, stamped with the current time.
    pub fn process_detections(
        &self,
        detections: &[DetectionResult],
        mode: AgentMode,
        existing: &[AgentIntervention],
    ) -> Vec<AgentIntervention> {
        self.process_detections_at(detections, mode, existing, OffsetDateTime::now_utc())
    }

    /// Same as [`process_detections`](Self::process_detections) with an explicit clock.
    pub fn process_detections_at(
        &self,
        detections: &[DetectionResult],
        mode: AgentMode,
        existing: &[AgentIntervention],
        now: OffsetDateTime,
    ) -> Vec<AgentIntervention> {
        let latest = latest_per_issue(detections);
        let mut interventions = Vec::with_capacity(latest.len());

        for detection in latest {
            if already_handled(detection, existing) {
                tracing::debug!(
                    pipeline = %detection.pipeline,
                    issue_type = %detection.issue_type,
                    "skipping: open intervention exists"
                );
                continue;
            }

            let Some(agent) = AgentType::for_issue_type(&detection.issue_type) else {
                tracing::debug!(issue_type = %detection.issue_type, "skipping: no agent for issue type");
                continue;
            };

            let Some(remediation) = remediate(agent, &detection.payload, mode) else {
                tracing::warn!(
                    pipeline = %detection.pipeline,
                    issue_type = %detection.issue_type,
                    payload = %detection.payload.agent_type(),
                    "skipping: payload does not belong to the selected agent"
                );
                continue;
            };

            let intervention = AgentIntervention {
                id: new_intervention_id(),
                pipeline: detection.pipeline.clone(),
                timestamp: now,
                agent_type: agent,
                issue: detection.description.clone(),
                issue_type: Some(detection.issue_type.clone()),
                action: remediation.action.clone(),
                confidence: remediation.confidence,
                status: remediation.status,
                approval: None,
                result: match mode {
                    AgentMode::Autonomous => remediation.applied_summary(),
                    AgentMode::Supervised => None,
                },
                reasoning: remediation.reasoning,
            };
            tracing::info!(
                id = %intervention.id,
                pipeline = %intervention.pipeline,
                agent = %agent,
                status = %intervention.status,
                confidence = intervention.confidence,
                "intervention created"
            );
            interventions.push(intervention);
        }

        interventions
    }
}

/// Keep the latest detection per `(pipeline, issue_type)`, in first-seen key order.
/// Ties keep the earlier detection.
fn latest_per_issue(detections: &[DetectionResult]) -> Vec<&DetectionResult> {
    let mut index: HashMap<(&PipelineRef, &str), usize> = HashMap::new();
    let mut kept: Vec<&DetectionResult> = Vec::new();
    for detection in detections {
        let key = (&detection.pipeline, detection.issue_type.as_str());
        match index.get(&key) {
            Some(&i) => {
                if kept[i].timestamp < detection.timestamp {
                    kept[i] = detection;
                }
            }
            None => {
                index.insert(key, kept.len());
                kept.push(detection);
            }
        }
    }
    kept
}

/// An intervention for the same pipeline and issue that is not failed/rejected.
fn already_handled(detection: &DetectionResult, existing: &[AgentIntervention]) -> bool {
    existing.iter().any(|i| {
        i.pipeline == detection.pipeline
            && i.status.blocks_redetection()
            && (i.issue.contains(&detection.issue_type)
                || i.issue_type.as_deref() == Some(detection.issue_type.as_str()))
    })
}

fn remediate(
    agent: AgentType,
    payload: &DetectionPayload,
    mode: AgentMode,
) -> Option<RemediationResult> {
    match (agent, payload) {
        (AgentType::Schema, DetectionPayload::SchemaChange(change)) => {
            Some(SchemaAgent.remediate(change, mode))
        }
        (AgentType::Job, DetectionPayload::JobRun(run)) => Some(JobAgent.remediate(run, mode)),
        (AgentType::Latency, DetectionPayload::Latency(record)) => {
            Some(LatencyAgent.remediate(record, mode))
        }
        _ => None,
    }
}
