use crate::agents::{enabled_rules, Agent};
use crate::detection::{DetectionPayload, DetectionResult, RemediationResult};
use crate::types::{AgentMode, AgentRule, AgentType, LatencyRecord, Severity};

/// Detects runtime anomalies and adjusts performance or baselines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatencyAgent;

const HIGH_DEVIATION_PCT: f64 = 50.0;
const MEDIUM_DEVIATION_PCT: f64 = 20.0;
const SUSPICIOUS_SPEEDUP_PCT: f64 = 30.0;

impl Agent for LatencyAgent {
    type Telemetry = LatencyRecord;

    const KIND: AgentType = AgentType::Latency;

    fn name(&self) -> &'static str {
        "Latency Anomaly Agent"
    }

    fn description(&self) -> &'static str {
        "Detects and remediates pipeline latency anomalies"
    }

    fn detect(&self, records: &[LatencyRecord], rules: &[AgentRule]) -> Vec<DetectionResult> {
        tracing::debug!(
            records = records.len(),
            rules = enabled_rules(rules, Self::KIND),
            "latency agent detecting"
        );
        records
            .iter()
            .filter(|r| r.is_anomaly)
            .map(|record| {
                let abs = record.deviation.abs();
                let severity = if abs > HIGH_DEVIATION_PCT {
                    Severity::High
                } else if abs > MEDIUM_DEVIATION_PCT {
                    Severity::Medium
                } else {
                    Severity::Low
                };
                let (issue_type, verb) = if record.is_slow() {
                    ("latency_slow", "exceeded")
                } else {
                    ("latency_fast", "undercut")
                };
                DetectionResult {
                    pipeline: record.pipeline.clone(),
                    timestamp: record.timestamp,
                    issue_type: issue_type.to_string(),
                    description: format!(
                        "Pipeline runtime {verb} expected duration by {abs:.1}%"
                    ),
                    severity,
                    payload: DetectionPayload::Latency(record.clone()),
                }
            })
            .collect()
    }

    fn remediate(&self, record: &LatencyRecord, mode: AgentMode) -> RemediationResult {
        let abs = record.deviation.abs();
        let (action, reasoning, confidence, applied) = match (record.is_slow(), abs) {
            (true, a) if a > HIGH_DEVIATION_PCT => (
                "Apply comprehensive performance optimization",
                format!(
                    "Severe performance degradation detected ({a:.1}% slower). Applying multiple optimization techniques."
                ),
                0.85,
                vec![
                    "Optimized query execution plan",
                    "Increased parallelism",
                    "Added performance monitoring",
                ],
            ),
            (true, a) => (
                "Optimize query and adjust resource allocation",
                format!(
                    "Pipeline runtime exceeded expected duration by {a:.1}%. Applying targeted optimizations."
                ),
                0.80,
                vec!["Applied query optimization", "Adjusted resource allocation"],
            ),
            (false, a) if a > SUSPICIOUS_SPEEDUP_PCT => (
                "Verify data completeness and integrity",
                format!(
                    "Pipeline completed {a:.1}% faster than expected. This significant deviation requires data completeness verification."
                ),
                0.70,
                vec![
                    "Ran data integrity checks",
                    "Verified record counts against source",
                    "Updated runtime expectations",
                ],
            ),
            (false, a) => (
                "Update runtime expectations",
                format!(
                    "Pipeline consistently running {a:.1}% faster than expected. Adjusting baseline performance metrics."
                ),
                0.90,
                vec!["Updated expected runtime baseline"],
            ),
        };
        RemediationResult::for_mode(
            mode,
            action.to_string(),
            confidence,
            reasoning,
            applied.into_iter().map(str::to_string).collect(),
        )
    }
}
