use ingestmate_core::AgentIntervention;
use time::format_description::well_known::Rfc3339;

/// One-line summary used by `scan` and `list`.
pub fn intervention_line(i: &AgentIntervention) -> String {
    format!(
        "{}  {:<8}  {:<7}  {}  {} ({:.0}%)",
        i.id,
        i.status.as_str(),
        i.agent_type.as_str(),
        i.pipeline,
        i.action,
        i.confidence * 100.0
    )
}

/// Multi-line view printed after a review command.
pub fn intervention_detail(i: &AgentIntervention) -> String {
    let mut out = format!(
        "{}  [{}]\n  pipeline:   {}\n  issue:      {}\n  action:     {}\n  confidence: {:.2}\n  reasoning:  {}",
        i.id, i.status, i.pipeline, i.issue, i.action, i.confidence, i.reasoning
    );
    if let Some(result) = &i.result {
        out.push_str(&format!("\n  result:     {result}"));
    }
    if let Some(approval) = &i.approval {
        let at = approval
            .at
            .format(&Rfc3339)
            .unwrap_or_else(|_| approval.at.to_string());
        out.push_str(&format!("\n  by:         {} at {at}", approval.by));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestmate_core::{AgentType, Approval, PipelineRef, RemediationStatus};
    use time::OffsetDateTime;

    fn sample() -> AgentIntervention {
        AgentIntervention {
            id: "int_x".into(),
            pipeline: PipelineRef::from("orders"),
            timestamp: OffsetDateTime::UNIX_EPOCH,
            agent_type: AgentType::Latency,
            issue: "Pipeline runtime exceeded expected duration by 60.0%".into(),
            issue_type: Some("latency_slow".into()),
            action: "Apply comprehensive performance optimization".into(),
            confidence: 0.85,
            status: RemediationStatus::Applied,
            approval: Some(Approval {
                by: "ops".into(),
                at: OffsetDateTime::UNIX_EPOCH,
            }),
            result: Some("Successfully applied remediation".into()),
            reasoning: "Severe slowdown.".into(),
        }
    }

    #[test]
    fn line_carries_key_fields() {
        let line = intervention_line(&sample());
        assert!(line.starts_with("int_x"));
        assert!(line.contains("applied"));
        assert!(line.contains("orders"));
        assert!(line.contains("(85%)"));
    }

    #[test]
    fn detail_includes_review_trail() {
        let text = intervention_detail(&sample());
        assert!(text.contains("result:     Successfully applied remediation"));
        assert!(text.contains("by:         ops at 1970-01-01T00:00:00Z"));
    }
}
