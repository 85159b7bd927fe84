use std::sync::LazyLock;

use regex::Regex;

use crate::agents::{enabled_rules, Agent};
use crate::detection::{DetectionPayload, DetectionResult, RemediationResult};
use crate::types::{AgentMode, AgentRule, AgentType, JobRun, RunStatus, Severity};

/// Detects failed job runs and proposes recovery.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobAgent;

/// Error-type families, in match precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureClass {
    OutOfMemory,
    Timeout,
    Connection,
    DataQuality,
    Other,
}

impl FailureClass {
    /// First substring match wins: `ConnectionTimeoutError` is a timeout.
    fn of(error_type: Option<&str>) -> Self {
        let Some(e) = error_type else {
            return Self::Other;
        };
        if e.contains("OutOfMemory") {
            Self::OutOfMemory
        } else if e.contains("Timeout") {
            Self::Timeout
        } else if e.contains("Connection") {
            Self::Connection
        } else if e.contains("Validation") || e.contains("Parse") {
            Self::DataQuality
        } else {
            Self::Other
        }
    }
}

fn severity_for(error_type: Option<&str>) -> Severity {
    match error_type {
        Some("OutOfMemoryError" | "ConnectionError") => Severity::High,
        Some("ValidationError" | "ParseError") => Severity::Medium,
        _ => Severity::Low,
    }
}

static TRAILING_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)error$").expect("static regex"));

/// `OutOfMemoryError` -> `outofmemory`; missing error types become `unknown`.
pub fn failure_suffix(error_type: Option<&str>) -> String {
    let Some(e) = error_type.filter(|e| !e.trim().is_empty()) else {
        return "unknown".to_string();
    };
    TRAILING_ERROR.replace(e.trim(), "").to_lowercase()
}

impl Agent for JobAgent {
    type Telemetry = JobRun;

    const KIND: AgentType = AgentType::Job;

    fn name(&self) -> &'static str {
        "Job Failure Agent"
    }

    fn description(&self) -> &'static str {
        "Detects and remediates failed pipeline jobs"
    }

    fn detect(&self, runs: &[JobRun], rules: &[AgentRule]) -> Vec<DetectionResult> {
        tracing::debug!(
            runs = runs.len(),
            rules = enabled_rules(rules, Self::KIND),
            "job agent detecting"
        );
        runs.iter()
            .filter(|run| run.status == RunStatus::Failed)
            .map(|run| {
                let error_type = run.error_type.as_deref();
                let message = run.error_message.as_deref().unwrap_or("unknown error");
                DetectionResult {
                    pipeline: run.pipeline.clone(),
                    timestamp: run.end_time.unwrap_or(run.start_time),
                    issue_type: format!("job_failure_{}", failure_suffix(error_type)),
                    description: format!("Job failed with error: {message}"),
                    severity: severity_for(error_type),
                    payload: DetectionPayload::JobRun(run.clone()),
                }
            })
            .collect()
    }

    fn remediate(&self, run: &JobRun, mode: AgentMode) -> RemediationResult {
        let resubmit = |how: &str| format!("Resubmitted job with {how}");
        let (action, reasoning, confidence, applied) =
            match FailureClass::of(run.error_type.as_deref()) {
                FailureClass::OutOfMemory => (
                    "Increase memory allocation and retry job".to_string(),
                    "Job failed due to memory constraints. Temporarily increasing allocation to handle peak loads."
                        .to_string(),
                    0.90,
                    vec![
                        "Increased memory allocation by 50%".to_string(),
                        resubmit("new configuration"),
                    ],
                ),
                FailureClass::Timeout => (
                    "Increase timeout threshold and retry job".to_string(),
                    "Job exceeded timeout limits. Adjusting timeout settings to accommodate larger data volume."
                        .to_string(),
                    0.85,
                    vec![
                        "Doubled timeout threshold".to_string(),
                        resubmit("new configuration"),
                    ],
                ),
                FailureClass::Connection => (
                    "Retry connection with exponential backoff".to_string(),
                    "Detected transient connection issue. Implementing retry mechanism with exponential backoff."
                        .to_string(),
                    0.80,
                    vec![
                        "Implemented exponential backoff strategy".to_string(),
                        resubmit("retry logic"),
                    ],
                ),
                FailureClass::DataQuality => (
                    "Add data validation and error handling".to_string(),
                    "Input data quality issues detected. Adding validation checks and error handling for bad records."
                        .to_string(),
                    0.75,
                    vec![
                        "Added data validation checks".to_string(),
                        "Implemented error handling for malformed records".to_string(),
                        resubmit("updated logic"),
                    ],
                ),
                FailureClass::Other => (
                    "Apply generic error handling and retry".to_string(),
                    format!(
                        "Unrecognized error pattern: {}. Applying generic recovery strategy.",
                        run.error_type.as_deref().unwrap_or("unknown")
                    ),
                    0.60,
                    vec![
                        "Applied generic error handling".to_string(),
                        resubmit("recovery logic"),
                    ],
                ),
            };
        RemediationResult::for_mode(mode, action, confidence, reasoning, applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::fixtures::failed_run;
    use crate::types::RemediationStatus;

    #[test]
    fn detect_keeps_only_failed_runs() {
        let mut ok = failed_run("p1", None, 10);
        ok.status = RunStatus::Completed;
        let mut running = failed_run("p1", None, 20);
        running.status = RunStatus::Running;
        running.end_time = None;
        let bad = failed_run("p1", Some("TimeoutError"), 30);

        let detections = JobAgent.detect(&[ok, running, bad], &[]);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].issue_type, "job_failure_timeout");
        assert!(detections[0].description.contains("TimeoutError"));
    }

    #[test]
    fn severity_by_error_type() {
        let cases = [
            ("OutOfMemoryError", Severity::High),
            ("ConnectionError", Severity::High),
            ("ValidationError", Severity::Medium),
            ("ParseError", Severity::Medium),
            ("TimeoutError", Severity::Low),
            ("RateLimitError", Severity::Low),
        ];
        for (error_type, expected) in cases {
            let d = JobAgent.detect(&[failed_run("p1", Some(error_type), 0)], &[]);
            assert_eq!(d[0].severity, expected, "{error_type}");
        }
    }

    #[test]
    fn issue_suffix_strips_trailing_error() {
        assert_eq!(failure_suffix(Some("OutOfMemoryError")), "outofmemory");
        assert_eq!(failure_suffix(Some("DuplicateKeyERROR")), "duplicatekey");
        assert_eq!(failure_suffix(Some("ErrorBudget")), "errorbudget");
        assert_eq!(failure_suffix(None), "unknown");
    }

    #[test]
    fn missing_error_type_is_unknown_and_low() {
        let d = JobAgent.detect(&[failed_run("p1", None, 0)], &[]);
        assert_eq!(d[0].issue_type, "job_failure_unknown");
        assert_eq!(d[0].severity, Severity::Low);
    }

    #[test]
    fn out_of_memory_autonomous() {
        let run = failed_run("p1", Some("OutOfMemoryError"), 0);
        let r = JobAgent.remediate(&run, AgentMode::Autonomous);
        assert_eq!(r.confidence, 0.90);
        assert_eq!(r.status, RemediationStatus::Applied);
        let applied = r.applied_actions.unwrap();
        assert_eq!(applied[0], "Increased memory allocation by 50%");
    }

    #[test]
    fn first_substring_match_wins() {
        let run = failed_run("p1", Some("ConnectionTimeoutError"), 0);
        let r = JobAgent.remediate(&run, AgentMode::Supervised);
        assert_eq!(r.confidence, 0.85);
        assert!(r.action.contains("timeout"));
    }

    #[test]
    fn confidence_by_failure_class() {
        let cases = [
            ("TimeoutError", 0.85),
            ("ConnectionError", 0.80),
            ("ValidationError", 0.75),
            ("ParseError", 0.75),
            ("AuthenticationError", 0.60),
        ];
        for (error_type, expected) in cases {
            let r = JobAgent.remediate(
                &failed_run("p1", Some(error_type), 0),
                AgentMode::Autonomous,
            );
            assert_eq!(r.confidence, expected, "{error_type}");
            let n = r.applied_actions.unwrap().len();
            assert!((2..=3).contains(&n));
        }
    }
}
