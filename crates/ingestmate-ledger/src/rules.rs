//! Agent rule catalogue stored as YAML in `.ingestmate/rules.yaml`.
//!
//! Rules are advisory: they document what each agent reacts to and whether a
//! human signs off, and can be toggled, but detection logic does not read them.

use anyhow::Context;
use ingestmate_core::{AgentRule, AgentType};
use time::{Duration, OffsetDateTime};

use crate::paths::{write_atomic, WorkspacePaths};

struct RuleSeed {
    name: &'static str,
    description: &'static str,
    agent_type: AgentType,
    trigger_condition: &'static str,
    action: &'static str,
    requires_approval: bool,
    created_days_ago: i64,
    updated_days_ago: i64,
}

const DEFAULT_RULES: &[RuleSeed] = &[
    RuleSeed {
        name: "Schema Drift - New Column",
        description: "Automatically map newly added columns to downstream targets",
        agent_type: AgentType::Schema,
        trigger_condition: "Schema change type is ADD",
        action: "Create mapping for new column and apply to downstream targets",
        requires_approval: true,
        created_days_ago: 30,
        updated_days_ago: 5,
    },
    RuleSeed {
        name: "Schema Drift - Removed Column",
        description: "Update downstream dependencies when a column is removed",
        agent_type: AgentType::Schema,
        trigger_condition: "Schema change type is REMOVE",
        action: "Remove references to deleted column in downstream processes",
        requires_approval: true,
        created_days_ago: 30,
        updated_days_ago: 5,
    },
    RuleSeed {
        name: "Schema Drift - Type Change",
        description: "Update transformations when a column type changes",
        agent_type: AgentType::Schema,
        trigger_condition: "Schema change type is MODIFY and column.type has changed",
        action: "Update data type conversions in transformations",
        requires_approval: true,
        created_days_ago: 30,
        updated_days_ago: 5,
    },
    RuleSeed {
        name: "Job Failure - Out of Memory",
        description: "Increase memory allocation when OOM errors occur",
        agent_type: AgentType::Job,
        trigger_condition: "Job status is FAILED and error type contains \"OutOfMemory\"",
        action: "Increase memory allocation by 50% and retry job",
        requires_approval: false,
        created_days_ago: 20,
        updated_days_ago: 2,
    },
    RuleSeed {
        name: "Job Failure - Timeout",
        description: "Increase timeout threshold for long-running jobs",
        agent_type: AgentType::Job,
        trigger_condition: "Job status is FAILED and error type contains \"Timeout\"",
        action: "Double timeout threshold and retry job",
        requires_approval: false,
        created_days_ago: 25,
        updated_days_ago: 3,
    },
    RuleSeed {
        name: "Job Failure - Connection Error",
        description: "Implement exponential backoff for connection issues",
        agent_type: AgentType::Job,
        trigger_condition: "Job status is FAILED and error type contains \"Connection\"",
        action: "Retry with exponential backoff strategy",
        requires_approval: false,
        created_days_ago: 15,
        updated_days_ago: 15,
    },
    RuleSeed {
        name: "Latency - Slow Performance",
        description: "Optimize query performance for slow pipelines",
        agent_type: AgentType::Latency,
        trigger_condition: "Runtime > 1.3 * Expected Runtime",
        action: "Apply query optimization techniques and increase concurrency",
        requires_approval: true,
        created_days_ago: 10,
        updated_days_ago: 10,
    },
    RuleSeed {
        name: "Latency - Suspiciously Fast",
        description: "Verify data completeness for abnormally fast pipelines",
        agent_type: AgentType::Latency,
        trigger_condition: "Runtime < 0.7 * Expected Runtime",
        action: "Validate data completeness and quality",
        requires_approval: true,
        created_days_ago: 10,
        updated_days_ago: 10,
    },
];

/// The rule set written by `ingestmate init`.
pub fn default_rules(now: OffsetDateTime) -> Vec<AgentRule> {
    DEFAULT_RULES
        .iter()
        .map(|seed| AgentRule {
            id: format!("rule_{}", ulid::Ulid::new().to_string().to_lowercase()),
            name: seed.name.to_string(),
            description: seed.description.to_string(),
            agent_type: seed.agent_type,
            trigger_condition: seed.trigger_condition.to_string(),
            action: seed.action.to_string(),
            enabled: true,
            requires_approval: seed.requires_approval,
            created_at: now - Duration::days(seed.created_days_ago),
            updated_at: now - Duration::days(seed.updated_days_ago),
        })
        .collect()
}

/// Read `.ingestmate/rules.yaml`. A missing file means no rules.
pub fn load_rules(paths: &WorkspacePaths) -> anyhow::Result<Vec<AgentRule>> {
    let path = &paths.rules_yaml;
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let rules: Vec<AgentRule> = serde_yaml::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(rules)
}

pub fn save_rules(paths: &WorkspacePaths, rules: &[AgentRule]) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(rules)?;
    write_atomic(&paths.rules_yaml, yaml.as_bytes())
}

/// Enable or disable a rule by id or exact name. Returns the updated rule.
pub fn set_enabled(
    rules: &mut [AgentRule],
    key: &str,
    enabled: bool,
    now: OffsetDateTime,
) -> anyhow::Result<AgentRule> {
    let rule = rules
        .iter_mut()
        .find(|r| r.id == key || r.name == key)
        .ok_or_else(|| anyhow::anyhow!("no rule with id or name {key:?}"))?;
    rule.enabled = enabled;
    rule.updated_at = now;
    Ok(rule.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_767_225_600).unwrap()
    }

    #[test]
    fn defaults_cover_every_agent() {
        let rules = default_rules(now());
        assert_eq!(rules.len(), 8);
        for kind in [AgentType::Schema, AgentType::Job, AgentType::Latency] {
            assert!(rules.iter().any(|r| r.agent_type == kind));
        }
        assert!(rules.iter().all(|r| r.enabled && r.id.starts_with("rule_")));
        assert!(rules.iter().all(|r| r.created_at <= r.updated_at));
    }

    #[test]
    fn yaml_round_trip_through_workspace() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = WorkspacePaths::discover(tmp.path());
        paths.ensure_layout().unwrap();
        assert!(load_rules(&paths).unwrap().is_empty());

        let rules = default_rules(now());
        save_rules(&paths, &rules).unwrap();
        let loaded = load_rules(&paths).unwrap();
        assert_eq!(loaded.len(), rules.len());
        assert_eq!(loaded[3].name, "Job Failure - Out of Memory");
        assert!(!loaded[3].requires_approval);
        assert_eq!(loaded[0].created_at, rules[0].created_at);
    }

    #[test]
    fn toggle_by_name() {
        let mut rules = default_rules(now());
        let later = now() + Duration::hours(1);
        let r = set_enabled(&mut rules, "Latency - Suspiciously Fast", false, later).unwrap();
        assert!(!r.enabled);
        assert_eq!(r.updated_at, later);
        assert!(set_enabled(&mut rules, "nope", true, later).is_err());
    }
}
