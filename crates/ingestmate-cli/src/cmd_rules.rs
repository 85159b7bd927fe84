use clap::Subcommand;
use ingestmate_core::{catalog, AgentRule};
use ingestmate_ledger::rules::{load_rules, save_rules, set_enabled};
use ingestmate_ledger::{WorkspaceLock, WorkspacePaths};
use std::path::Path;
use time::OffsetDateTime;

// ── CLI Schema ──

#[derive(Subcommand, Default)]
pub enum RulesCmd {
    /// List agent rules
    #[default]
    List,
    /// Enable a rule
    Enable {
        /// Rule ID (rule_*) or exact name
        rule: String,
    },
    /// Disable a rule
    Disable {
        /// Rule ID (rule_*) or exact name
        rule: String,
    },
}

// ── Dispatch ──

pub fn run(cmd: RulesCmd, repo_root: &Path) -> anyhow::Result<()> {
    match cmd {
        RulesCmd::List => list(repo_root),
        RulesCmd::Enable { rule } => toggle(repo_root, &rule, true),
        RulesCmd::Disable { rule } => toggle(repo_root, &rule, false),
    }
}

// ── Command Implementations ──

fn list(repo_root: &Path) -> anyhow::Result<()> {
    let paths = WorkspacePaths::discover(repo_root);
    paths.require_initialized()?;
    let rules = load_rules(&paths)?;
    if rules.is_empty() {
        println!("(no rules)");
        return Ok(());
    }
    for (kind, name, description) in catalog() {
        let owned: Vec<&AgentRule> = rules.iter().filter(|r| r.agent_type == kind).collect();
        if owned.is_empty() {
            continue;
        }
        println!("{name}: {description}");
        for r in owned {
            println!("  {}", rule_line(r));
        }
    }
    Ok(())
}

fn toggle(repo_root: &Path, key: &str, enabled: bool) -> anyhow::Result<()> {
    let rule = set_rule_enabled(repo_root, key, enabled)?;
    println!("{}", rule_line(&rule));
    Ok(())
}

fn set_rule_enabled(repo_root: &Path, key: &str, enabled: bool) -> anyhow::Result<AgentRule> {
    let paths = WorkspacePaths::discover(repo_root);
    paths.require_initialized()?;
    let _lock = WorkspaceLock::acquire(&paths)?;
    let mut rules = load_rules(&paths)?;
    let rule = set_enabled(&mut rules, key, enabled, OffsetDateTime::now_utc())?;
    save_rules(&paths, &rules)?;
    Ok(rule)
}

fn rule_line(r: &AgentRule) -> String {
    let state = if r.enabled { "on" } else { "off" };
    let review = if r.requires_approval {
        "approval"
    } else {
        "auto"
    };
    format!(
        "{}  [{state}] [{review}]  {:<7}  {}: {}",
        r.id, r.agent_type, r.name, r.action
    )
}
