//! Human review of recorded interventions: `approve`, `reject`, `fix`.

use ingestmate_core::AgentIntervention;
use ingestmate_ledger::{InterventionLedger, LedgerStore, MonitorConfig, WorkspacePaths};
use std::path::Path;

use crate::render::intervention_detail;

pub fn approve(repo_root: &Path, id: &str, by: Option<&str>) -> anyhow::Result<()> {
    let updated = review(repo_root, id, by, Action::Approve)?;
    println!("{}", intervention_detail(&updated));
    Ok(())
}

pub fn reject(repo_root: &Path, id: &str, by: Option<&str>) -> anyhow::Result<()> {
    let updated = review(repo_root, id, by, Action::Reject)?;
    println!("{}", intervention_detail(&updated));
    Ok(())
}

pub fn fix(repo_root: &Path, id: &str, by: Option<&str>) -> anyhow::Result<()> {
    let updated = review(repo_root, id, by, Action::Fix)?;
    println!("{}", intervention_detail(&updated));
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Approve,
    Reject,
    Fix,
}

fn review(
    repo_root: &Path,
    id: &str,
    by: Option<&str>,
    action: Action,
) -> anyhow::Result<AgentIntervention> {
    let paths = WorkspacePaths::discover(repo_root);
    let store = LedgerStore::open(&paths)?;
    let config = MonitorConfig::load(&paths)?;
    let principal = by.unwrap_or(&config.principal);

    store.update(|ledger: &mut InterventionLedger| {
        let updated = match action {
            Action::Approve => {
                let mut executor = config.executor();
                ledger.approve(id, principal, &mut executor)?
            }
            Action::Reject => ledger.reject(id, principal)?,
            Action::Fix => ledger.mark_manually_fixed(id, principal)?,
        };
        Ok(updated.clone())
    })
}
