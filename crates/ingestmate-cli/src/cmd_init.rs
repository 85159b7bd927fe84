use ingestmate_ledger::paths::{write_atomic, WorkspacePaths};
use ingestmate_ledger::rules::{default_rules, save_rules};
use std::path::Path;
use time::OffsetDateTime;

pub fn execute(repo_root: &Path) -> anyhow::Result<()> {
    let paths = WorkspacePaths::discover(repo_root);
    let fresh = !paths.is_initialized();
    init_workspace(&paths)?;

    if fresh {
        println!("Initialized {}", paths.workspace_dir.display());
    } else {
        println!("Already initialized at {}", paths.workspace_dir.display());
    }
    Ok(())
}

/// Create the layout and seed files that are missing. Existing files are left alone.
pub fn init_workspace(paths: &WorkspacePaths) -> anyhow::Result<()> {
    paths.ensure_layout()?;

    if !paths.interventions_json.exists() {
        write_atomic(&paths.interventions_json, b"[]\n")?;
    }
    if !paths.rules_yaml.exists() {
        let rules = default_rules(OffsetDateTime::now_utc());
        save_rules(paths, &rules)?;
        tracing::info!(count = rules.len(), "default agent rules written");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestmate_ledger::rules::load_rules;
    use ingestmate_ledger::LedgerStore;

    #[test]
    fn init_seeds_workspace() {
        let tmp = tempfile::tempdir().unwrap();
        execute(tmp.path()).unwrap();

        let paths = WorkspacePaths::discover(tmp.path());
        assert!(paths.is_initialized());
        assert_eq!(load_rules(&paths).unwrap().len(), 8);
        let store = LedgerStore::open(&paths).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn init_is_idempotent_and_keeps_edits() {
        let tmp = tempfile::tempdir().unwrap();
        execute(tmp.path()).unwrap();
        let paths = WorkspacePaths::discover(tmp.path());
        std::fs::write(&paths.rules_yaml, "[]\n").unwrap();

        execute(tmp.path()).unwrap();
        assert!(load_rules(&paths).unwrap().is_empty());
    }
}
