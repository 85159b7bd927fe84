use anyhow::Context;

use crate::ledger::InterventionLedger;
use crate::lock::WorkspaceLock;
use crate::paths::{write_atomic, WorkspacePaths};

/// File-backed persistence for the intervention ledger (`.ingestmate/interventions.json`).
pub struct LedgerStore {
    paths: WorkspacePaths,
}

impl LedgerStore {
    /// Open the store for an initialized workspace.
    pub fn open(paths: &WorkspacePaths) -> anyhow::Result<Self> {
        paths.require_initialized()?;
        Ok(Self {
            paths: paths.clone(),
        })
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    /// Read the ledger. A missing file is an empty ledger.
    pub fn load(&self) -> anyhow::Result<InterventionLedger> {
        let path = &self.paths.interventions_json;
        if !path.exists() {
            return Ok(InterventionLedger::new());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(InterventionLedger::new());
        }
        let ledger: InterventionLedger = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        tracing::debug!(count = ledger.len(), "ledger loaded");
        Ok(ledger)
    }

    pub fn save(&self, ledger: &InterventionLedger) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(ledger)?;
        write_atomic(&self.paths.interventions_json, json.as_bytes())?;
        tracing::debug!(count = ledger.len(), "ledger saved");
        Ok(())
    }

    /// Read-modify-write under the workspace lock.
    /// The ledger is only written back when `f` succeeds.
    pub fn update<T>(
        &self,
        f: impl FnOnce(&mut InterventionLedger) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let _lock = WorkspaceLock::acquire(&self.paths)?;
        let mut ledger = self.load()?;
        let out = f(&mut ledger)?;
        self.save(&ledger)?;
        Ok(out)
    }
}
