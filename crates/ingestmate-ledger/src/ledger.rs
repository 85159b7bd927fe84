//! The intervention ledger: durable record of every intervention and its review lifecycle.
//!
//! Interventions are appended by evaluation passes and afterwards only change
//! through `approve`, `reject` and `mark_manually_fixed`. Nothing is ever deleted.
//! A failed operation leaves the ledger untouched.

use ingestmate_core::{AgentIntervention, Approval, PipelineRef, RemediationStatus};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::executor::RemediationExecutor;

/// Result text recorded when an operator resolves an issue by hand.
pub const MANUAL_FIX_RESULT: &str = "resolved manually";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LedgerError {
    #[error("intervention not found: {0}")]
    NotFound(String),
    #[error("intervention {id} is {from}; cannot move to {to}")]
    InvalidTransition {
        id: String,
        from: RemediationStatus,
        to: RemediationStatus,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterventionLedger {
    interventions: Vec<AgentIntervention>,
}

impl InterventionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_interventions(interventions: Vec<AgentIntervention>) -> Self {
        Self { interventions }
    }

    pub fn as_slice(&self) -> &[AgentIntervention] {
        &self.interventions
    }

    pub fn len(&self) -> usize {
        self.interventions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interventions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentIntervention> {
        self.interventions.iter()
    }

    pub fn get(&self, id: &str) -> Option<&AgentIntervention> {
        self.interventions.iter().find(|i| i.id == id)
    }

    pub fn for_pipeline<'a>(
        &'a self,
        pipeline: &'a PipelineRef,
    ) -> impl Iterator<Item = &'a AgentIntervention> {
        self.interventions
            .iter()
            .filter(move |i| &i.pipeline == pipeline)
    }

    /// Append the output of an evaluation pass. Entries whose id is already present are skipped.
    /// Returns the number appended.
    pub fn append(&mut self, new: Vec<AgentIntervention>) -> usize {
        let before = self.interventions.len();
        for intervention in new {
            if self.get(&intervention.id).is_some() {
                tracing::warn!(id = %intervention.id, "duplicate intervention id, skipping");
                continue;
            }
            self.interventions.push(intervention);
        }
        self.interventions.len() - before
    }

    /// Approve a pending intervention and run it through `executor`.
    /// Ends in `Applied` or `Failed` depending on the execution outcome.
    pub fn approve(
        &mut self,
        id: &str,
        principal: &str,
        executor: &mut dyn RemediationExecutor,
    ) -> Result<&AgentIntervention, LedgerError> {
        self.approve_at(id, principal, executor, OffsetDateTime::now_utc())
    }

    pub fn approve_at(
        &mut self,
        id: &str,
        principal: &str,
        executor: &mut dyn RemediationExecutor,
        now: OffsetDateTime,
    ) -> Result<&AgentIntervention, LedgerError> {
        let idx = self.index_of(id)?;
        self.require(idx, RemediationStatus::Pending, RemediationStatus::Applied)?;

        let (status, result) = match executor.execute(&self.interventions[idx]) {
            Ok(msg) => (RemediationStatus::Applied, msg),
            Err(msg) => (RemediationStatus::Failed, msg),
        };
        let intervention = &mut self.interventions[idx];
        intervention.status = status;
        intervention.result = Some(result);
        intervention.approval = Some(Approval {
            by: principal.to_string(),
            at: now,
        });
        tracing::info!(id, %status, by = principal, "intervention approved");
        Ok(intervention)
    }

    /// Reject a pending intervention. `result` is left as it was.
    pub fn reject(&mut self, id: &str, principal: &str) -> Result<&AgentIntervention, LedgerError> {
        self.reject_at(id, principal, OffsetDateTime::now_utc())
    }

    pub fn reject_at(
        &mut self,
        id: &str,
        principal: &str,
        now: OffsetDateTime,
    ) -> Result<&AgentIntervention, LedgerError> {
        let idx = self.index_of(id)?;
        self.require(idx, RemediationStatus::Pending, RemediationStatus::Rejected)?;

        let intervention = &mut self.interventions[idx];
        intervention.status = RemediationStatus::Rejected;
        intervention.approval = Some(Approval {
            by: principal.to_string(),
            at: now,
        });
        tracing::info!(id, by = principal, "intervention rejected");
        Ok(intervention)
    }

    /// Record that an operator fixed the issue by hand. Valid from any status.
    pub fn mark_manually_fixed(
        &mut self,
        id: &str,
        principal: &str,
    ) -> Result<&AgentIntervention, LedgerError> {
        self.mark_manually_fixed_at(id, principal, OffsetDateTime::now_utc())
    }

    pub fn mark_manually_fixed_at(
        &mut self,
        id: &str,
        principal: &str,
        now: OffsetDateTime,
    ) -> Result<&AgentIntervention, LedgerError> {
        let idx = self.index_of(id)?;
        let intervention = &mut self.interventions[idx];
        let from = intervention.status;
        intervention.status = RemediationStatus::Applied;
        intervention.result = Some(MANUAL_FIX_RESULT.to_string());
        intervention.approval = Some(Approval {
            by: principal.to_string(),
            at: now,
        });
        tracing::info!(id, %from, by = principal, "intervention marked manually fixed");
        Ok(intervention)
    }

    fn index_of(&self, id: &str) -> Result<usize, LedgerError> {
        self.interventions
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    /// Review operations start from `expected` and must be a legal move to `to`.
    fn require(
        &self,
        idx: usize,
        expected: RemediationStatus,
        to: RemediationStatus,
    ) -> Result<(), LedgerError> {
        let current = &self.interventions[idx];
        if current.status != expected || !current.status.can_transition_to(to) {
            return Err(LedgerError::InvalidTransition {
                id: current.id.clone(),
                from: current.status,
                to,
            });
        }
        Ok(())
    }
}
