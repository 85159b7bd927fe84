pub mod config;
pub mod executor;
pub mod ledger;
pub mod lock;
pub mod paths;
pub mod rules;
pub mod store;

pub use config::{ConfigError, MonitorConfig};
pub use executor::{RemediationExecutor, SimulatedExecutor, DEFAULT_SUCCESS_RATE};
pub use ledger::{InterventionLedger, LedgerError, MANUAL_FIX_RESULT};
pub use lock::WorkspaceLock;
pub use paths::{write_atomic, WorkspacePaths};
pub use store::LedgerStore;
