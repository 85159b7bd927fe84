pub mod agents;
pub mod detection;
pub mod engine;
pub mod metrics;
pub mod schema_diff;
pub mod telemetry;
pub mod types;

pub use agents::{catalog, detect_all, Agent, JobAgent, LatencyAgent, SchemaAgent};
pub use detection::{DetectionPayload, DetectionResult, RemediationResult};
pub use engine::RemediationEngine;
pub use metrics::SystemMetrics;
pub use telemetry::{TelemetryError, TelemetrySnapshot};
pub use types::*;
