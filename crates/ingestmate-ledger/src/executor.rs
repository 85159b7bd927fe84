use ingestmate_core::AgentIntervention;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Carries out an approved remediation. `Ok` holds the success message, `Err` the failure message.
pub trait RemediationExecutor {
    fn execute(&mut self, intervention: &AgentIntervention) -> Result<String, String>;
}

/// Default fraction of simulated executions that succeed.
pub const DEFAULT_SUCCESS_RATE: f64 = 0.90;

/// Stand-in for real infrastructure: succeeds with a fixed probability.
pub struct SimulatedExecutor {
    success_rate: f64,
    source: Source,
}

enum Source {
    /// Outcome is a function of the seed and the intervention id.
    Seeded(u64),
    Entropy(StdRng),
}

impl SimulatedExecutor {
    /// Reproducible outcomes for a given seed, drawn independently per intervention.
    pub fn seeded(seed: u64, success_rate: f64) -> Self {
        Self {
            success_rate: probability(success_rate),
            source: Source::Seeded(seed),
        }
    }

    pub fn from_entropy(success_rate: f64) -> Self {
        Self {
            success_rate: probability(success_rate),
            source: Source::Entropy(StdRng::from_entropy()),
        }
    }
}

fn intervention_seed(seed: u64, id: &str) -> u64 {
    let hash = blake3::hash(id.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    seed ^ u64::from_le_bytes(prefix)
}

fn probability(rate: f64) -> f64 {
    if rate.is_nan() {
        0.0
    } else {
        rate.clamp(0.0, 1.0)
    }
}

impl RemediationExecutor for SimulatedExecutor {
    fn execute(&mut self, intervention: &AgentIntervention) -> Result<String, String> {
        let ok = match &mut self.source {
            Source::Seeded(seed) => {
                StdRng::seed_from_u64(intervention_seed(*seed, &intervention.id))
                    .gen_bool(self.success_rate)
            }
            Source::Entropy(rng) => rng.gen_bool(self.success_rate),
        };
        tracing::debug!(id = %intervention.id, ok, "simulated remediation");
        if ok {
            Ok("Successfully applied remediation".to_string())
        } else {
            Err("Failed to apply remediation".to_string())
        }
    }
}
