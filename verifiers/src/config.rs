use serde::{Deserialize, Serialize};

/// Verifier pool parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierPoolConfig {
    #[serde(default = "default_min_k")]
    pub min_k_verifiers: usize,

    #[serde(default = "default_min_stake")]
    pub min_stake_per_slot: u64,

    #[serde(default = "default_max_slots")]
    pub max_slots_per_verifier: u32,

    /// Length of the commit window, in seconds.
    #[serde(default = "default_timeout")]
    pub commit_timeout_secs: u64,

    /// Length of the reveal window, in seconds.
    #[serde(default = "default_timeout")]
    pub reveal_timeout_secs: u64,

    /// When set, a challenge is only verified if every reserved verifier
    /// revealed, even if the votes-for already form a majority.
    #[serde(default = "default_true")]
    pub require_full_participation: bool,
}

fn default_min_k() -> usize {
    3
}
fn default_min_stake() -> u64 {
    10
}
fn default_max_slots() -> u32 {
    32
}
fn default_timeout() -> u64 {
    10
}
fn default_true() -> bool {
    true
}

impl Default for VerifierPoolConfig {
    fn default() -> Self {
        Self {
            min_k_verifiers: default_min_k(),
            min_stake_per_slot: default_min_stake(),
            max_slots_per_verifier: default_max_slots(),
            commit_timeout_secs: default_timeout(),
            reveal_timeout_secs: default_timeout(),
            require_full_participation: default_true(),
        }
    }
}
