use serde::{Deserialize, Serialize};

/// Gossiper pool parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GossiperPoolConfig {
    /// Smallest `required_k` a channel may ask for.
    #[serde(default = "default_min_k")]
    pub min_k_gossipers: usize,

    /// Minimum stake backing each slot.
    #[serde(default = "default_min_stake")]
    pub min_stake_per_slot: u64,

    #[serde(default = "default_min_slots")]
    pub min_slots_per_gossiper: u32,

    #[serde(default = "default_max_slots")]
    pub max_slots_per_gossiper: u32,
}

fn default_min_k() -> usize {
    2
}
fn default_min_stake() -> u64 {
    10
}
fn default_min_slots() -> u32 {
    1
}
fn default_max_slots() -> u32 {
    32
}

impl Default for GossiperPoolConfig {
    fn default() -> Self {
        Self {
            min_k_gossipers: default_min_k(),
            min_stake_per_slot: default_min_stake(),
            min_slots_per_gossiper: default_min_slots(),
            max_slots_per_gossiper: default_max_slots(),
        }
    }
}
