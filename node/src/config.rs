//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};

use attest_gossipers::GossiperPoolConfig;
use attest_types::ActorId;
use attest_verifiers::VerifierPoolConfig;

use crate::logging::LogFormat;
use crate::NodeError;

/// Labels the node derives its component accounts from.
///
/// Component accounts never sign anything, so each one is the Blake2b-256
/// hash of its label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsConfig {
    #[serde(default = "default_vault_label")]
    pub vault: String,
    #[serde(default = "default_registry_label")]
    pub registry: String,
    #[serde(default = "default_gossiper_pool_label")]
    pub gossiper_pool: String,
    #[serde(default = "default_verifier_pool_label")]
    pub verifier_pool: String,
    /// Accounts allowed to open channels and challenges.
    #[serde(default = "default_requesters")]
    pub requesters: Vec<String>,
}

impl AccountsConfig {
    pub fn account_id(label: &str) -> ActorId {
        ActorId::new(attest_crypto::blake2b_256_multi(&[
            b"attest/account",
            label.as_bytes(),
        ]))
    }
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            vault: default_vault_label(),
            registry: default_registry_label(),
            gossiper_pool: default_gossiper_pool_label(),
            verifier_pool: default_verifier_pool_label(),
            requesters: default_requesters(),
        }
    }
}

/// Configuration for an attest node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub enable_metrics: bool,

    /// How often the node looks for challenges whose wall time ran out
    /// before their vote started.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Audit events the node keeps in memory. The oldest are dropped first;
    /// metrics still count every event.
    #[serde(default = "default_audit_log_capacity")]
    pub audit_log_capacity: usize,

    #[serde(default)]
    pub accounts: AccountsConfig,

    #[serde(default)]
    pub gossipers: GossiperPoolConfig,

    #[serde(default)]
    pub verifiers: VerifierPoolConfig,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sweep_interval() -> u64 {
    5
}

fn default_audit_log_capacity() -> usize {
    10_000
}

fn default_vault_label() -> String {
    "vault".to_string()
}

fn default_registry_label() -> String {
    "registry".to_string()
}

fn default_gossiper_pool_label() -> String {
    "gossiper-pool".to_string()
}

fn default_verifier_pool_label() -> String {
    "verifier-pool".to_string()
}

fn default_requesters() -> Vec<String> {
    vec!["orchestrator".to_string()]
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject settings no pool could run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.gossipers.min_k_gossipers == 0 {
            return Err(NodeError::Config("gossipers.min_k_gossipers must be at least 1".into()));
        }
        if self.gossipers.min_slots_per_gossiper > self.gossipers.max_slots_per_gossiper {
            return Err(NodeError::Config(
                "gossipers.min_slots_per_gossiper exceeds max_slots_per_gossiper".into(),
            ));
        }
        if self.verifiers.min_k_verifiers == 0 {
            return Err(NodeError::Config("verifiers.min_k_verifiers must be at least 1".into()));
        }
        if self.verifiers.commit_timeout_secs == 0 || self.verifiers.reveal_timeout_secs == 0 {
            return Err(NodeError::Config("verifier timeouts must be non-zero".into()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(NodeError::Config("sweep_interval_secs must be non-zero".into()));
        }
        if self.audit_log_capacity == 0 {
            return Err(NodeError::Config("audit_log_capacity must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            enable_metrics: false,
            sweep_interval_secs: default_sweep_interval(),
            audit_log_capacity: default_audit_log_capacity(),
            accounts: AccountsConfig::default(),
            gossipers: GossiperPoolConfig::default(),
            verifiers: VerifierPoolConfig::default(),
        }
    }
}
