//! The attest node: wires the vault, registry, commit-reveal engine and both
//! pools together and runs their background upkeep.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use attest_commit_reveal::CommitRevealEngine;
use attest_gossipers::{GossiperPool, ProofVerifier};
use attest_registry::ActorRegistry;
use attest_stake::{StakeVault, TokenLedger};
use attest_store::{EventLog, MemoryEventLog};
use attest_types::{ActorId, AuditEvent, ChallengeId, Clock, Timestamp};
use attest_verifiers::VerifierPool;

use crate::config::{AccountsConfig, NodeConfig};
use crate::error::NodeError;
use crate::metrics::{MetricsEventLog, NodeMetrics};
use crate::shutdown::ShutdownController;

/// Component accounts derived from [`AccountsConfig`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeAccounts {
    pub vault: ActorId,
    pub registry: ActorId,
    pub gossiper_pool: ActorId,
    pub verifier_pool: ActorId,
    pub requesters: Vec<ActorId>,
}

impl From<&AccountsConfig> for NodeAccounts {
    fn from(config: &AccountsConfig) -> Self {
        Self {
            vault: AccountsConfig::account_id(&config.vault),
            registry: AccountsConfig::account_id(&config.registry),
            gossiper_pool: AccountsConfig::account_id(&config.gossiper_pool),
            verifier_pool: AccountsConfig::account_id(&config.verifier_pool),
            requesters: config
                .requesters
                .iter()
                .map(|label| AccountsConfig::account_id(label))
                .collect(),
        }
    }
}

pub struct AttestNode {
    config: NodeConfig,
    accounts: NodeAccounts,
    clock: Arc<dyn Clock>,
    ledger: Arc<dyn TokenLedger>,
    audit: Arc<MemoryEventLog>,
    metrics: Arc<NodeMetrics>,
    vault: Arc<StakeVault>,
    registry: Arc<ActorRegistry>,
    engine: Arc<CommitRevealEngine>,
    gossipers: Arc<GossiperPool>,
    verifiers: Arc<VerifierPool>,
    shutdown: ShutdownController,
    task_handles: Vec<JoinHandle<()>>,
}

impl AttestNode {
    /// Build every component and set up the authorization chain:
    /// vault → registry → pools → configured requesters.
    pub fn new(
        config: NodeConfig,
        ledger: Arc<dyn TokenLedger>,
        clock: Arc<dyn Clock>,
        proof_verifier: Arc<dyn ProofVerifier>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let accounts = NodeAccounts::from(&config.accounts);

        let audit = Arc::new(MemoryEventLog::bounded(config.audit_log_capacity));
        let metrics = Arc::new(NodeMetrics::new()?);
        let events: Arc<dyn EventLog> = if config.enable_metrics {
            Arc::new(MetricsEventLog::new(metrics.clone(), audit.clone()))
        } else {
            audit.clone()
        };

        let vault = Arc::new(StakeVault::new(ledger.clone(), accounts.vault, events.clone()));
        vault.authorize(accounts.registry);
        let registry = Arc::new(ActorRegistry::new(
            vault.clone(),
            accounts.registry,
            events.clone(),
        ));
        registry.authorize(accounts.gossiper_pool);
        registry.authorize(accounts.verifier_pool);

        let engine = Arc::new(CommitRevealEngine::new(events.clone()));
        let gossipers = Arc::new(GossiperPool::new(
            accounts.gossiper_pool,
            config.gossipers.clone(),
            registry.clone(),
            proof_verifier,
            events.clone(),
        ));
        let verifiers = Arc::new(VerifierPool::new(
            accounts.verifier_pool,
            config.verifiers.clone(),
            registry.clone(),
            engine.clone(),
            events,
        ));
        for requester in &accounts.requesters {
            gossipers.authorize_requester(*requester);
            verifiers.authorize_requester(*requester);
        }

        tracing::info!(
            vault = %accounts.vault,
            gossiper_pool = %accounts.gossiper_pool,
            verifier_pool = %accounts.verifier_pool,
            requesters = accounts.requesters.len(),
            metrics = config.enable_metrics,
            "attest node assembled"
        );

        Ok(Self {
            config,
            accounts,
            clock,
            ledger,
            audit,
            metrics,
            vault,
            registry,
            engine,
            gossipers,
            verifiers,
            shutdown: ShutdownController::new(),
            task_handles: Vec::new(),
        })
    }

    /// Spawn the background tasks. Must be called inside a tokio runtime.
    pub fn start(&mut self) {
        let verifiers = Arc::clone(&self.verifiers);
        let clock = Arc::clone(&self.clock);
        let period = Duration::from_secs(self.config.sweep_interval_secs);
        let mut shutdown_rx = self.shutdown.subscribe();

        let sweep_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        tracing::info!("challenge sweeper shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        sweep_stale_challenges(&verifiers, clock.now());
                    }
                }
            }
        });
        self.task_handles.push(sweep_handle);
        tracing::info!(interval_secs = period.as_secs(), "attest node started");
    }

    /// Signal every task and wait for it to finish.
    pub async fn stop(&mut self) {
        tracing::info!("attest node stopping");
        self.shutdown.shutdown();
        for handle in self.task_handles.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "background task ended abnormally");
            }
        }
        tracing::info!(events = self.audit.len(), "attest node stopped");
    }

    /// Expire every challenge whose wall time ran out before its vote
    /// started. Returns the expired ids.
    pub fn expire_stale_challenges(&self) -> Vec<ChallengeId> {
        sweep_stale_challenges(&self.verifiers, self.clock.now())
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn accounts(&self) -> &NodeAccounts {
        &self.accounts
    }

    pub fn ledger(&self) -> &Arc<dyn TokenLedger> {
        &self.ledger
    }

    pub fn vault(&self) -> &Arc<StakeVault> {
        &self.vault
    }

    pub fn registry(&self) -> &Arc<ActorRegistry> {
        &self.registry
    }

    pub fn engine(&self) -> &Arc<CommitRevealEngine> {
        &self.engine
    }

    pub fn gossipers(&self) -> &Arc<GossiperPool> {
        &self.gossipers
    }

    pub fn verifiers(&self) -> &Arc<VerifierPool> {
        &self.verifiers
    }

    pub fn metrics(&self) -> &Arc<NodeMetrics> {
        &self.metrics
    }

    /// The audit events still held, oldest first. At most
    /// `audit_log_capacity` of them.
    pub fn audit_log(&self) -> Vec<AuditEvent> {
        self.audit.events()
    }
}

fn sweep_stale_challenges(verifiers: &VerifierPool, now: Timestamp) -> Vec<ChallengeId> {
    let mut expired = Vec::new();
    for challenge_id in verifiers.stale_challenges(now) {
        match verifiers.expire_challenge(challenge_id, now) {
            Ok(()) => expired.push(challenge_id),
            // A verifier may have started the vote since the scan.
            Err(e) => tracing::debug!(challenge = %challenge_id, error = %e, "skipped expiry"),
        }
    }
    if !expired.is_empty() {
        tracing::info!(count = expired.len(), "expired stale challenges");
    }
    expired
}
