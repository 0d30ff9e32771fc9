//! Prometheus metrics for the attest node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`]. [`MetricsEventLog`] sits in
//! front of the audit log and turns every audit event into counter updates,
//! so components never touch metrics directly.

use std::sync::Arc;

use attest_store::EventLog;
use attest_types::{AuditEvent, StakeEventKind};
use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry, Encoder,
    IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Central collection of node-level Prometheus metrics.
pub struct NodeMetrics {
    pub registry: Registry,

    /// Audit events by outcome string.
    pub events: IntCounterVec,
    /// Stake movements in token units, by kind.
    pub stake_volume: IntCounterVec,
    /// Actors slashed by a pool.
    pub slashes: IntCounter,
    /// Validation calls that found their channel validated.
    pub channels_validated: IntCounter,
    pub challenges_verified: IntCounter,
    pub challenges_rejected: IntCounter,
}

impl NodeMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let events = register_int_counter_vec_with_registry!(
            Opts::new("attest_events_total", "Audit events by outcome"),
            &["outcome"],
            registry
        )?;
        let stake_volume = register_int_counter_vec_with_registry!(
            Opts::new("attest_stake_volume_total", "Token units moved by the vault"),
            &["kind"],
            registry
        )?;
        let slashes = register_int_counter_with_registry!(
            Opts::new("attest_slashes_total", "Actors slashed by a pool"),
            registry
        )?;
        let channels_validated = register_int_counter_with_registry!(
            Opts::new(
                "attest_channel_validations_total",
                "Proof validations that found the channel validated"
            ),
            registry
        )?;
        let challenges_verified = register_int_counter_with_registry!(
            Opts::new("attest_challenges_verified_total", "Challenges resolved as verified"),
            registry
        )?;
        let challenges_rejected = register_int_counter_with_registry!(
            Opts::new("attest_challenges_rejected_total", "Challenges resolved as rejected"),
            registry
        )?;

        Ok(Self {
            registry,
            events,
            stake_volume,
            slashes,
            channels_validated,
            challenges_verified,
            challenges_rejected,
        })
    }

    /// Update counters for one audit event.
    pub fn observe(&self, event: &AuditEvent) {
        self.events.with_label_values(&[event.outcome()]).inc();
        match event {
            AuditEvent::Stake { amount, kind, .. } => {
                let amount = u64::try_from(*amount).unwrap_or(u64::MAX);
                self.stake_volume
                    .with_label_values(&[kind.as_str()])
                    .inc_by(amount);
                if *kind == StakeEventKind::Slashed {
                    self.slashes.inc();
                }
            }
            AuditEvent::ProofValidated {
                validated: true, ..
            } => self.channels_validated.inc(),
            AuditEvent::ChallengeResolved { verified: true, .. } => {
                self.challenges_verified.inc()
            }
            AuditEvent::ChallengeResolved { verified: false, .. } => {
                self.challenges_rejected.inc()
            }
            _ => {}
        }
    }

    /// Encode every metric in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Event sink that updates [`NodeMetrics`] and forwards to an inner log.
pub struct MetricsEventLog {
    metrics: Arc<NodeMetrics>,
    inner: Arc<dyn EventLog>,
}

impl MetricsEventLog {
    pub fn new(metrics: Arc<NodeMetrics>, inner: Arc<dyn EventLog>) -> Self {
        Self { metrics, inner }
    }
}

impl EventLog for MetricsEventLog {
    fn append(&self, event: AuditEvent) {
        self.metrics.observe(&event);
        self.inner.append(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_store::MemoryEventLog;
    use attest_types::{ActorId, ChallengeId, StakeId};

    #[test]
    fn forwards_and_counts() {
        let metrics = Arc::new(NodeMetrics::new().unwrap());
        let inner = Arc::new(MemoryEventLog::new());
        let log = MetricsEventLog::new(metrics.clone(), inner.clone());

        log.append(AuditEvent::Stake {
            stake_id: StakeId::from_label("pool"),
            actor: ActorId::new([1; 32]),
            amount: 40,
            kind: StakeEventKind::Slashed,
        });
        log.append(AuditEvent::ChallengeResolved {
            challenge_id: ChallengeId::from_label("c"),
            verified: false,
            slashed: vec![ActorId::new([1; 32])],
        });

        assert_eq!(inner.len(), 2);
        assert_eq!(metrics.slashes.get(), 1);
        assert_eq!(metrics.challenges_rejected.get(), 1);
        assert_eq!(
            metrics.stake_volume.with_label_values(&["slashed"]).get(),
            40
        );
        let text = metrics.encode().unwrap();
        assert!(text.contains("attest_challenges_rejected_total 1"));
    }
}
