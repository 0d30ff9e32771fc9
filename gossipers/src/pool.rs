//! Channel lifecycle: open, collect proofs, validate, terminate.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use attest_registry::{ActorRegistry, RegistryError};
use attest_stake::SlashMode;
use attest_store::{EventLog, InsertError, KeyedStore};
use attest_types::{ActorId, AuditEvent, ChannelId, Digest, ProofId, Signature, StakeId, Timestamp};
use parking_lot::RwLock;

use crate::channel::{Channel, SignedProof};
use crate::config::GossiperPoolConfig;
use crate::error::GossiperError;
use crate::proof::proof_message;
use crate::verifier::ProofVerifier;

pub struct GossiperPool {
    account: ActorId,
    stake_id: StakeId,
    config: GossiperPoolConfig,
    registry: Arc<ActorRegistry>,
    verifier: Arc<dyn ProofVerifier>,
    channels: KeyedStore<ChannelId, Channel>,
    requesters: RwLock<HashSet<ActorId>>,
    events: Arc<dyn EventLog>,
}

impl GossiperPool {
    /// `account` is the pool's identity towards the registry, which must
    /// have authorized it. Gossiper stake lives under
    /// `StakeId::for_pool(account)`.
    pub fn new(
        account: ActorId,
        config: GossiperPoolConfig,
        registry: Arc<ActorRegistry>,
        verifier: Arc<dyn ProofVerifier>,
        events: Arc<dyn EventLog>,
    ) -> Self {
        Self {
            account,
            stake_id: StakeId::for_pool(&account),
            config,
            registry,
            verifier,
            channels: KeyedStore::new(),
            requesters: RwLock::new(HashSet::new()),
            events,
        }
    }

    pub fn account(&self) -> ActorId {
        self.account
    }

    pub fn stake_id(&self) -> StakeId {
        self.stake_id
    }

    pub fn config(&self) -> &GossiperPoolConfig {
        &self.config
    }

    /// Allow `requester` to open channels.
    pub fn authorize_requester(&self, requester: ActorId) {
        if self.requesters.write().insert(requester) {
            tracing::info!(requester = %requester, "gossiper pool requester authorized");
        }
    }

    // ── Gossiper membership ─────────────────────────────────────────────

    /// Stake `slots * amount_per_slot` for `actor` and register it as a
    /// gossiper. The actor must have approved the vault beforehand.
    pub fn register_gossiper(
        &self,
        actor: ActorId,
        amount_per_slot: u128,
        slots: u32,
        now: Timestamp,
    ) -> Result<(), GossiperError> {
        let minimum = u128::from(self.config.min_stake_per_slot);
        if amount_per_slot < minimum {
            return Err(GossiperError::StakeTooLow {
                amount_per_slot,
                minimum,
            });
        }
        if slots < self.config.min_slots_per_gossiper {
            return Err(GossiperError::TooFewSlots {
                slots,
                minimum: self.config.min_slots_per_gossiper,
            });
        }
        if slots > self.config.max_slots_per_gossiper {
            return Err(GossiperError::TooManySlots {
                slots,
                maximum: self.config.max_slots_per_gossiper,
            });
        }
        self.registry
            .register(&self.account, actor, slots, self.stake_id, amount_per_slot, now)?;
        Ok(())
    }

    /// Leave the pool and get the remaining stake back. Fails with
    /// `SlotsInUse` while the gossiper is reserved by an open channel.
    pub fn deregister_gossiper(&self, actor: ActorId) -> Result<u128, GossiperError> {
        Ok(self
            .registry
            .deregister(&self.account, actor, self.stake_id)?)
    }

    pub fn is_registered_gossiper(&self, actor: &ActorId) -> bool {
        self.registry.is_registered(self.stake_id, actor)
    }

    pub fn get_available_gossipers(&self) -> Vec<ActorId> {
        self.registry.get_available_registrants(self.stake_id)
    }

    // ── Channels ────────────────────────────────────────────────────────

    /// Open a channel and reserve `required_k` gossipers for it.
    ///
    /// Gossipers are drawn from the available set by a hash ranking seeded
    /// with the channel id. Returns the channel's proof id.
    pub fn init_channel(
        &self,
        caller: &ActorId,
        channel_id: ChannelId,
        required_k: usize,
        threshold_m: usize,
        owner: ActorId,
        now: Timestamp,
    ) -> Result<ProofId, GossiperError> {
        if !self.requesters.read().contains(caller) {
            return Err(GossiperError::Unauthorized(*caller));
        }
        if required_k < self.config.min_k_gossipers || threshold_m == 0 || threshold_m > required_k
        {
            return Err(GossiperError::InvalidThreshold {
                required_k,
                threshold_m,
                min_k: self.config.min_k_gossipers,
            });
        }

        let proof_id = ProofId::for_channel(&channel_id, &owner);
        let record = self
            .channels
            .insert_with(channel_id, || {
                let reserved = self
                    .registry
                    .reserve_selected(&self.account, self.stake_id, required_k, channel_id.as_bytes())
                    .map_err(|e| match e {
                        RegistryError::InsufficientRegistrants { needed, available } => {
                            GossiperError::InsufficientGossipers { needed, available }
                        }
                        other => GossiperError::Registry(other),
                    })?;
                Ok(Channel {
                    id: channel_id,
                    proof_id,
                    required_k,
                    threshold_m,
                    owner,
                    reserved,
                    proofs: BTreeMap::new(),
                    validated: false,
                    agreed: None,
                    terminated: false,
                    created_at: now,
                })
            })
            .map_err(|e| match e {
                InsertError::Duplicate => GossiperError::AlreadyExists(channel_id),
                InsertError::Init(e) => e,
            })?;
        let gossipers = record.lock().reserved.clone();

        tracing::info!(
            channel = %channel_id,
            proof_id = %proof_id,
            owner = %owner,
            required_k,
            threshold_m,
            "channel initialized"
        );
        self.events.append(AuditEvent::ChannelInitialized {
            channel_id,
            proof_id,
            owner,
            gossipers,
        });
        Ok(proof_id)
    }

    /// Accept a signed proof from a gossiper reserved for the channel.
    ///
    /// The signature must cover
    /// `proof_message(channel_id, merkle_root, end_of_training, result_digest)`.
    pub fn submit_proof(
        &self,
        sender: ActorId,
        channel_id: ChannelId,
        end_of_training: &str,
        merkle_root: Vec<Digest>,
        signature: Signature,
        result_digest: Digest,
    ) -> Result<(), GossiperError> {
        if merkle_root.is_empty() {
            return Err(GossiperError::EmptyMerkleRoot);
        }
        self.with_channel(channel_id, |channel| {
            if channel.terminated {
                return Err(GossiperError::ChannelTerminated(channel_id));
            }
            if !channel.is_reserved(&sender) || !self.is_registered_gossiper(&sender) {
                return Err(GossiperError::Unauthorized(sender));
            }
            if channel.proofs.contains_key(&sender) {
                return Err(GossiperError::AlreadySubmitted(sender));
            }
            let message = proof_message(&channel_id, &merkle_root, end_of_training, &result_digest);
            if !self
                .verifier
                .verify(&sender, message.as_bytes(), &signature)
            {
                return Err(GossiperError::InvalidSignature(sender));
            }
            channel.proofs.insert(
                sender,
                SignedProof {
                    end_of_training: end_of_training.to_string(),
                    merkle_root,
                    result_digest,
                    signature,
                },
            );
            Ok(())
        })?;

        tracing::debug!(channel = %channel_id, gossiper = %sender, "proof submitted");
        self.events.append(AuditEvent::ProofSubmitted {
            channel_id,
            gossiper: sender,
        });
        Ok(())
    }

    /// Mark the channel validated once `threshold_m` proofs agree on
    /// `(merkle_root, end_of_training, result_digest)` and no other content
    /// has as many. Safe to call again as proofs arrive; a validated channel
    /// stays validated.
    pub fn validate_proof(&self, channel_id: ChannelId) -> Result<bool, GossiperError> {
        let (validated, matching) = self.with_channel(channel_id, |channel| {
            if channel.validated {
                let matching = channel.agreeing().len();
                return Ok((true, matching));
            }
            let (leader, matching) = channel.leading_proof();
            if let Some(key) = leader.filter(|_| matching >= channel.threshold_m) {
                channel.validated = true;
                channel.agreed = Some(key);
            }
            Ok((channel.validated, matching))
        })?;

        tracing::info!(channel = %channel_id, validated, matching, "proof validation");
        self.events.append(AuditEvent::ProofValidated {
            channel_id,
            validated,
            matching,
        });
        Ok(validated)
    }

    /// Close a validated channel: slash the gossipers that stayed silent or
    /// disagreed with the agreed proof, then return every reserved slot.
    /// Each dissenter loses one slot's stake, shared among the agreeing
    /// gossipers. A failed slash leaves the channel open.
    ///
    /// Only the channel owner may terminate, and only once.
    pub fn terminate_channel(
        &self,
        caller: &ActorId,
        channel_id: ChannelId,
    ) -> Result<Vec<ActorId>, GossiperError> {
        let (owner, slashed) = self.with_channel(channel_id, |channel| {
            if channel.owner != *caller {
                return Err(GossiperError::Unauthorized(*caller));
            }
            if channel.terminated {
                return Err(GossiperError::ChannelTerminated(channel_id));
            }
            if !channel.validated {
                return Err(GossiperError::NotValidated(channel_id));
            }
            // Dissenters still hold their reserved slot, so none of them can
            // deregister before the penalty lands.
            let mode = SlashMode::Redistribute(channel.agreeing());
            let mut slashed = Vec::new();
            for gossiper in channel.dissenting() {
                if self
                    .registry
                    .slash_slot(&self.account, self.stake_id, gossiper, &mode)?
                    .is_some()
                {
                    slashed.push(gossiper);
                }
            }
            self.registry
                .release_reservation(&self.account, self.stake_id, &channel.reserved)?;
            channel.terminated = true;
            Ok((channel.owner, slashed))
        })?;

        tracing::info!(
            channel = %channel_id,
            owner = %owner,
            slashed = slashed.len(),
            "channel terminated"
        );
        self.events.append(AuditEvent::ChannelTerminated {
            channel_id,
            owner,
            slashed: slashed.clone(),
        });
        Ok(slashed)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Whether the channel is validated. Unknown channels are not.
    pub fn is_valid_proof(&self, channel_id: &ChannelId) -> bool {
        self.channels
            .with(channel_id, |c| c.validated)
            .unwrap_or(false)
    }

    pub fn is_channel_terminated(&self, channel_id: &ChannelId) -> bool {
        self.channels
            .with(channel_id, |c| c.terminated)
            .unwrap_or(false)
    }

    pub fn get_proof_id_by_channel_id(&self, channel_id: &ChannelId) -> Option<ProofId> {
        self.channels.with(channel_id, |c| c.proof_id)
    }

    pub fn channel(&self, channel_id: &ChannelId) -> Option<Channel> {
        self.channels.snapshot(channel_id)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn with_channel<R>(
        &self,
        channel_id: ChannelId,
        f: impl FnOnce(&mut Channel) -> Result<R, GossiperError>,
    ) -> Result<R, GossiperError> {
        self.channels
            .with(&channel_id, f)
            .unwrap_or(Err(GossiperError::ChannelNotFound(channel_id)))
    }
}
