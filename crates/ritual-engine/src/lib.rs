//! Drives one ritual through `AWAITING_TRANSCRIPTS -> AWAITING_AGGREGATIONS
//! -> FINALIZED`, reacting to `StartRitual`/`StartAggregationRound` events
//! delivered by an out-of-scope `RitualTracker`, and serves decryption
//! share derivation once a ritual is finalized.

mod retry;

use condition_lingo::{Context as ConditionContext, LingoElement};
use dashmap::DashMap;
use primitive_adapter::{DkgKeypair, DkgPublicKey, Participant};
use ritual_store::RitualStore;
use std::collections::HashMap;
use std::sync::Arc;
use threshold_core::{CoordinatorContract, OperatorAddr, RitualStatus};
use threshold_errors::{NodeError, Result};
use tokio::sync::Mutex;

/// Everything the engine needs to know about participants beyond their
/// address and ordinal position, which live on `Ritual` itself.
#[derive(Clone)]
pub struct ValidatorKeys(Arc<HashMap<OperatorAddr, DkgPublicKey>>);

impl ValidatorKeys {
    pub fn new(keys: HashMap<OperatorAddr, DkgPublicKey>) -> Self {
        Self(Arc::new(keys))
    }

    fn resolve(&self, nodes: &[OperatorAddr], ritual_id: u32) -> Result<Vec<Participant>> {
        nodes
            .iter()
            .map(|addr| {
                self.0
                    .get(addr)
                    .cloned()
                    .map(|public_key| Participant { address: addr.clone(), public_key })
                    .ok_or_else(|| NodeError::InvalidRitualState {
                        ritual_id,
                        reason: format!("no announced DKG key for {addr}"),
                    })
            })
            .collect()
    }
}

pub struct RitualEngine<C: CoordinatorContract> {
    coordinator: Arc<C>,
    store: Arc<RitualStore>,
    validator_keys: ValidatorKeys,
    me: OperatorAddr,
    my_keypair: DkgKeypair,
    locks: DashMap<u32, Arc<Mutex<()>>>,
}

impl<C: CoordinatorContract> RitualEngine<C> {
    pub fn new(
        coordinator: Arc<C>,
        store: Arc<RitualStore>,
        validator_keys: ValidatorKeys,
        me: OperatorAddr,
        my_keypair: DkgKeypair,
    ) -> Self {
        Self { coordinator, store, validator_keys, me, my_keypair, locks: DashMap::new() }
    }

    fn lock_for(&self, ritual_id: u32) -> Arc<Mutex<()>> {
        self.locks.entry(ritual_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Enter on `StartRitual(ritual_id, _)`.
    pub async fn handle_start_ritual(&self, ritual_id: u32) -> Result<()> {
        let lock = self.lock_for(ritual_id);
        let _guard = lock.lock().await;

        let ritual = self.coordinator.get_ritual(ritual_id).await?;
        if ritual.status != RitualStatus::AwaitingTranscripts {
            return Err(NodeError::InvalidRitualState {
                ritual_id,
                reason: format!("expected AwaitingTranscripts, got {:?}", ritual.status),
            });
        }
        let my_index = ritual.node_index(&self.me).ok_or_else(|| NodeError::InvalidRitualState {
            ritual_id,
            reason: "this node is not a participant in the ritual".into(),
        })?;
        if ritual.has_posted_transcript(&self.me) {
            tracing::debug!(ritual_id, "transcript already posted, ignoring duplicate event");
            return Ok(());
        }

        let participants = self.validator_keys.resolve(&ritual.nodes, ritual_id)?;
        let transcript = primitive_adapter::generate_transcript(
            &participants,
            ritual.threshold,
            ritual.shares,
            my_index,
            ritual_id,
            &self.my_keypair,
        )?;
        self.store.set_transcript(ritual_id, transcript.clone());

        let my_index = my_index as u32;
        let coordinator = self.coordinator.clone();
        retry::with_backoff("post_transcript", || {
            let coordinator = coordinator.clone();
            let transcript = transcript.clone();
            async move { coordinator.post_transcript(ritual_id, my_index, &transcript).await.map(|_| ()) }
        })
        .await
    }

    /// Enter on `StartAggregationRound(ritual_id, _)`.
    pub async fn handle_start_aggregation_round(&self, ritual_id: u32) -> Result<()> {
        let lock = self.lock_for(ritual_id);
        let _guard = lock.lock().await;

        if self.store.has_posted_aggregation(ritual_id) {
            tracing::debug!(ritual_id, "aggregation already posted, ignoring duplicate event");
            return Ok(());
        }

        let ritual = self.coordinator.get_ritual(ritual_id).await?;
        if ritual.status != RitualStatus::AwaitingAggregations {
            return Err(NodeError::InvalidRitualState {
                ritual_id,
                reason: format!("expected AwaitingAggregations, got {:?}", ritual.status),
            });
        }
        let my_index = ritual.node_index(&self.me).ok_or_else(|| NodeError::InvalidRitualState {
            ritual_id,
            reason: "this node is not a participant in the ritual".into(),
        })?;

        let transcripts: Vec<Vec<u8>> = ritual
            .transcripts
            .iter()
            .cloned()
            .collect::<Option<Vec<_>>>()
            .ok_or(NodeError::MissingTranscripts(ritual_id))?;

        let participants = self.validator_keys.resolve(&ritual.nodes, ritual_id)?;
        let (aggregated, public_key, generator_inverse) = primitive_adapter::aggregate_transcripts(
            &participants,
            ritual.threshold,
            ritual.shares,
            my_index,
            ritual_id,
            &transcripts,
        )?;
        self.store.set_aggregation(ritual_id, aggregated.clone(), public_key, generator_inverse);

        let my_index = my_index as u32;
        let coordinator = self.coordinator.clone();
        retry::with_backoff("post_aggregation", || {
            let coordinator = coordinator.clone();
            let aggregated = aggregated.clone();
            async move { coordinator.post_aggregation(ritual_id, my_index, &aggregated).await.map(|_| ()) }
        })
        .await?;

        self.store.mark_posted_aggregation(ritual_id);
        Ok(())
    }

    /// Derive this node's decryption share once `ritual_id` is finalized,
    /// gated by `conditions` evaluated against `context`.
    pub async fn derive_decryption_share(
        &self,
        ritual_id: u32,
        chain: &dyn chain_interface::ChainInterface,
        ciphertext: &[u8],
        conditions: &[LingoElement],
        context: &ConditionContext,
    ) -> Result<Vec<u8>> {
        let ritual = self.coordinator.get_ritual(ritual_id).await?;
        if ritual.status != RitualStatus::Finalized {
            return Err(NodeError::InvalidRitualState {
                ritual_id,
                reason: format!("ritual not finalized, currently {:?}", ritual.status),
            });
        }
        let my_index = ritual.node_index(&self.me).ok_or_else(|| NodeError::InvalidRitualState {
            ritual_id,
            reason: "this node is not a participant in the ritual".into(),
        })?;

        let mut record = self.store.get(ritual_id);
        if record.aggregated_transcript.is_none() {
            let transcripts: Vec<Vec<u8>> = ritual
                .transcripts
                .iter()
                .cloned()
                .collect::<Option<Vec<_>>>()
                .ok_or(NodeError::MissingTranscripts(ritual_id))?;
            let participants = self.validator_keys.resolve(&ritual.nodes, ritual_id)?;
            let (aggregated, public_key, generator_inverse) = primitive_adapter::aggregate_transcripts(
                &participants,
                ritual.threshold,
                ritual.shares,
                my_index,
                ritual_id,
                &transcripts,
            )?;
            self.store.set_aggregation(ritual_id, aggregated.clone(), public_key, generator_inverse);
            record = self.store.get(ritual_id);
        }
        let aggregated = record.aggregated_transcript.expect("just populated above");

        let tree = condition_lingo::parse(conditions)?;
        condition_lingo::evaluate(&tree, chain, context).await?;

        let participants = self.validator_keys.resolve(&ritual.nodes, ritual_id)?;
        let condition_bytes = serde_json::to_vec(conditions).map_err(|_| NodeError::InternalError)?;
        primitive_adapter::derive_decryption_share(
            &participants,
            ritual.threshold,
            ritual.shares,
            my_index,
            ritual_id,
            &aggregated,
            ciphertext,
            &condition_bytes,
            &self.my_keypair,
        )
    }
}
