//! Threshold DKG primitives: the boundary to `ferveo`.
//!
//! Transcripts, aggregated transcripts and decryption shares all cross the
//! wire as opaque bytes; everything ferveo-shaped stays inside this module
//! so the rest of the node only ever sees `Vec<u8>`.

use ferveo::api::{AggregatedTranscript, Dkg, DkgPublicKey, Keypair, PublicKey as DkgParticipantKey, Transcript, Validator};
use threshold_core::OperatorAddr;
use threshold_errors::{NodeError, Result};

/// One ritual participant as known from the coordinator contract: address
/// plus the DKG public key it announced on-chain.
pub struct Participant {
    pub address: OperatorAddr,
    pub public_key: DkgParticipantKey,
}

fn validators(participants: &[Participant]) -> Vec<Validator> {
    participants
        .iter()
        .enumerate()
        .map(|(i, p)| Validator {
            address: p.address.clone(),
            public_key: p.public_key.clone(),
            share_index: i as u32,
        })
        .collect()
}

fn build_dkg(participants: &[Participant], threshold: usize, shares: usize, me: usize, ritual_id: u32) -> Result<Dkg> {
    let validators = validators(participants);
    let me = validators.get(me).ok_or_else(|| NodeError::InvalidRitualState {
        ritual_id,
        reason: "local node index out of range".into(),
    })?;
    Dkg::new(ritual_id as u64, shares as u32, threshold as u32, &validators, me).map_err(|_| NodeError::InternalError)
}

/// Round 1: produce this node's transcript for ritual `ritual_id`.
pub fn generate_transcript(
    participants: &[Participant],
    threshold: usize,
    shares: usize,
    me: usize,
    ritual_id: u32,
    my_keypair: &Keypair,
) -> Result<Vec<u8>> {
    let dkg = build_dkg(participants, threshold, shares, me, ritual_id)?;
    let transcript: Transcript = dkg.generate_transcript(my_keypair).map_err(|_| NodeError::InternalError)?;
    transcript.to_bytes().map_err(|_| NodeError::InternalError)
}

/// Round 2: aggregate every node's transcript into the final DKG key
/// material. Returns `(aggregated_bytes, dkg_public_key_bytes,
/// generator_inverse_bytes)`.
pub fn aggregate_transcripts(
    participants: &[Participant],
    threshold: usize,
    shares: usize,
    me: usize,
    ritual_id: u32,
    transcripts: &[Vec<u8>],
) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>)> {
    let dkg = build_dkg(participants, threshold, shares, me, ritual_id)?;
    let validators = validators(participants);

    if transcripts.len() != validators.len() {
        return Err(NodeError::MissingTranscripts(ritual_id));
    }
    let parsed: Vec<Transcript> = transcripts
        .iter()
        .map(|bytes| Transcript::from_bytes(bytes))
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| NodeError::InternalError)?;

    let aggregated: AggregatedTranscript = dkg
        .aggregate_transcripts(validators.iter().cloned().zip(parsed))
        .map_err(|_| NodeError::InternalError)?;

    let public_key: DkgPublicKey = aggregated.public_key();
    let aggregated_bytes = aggregated.to_bytes().map_err(|_| NodeError::InternalError)?;
    let public_key_bytes = public_key.to_bytes().map_err(|_| NodeError::InternalError)?;
    let generator_inverse_bytes = aggregated.generator_inverse().to_bytes().map_err(|_| NodeError::InternalError)?;

    Ok((aggregated_bytes, public_key_bytes, generator_inverse_bytes))
}

/// On-request: derive this node's share of the decryption for `ciphertext`
/// under `conditions` (the serialized, already-evaluated condition bytes
/// used as additional authenticated data).
pub fn derive_decryption_share(
    participants: &[Participant],
    threshold: usize,
    shares: usize,
    me: usize,
    ritual_id: u32,
    aggregated: &[u8],
    ciphertext: &[u8],
    conditions: &[u8],
    my_keypair: &Keypair,
) -> Result<Vec<u8>> {
    let dkg = build_dkg(participants, threshold, shares, me, ritual_id)?;
    let aggregated = AggregatedTranscript::from_bytes(aggregated).map_err(|_| NodeError::InternalError)?;

    let share = aggregated
        .create_decryption_share_simple(&dkg, ciphertext, conditions, my_keypair)
        .map_err(|_| NodeError::InternalError)?;

    share.to_bytes().map_err(|_| NodeError::InternalError)
}
