//! Cryptographic primitives used by the ritual engine, reencryption service
//! and retrieval planner: proxy re-encryption (`umbral-pre`) and threshold
//! DKG (`ferveo`), translated into the node's own error taxonomy.

mod dkg;
mod pre;

pub use dkg::{aggregate_transcripts, derive_decryption_share, generate_transcript, Participant};
pub use pre::{decrypt_kfrag, reencrypt, verify_cfrag};

pub use ferveo::api::Keypair as DkgKeypair;
pub use ferveo::api::PublicKey as DkgPublicKey;
