//! Shared wire types for the operator node: policy identifiers, capsule
//! envelopes, treasure maps, ritual state, and the HTTP request/response
//! bodies that cross the network.

mod capsule;
mod coordinator;
mod hrac;
mod message_kit;
mod metadata;
mod revocation;
mod ritual;
mod treasure_map;

pub use capsule::{CapsuleFragment, EncryptedKeyFrag, KeyFragment, VerifiedCapsuleFragment, VerifiedKeyFragment};
pub use coordinator::{CoordinatorContract, TxReceipt};
pub use hrac::Hrac;
pub use message_kit::{MessageKit, CONDITIONS_DELIMITER};
pub use metadata::{MetadataRequest, MetadataResponse};
pub use revocation::RevocationOrder;
pub use ritual::{Ritual, RitualStatus};
pub use treasure_map::{OperatorAddr, TreasureMap};

pub use umbral_pre::{Capsule, PublicKey, SecretKey, Signature, Signer};
