//! Thin aliases over the `umbral-pre` primitive types, plus the
//! `EncryptedKeyFrag` envelope that binds a kfrag to the policy it belongs
//! to. Actual cryptographic operations live in `primitive-adapter`; this
//! module only describes the shapes that cross the wire.

use crate::hrac::Hrac;
use serde::{Deserialize, Serialize};
use umbral_pre::{Capsule, PublicKey, Signature};

pub type CapsuleFragment = umbral_pre::CapsuleFrag;
pub type KeyFragment = umbral_pre::KeyFrag;
pub type VerifiedCapsuleFragment = umbral_pre::VerifiedCapsuleFrag;
pub type VerifiedKeyFragment = umbral_pre::VerifiedKeyFrag;

/// A `KeyFragment` asymmetrically encrypted for one operator, bound to the
/// `HRAC` it was issued under and signed by the publisher.
///
/// Decryptable only by the operator holding the matching secret key; the
/// embedded `hrac` lets `decrypt_kfrag` reject a kfrag replayed under the
/// wrong policy (`WrongPolicy`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedKeyFrag {
    pub hrac: Hrac,
    pub capsule: Capsule,
    pub ciphertext: Vec<u8>,
    pub publisher_verifying_key: PublicKey,
    pub signature: Signature,
}

impl EncryptedKeyFrag {
    /// Bytes covered by `signature`: `hrac || ciphertext`.
    pub fn signed_bytes(&self) -> Vec<u8> {
        let mut bytes = self.hrac.as_bytes().to_vec();
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    pub fn verify_publisher_signature(&self) -> bool {
        self.signature
            .verify(&self.publisher_verifying_key, &self.signed_bytes())
    }
}
