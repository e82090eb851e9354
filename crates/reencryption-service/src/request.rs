//! Wire types for `/reencrypt`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use condition_lingo::LingoElement;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use threshold_core::{CapsuleFragment, EncryptedKeyFrag, Hrac, PublicKey, Signature};
use threshold_errors::{NodeError, Result};
use umbral_pre::Capsule;

/// Separates the core request bytes from an appended, base64-encoded
/// per-capsule conditions list, mirroring `MessageKit`'s delimiter framing.
pub const CONDITIONS_DELIMITER: u8 = 0xBC;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReencryptionRequest {
    pub hrac: Hrac,
    pub capsules: Vec<Capsule>,
    pub encrypted_kfrag: EncryptedKeyFrag,
    pub bob_verifying_key: PublicKey,
    pub publisher_verifying_key: PublicKey,
    /// One entry per capsule, same order; `None` means unconditional access.
    pub conditions: Vec<Option<Vec<LingoElement>>>,
    pub context: HashMap<String, serde_json::Value>,
    pub signature: Signature,
}

impl ReencryptionRequest {
    /// Bytes covered by `signature`: every field except the signature
    /// itself, in declaration order.
    pub fn signed_bytes(&self) -> Option<Vec<u8>> {
        #[derive(Serialize)]
        struct Signed<'a> {
            hrac: &'a Hrac,
            capsules: &'a [Capsule],
            encrypted_kfrag: &'a EncryptedKeyFrag,
            bob_verifying_key: &'a PublicKey,
            publisher_verifying_key: &'a PublicKey,
            conditions: &'a [Option<Vec<LingoElement>>],
            context: &'a HashMap<String, serde_json::Value>,
        }
        bincode::serialize(&Signed {
            hrac: &self.hrac,
            capsules: &self.capsules,
            encrypted_kfrag: &self.encrypted_kfrag,
            bob_verifying_key: &self.bob_verifying_key,
            publisher_verifying_key: &self.publisher_verifying_key,
            conditions: &self.conditions,
            context: &self.context,
        })
        .ok()
    }

    pub fn is_authentic(&self) -> bool {
        match self.signed_bytes() {
            Some(bytes) => self.signature.verify(&self.bob_verifying_key, &bytes),
            None => false,
        }
    }

    /// `core_bytes || 0xBC || base64(JSON(conditions))`, appending the
    /// delimited payload only when at least one capsule carries conditions.
    pub fn to_wire_bytes(&self) -> Result<Vec<u8>> {
        let core = bincode::serialize(&Core {
            hrac: &self.hrac,
            capsules: &self.capsules,
            encrypted_kfrag: &self.encrypted_kfrag,
            bob_verifying_key: &self.bob_verifying_key,
            publisher_verifying_key: &self.publisher_verifying_key,
            context: &self.context,
            signature: &self.signature,
        })
        .map_err(|_| NodeError::InternalError)?;

        debug_assert!(
            !core.contains(&CONDITIONS_DELIMITER),
            "core bytes must never contain the conditions delimiter"
        );

        if self.conditions.iter().all(Option::is_none) {
            return Ok(core);
        }
        let payload = BASE64.encode(serde_json::to_vec(&self.conditions).map_err(|_| NodeError::InternalError)?);
        let mut out = core;
        out.push(CONDITIONS_DELIMITER);
        out.extend(payload.into_bytes());
        Ok(out)
    }

    pub fn from_wire_bytes(bytes: &[u8]) -> Result<Self> {
        let (core_bytes, conditions_raw) = match bytes.iter().position(|b| *b == CONDITIONS_DELIMITER) {
            Some(pos) => (&bytes[..pos], Some(&bytes[pos + 1..])),
            None => (bytes, None),
        };
        let core: OwnedCore = bincode::deserialize(core_bytes)
            .map_err(|e| NodeError::MalformedRequest(format!("core: {e}")))?;
        let conditions = match conditions_raw {
            Some(raw) => {
                let decoded = BASE64
                    .decode(raw)
                    .map_err(|e| NodeError::MalformedRequest(format!("conditions base64: {e}")))?;
                serde_json::from_slice(&decoded)
                    .map_err(|e| NodeError::MalformedRequest(format!("conditions json: {e}")))?
            }
            None => vec![None; core.capsules.len()],
        };
        Ok(ReencryptionRequest {
            hrac: core.hrac,
            capsules: core.capsules,
            encrypted_kfrag: core.encrypted_kfrag,
            bob_verifying_key: core.bob_verifying_key,
            publisher_verifying_key: core.publisher_verifying_key,
            conditions,
            context: core.context,
            signature: core.signature,
        })
    }
}

#[derive(Serialize)]
struct Core<'a> {
    hrac: &'a Hrac,
    capsules: &'a [Capsule],
    encrypted_kfrag: &'a EncryptedKeyFrag,
    bob_verifying_key: &'a PublicKey,
    publisher_verifying_key: &'a PublicKey,
    context: &'a HashMap<String, serde_json::Value>,
    signature: &'a Signature,
}

#[derive(Deserialize)]
struct OwnedCore {
    hrac: Hrac,
    capsules: Vec<Capsule>,
    encrypted_kfrag: EncryptedKeyFrag,
    bob_verifying_key: PublicKey,
    publisher_verifying_key: PublicKey,
    context: HashMap<String, serde_json::Value>,
    signature: Signature,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReencryptionResponse {
    pub capsules: Vec<Capsule>,
    pub cfrags: Vec<CapsuleFragment>,
    pub signature: Signature,
}

#[cfg(test)]
mod tests {
    use super::*;
    use condition_lingo::{Comparator, LeafCondition, ReturnValueTest, TimeCondition};
    use threshold_core::Signer;

    fn dummy_request(conditions: Vec<Option<Vec<LingoElement>>>) -> ReencryptionRequest {
        let publisher_sk = threshold_core::SecretKey::random();
        let publisher_vk = publisher_sk.public_key();
        let bob_sk = threshold_core::SecretKey::random();
        let bob_vk = bob_sk.public_key();
        let (capsule, ciphertext) = umbral_pre::encrypt(&bob_vk, b"kfrag").unwrap();
        let signature = Signer::new(publisher_sk).sign(&ciphertext);

        ReencryptionRequest {
            hrac: Hrac([7u8; 32]),
            capsules: vec![capsule.clone()],
            encrypted_kfrag: EncryptedKeyFrag {
                hrac: Hrac([7u8; 32]),
                capsule,
                ciphertext: ciphertext.to_vec(),
                publisher_verifying_key: publisher_vk,
                signature,
            },
            bob_verifying_key: bob_vk,
            publisher_verifying_key: publisher_vk,
            conditions,
            context: HashMap::new(),
            signature: Signer::new(bob_sk).sign(b"placeholder"),
        }
    }

    #[test]
    fn garbled_bytes_are_a_malformed_request() {
        let err = ReencryptionRequest::from_wire_bytes(b"not a request").unwrap_err();
        assert!(err.is_malformed_request());
        assert_eq!(err.class_name(), "MalformedRequest");
    }

    #[test]
    fn wire_round_trip_without_conditions() {
        let request = dummy_request(vec![None]);
        let bytes = request.to_wire_bytes().unwrap();
        assert!(!bytes.contains(&CONDITIONS_DELIMITER));
        let parsed = ReencryptionRequest::from_wire_bytes(&bytes).unwrap();
        assert_eq!(parsed.hrac, request.hrac);
        assert_eq!(parsed.conditions, vec![None]);
    }

    #[test]
    fn wire_round_trip_with_conditions() {
        let leaf = LingoElement::Leaf(LeafCondition::Time(TimeCondition {
            chain: 1,
            return_value_test: ReturnValueTest {
                comparator: Comparator::Lt,
                value: serde_json::json!(0),
                index: None,
            },
        }));
        let request = dummy_request(vec![Some(vec![leaf.clone()])]);
        let bytes = request.to_wire_bytes().unwrap();
        assert!(bytes.contains(&CONDITIONS_DELIMITER));
        let parsed = ReencryptionRequest::from_wire_bytes(&bytes).unwrap();
        assert_eq!(parsed.conditions, vec![Some(vec![leaf])]);
    }
}

impl ReencryptionResponse {
    /// Bytes covered by the operator's signature: `capsules ++ cfrags`
    /// concatenated, per the response signing rule.
    pub fn signed_bytes(capsules: &[Capsule], cfrags: &[CapsuleFragment]) -> Option<Vec<u8>> {
        bincode::serialize(&(capsules, cfrags)).ok()
    }
}
