//! The `/reencrypt` operation: revocation check, kfrag decryption, request
//! authentication, per-capsule condition gating, reencryption, and a
//! signed, audited response.

use crate::audit_log::AuditLog;
use crate::request::{ReencryptionRequest, ReencryptionResponse};
use crate::revocation::RevocationSet;
use chain_interface::ChainInterface;
use condition_lingo::Context as ConditionContext;
use serde_json::Value;
use std::collections::HashMap;
use threshold_core::{CapsuleFragment, SecretKey, Signer};
use threshold_errors::{NodeError, Result};
use uuid::Uuid;

pub struct ReencryptionService {
    decrypting_key: SecretKey,
    signer: Signer,
    chain: std::sync::Arc<dyn ChainInterface>,
    revoked: RevocationSet,
    audit_log: AuditLog,
}

impl ReencryptionService {
    pub fn new(
        decrypting_key: SecretKey,
        signer: Signer,
        chain: std::sync::Arc<dyn ChainInterface>,
        revoked: RevocationSet,
        audit_log: AuditLog,
    ) -> Self {
        Self { decrypting_key, signer, chain, revoked, audit_log }
    }

    /// Add `hrac` to this node's revocation set, honored by every
    /// subsequent `reencrypt` call.
    pub fn revoke(&self, hrac: threshold_core::Hrac) {
        self.revoked.revoke(hrac);
    }

    pub async fn reencrypt(&self, request: &ReencryptionRequest) -> Result<ReencryptionResponse> {
        // 1. Revocation check.
        if self.revoked.contains(&request.hrac) {
            return Err(NodeError::PolicyRevoked(request.hrac.to_string()));
        }

        // 2. Decrypt kfrag.
        let kfrag = primitive_adapter::decrypt_kfrag(
            &request.encrypted_kfrag,
            &self.decrypting_key,
            &request.hrac,
            &request.publisher_verifying_key,
        )?;
        let verified_kfrag = kfrag
            .verify(&request.publisher_verifying_key, None, None)
            .map_err(|_| NodeError::InvalidSignature("key fragment".into()))?;

        // 3. Authenticate request.
        if !request.is_authentic() {
            return Err(NodeError::InvalidSignature("reencryption request".into()));
        }

        // 4. Per-capsule condition evaluation, in order.
        if request.conditions.len() != request.capsules.len() {
            return Err(NodeError::InvalidCondition(
                "conditions list must have one entry per capsule".into(),
            ));
        }
        let context: ConditionContext = request
            .context
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<HashMap<String, Value>>();
        for maybe_conditions in &request.conditions {
            if let Some(elements) = maybe_conditions {
                if !elements.is_empty() {
                    let tree = condition_lingo::parse(elements)?;
                    condition_lingo::evaluate(&tree, self.chain.as_ref(), &context).await?;
                }
            }
        }

        // 5. Reencrypt all capsules with the single decrypted kfrag.
        let cfrags: Vec<CapsuleFragment> = request
            .capsules
            .iter()
            .map(|capsule| primitive_adapter::reencrypt(&verified_kfrag, capsule))
            .collect();

        // 6. Signed response.
        let signed_bytes = ReencryptionResponse::signed_bytes(&request.capsules, &cfrags)
            .ok_or(NodeError::InternalError)?;
        let signature = self.signer.sign(&signed_bytes);
        let response = ReencryptionResponse { capsules: request.capsules.clone(), cfrags, signature };

        // 7. Best-effort audit log; never blocks the response on failure.
        let now = time::OffsetDateTime::now_utc().unix_timestamp().max(0) as u64;
        self.audit_log.record(Uuid::new_v4(), &request.bob_verifying_key, &request.hrac, now);

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_interface::MockChainInterface;
    use threshold_core::{EncryptedKeyFrag, Hrac};

    fn service_with_revocation(revoked: RevocationSet) -> ReencryptionService {
        let dir = tempfile::tempdir().unwrap();
        let decrypting_key = SecretKey::random();
        let signer = Signer::new(SecretKey::random());
        ReencryptionService::new(
            decrypting_key,
            signer,
            std::sync::Arc::new(MockChainInterface::new()),
            revoked,
            AuditLog::open(dir.path().join("audit.log")),
        )
    }

    fn dummy_request(hrac: Hrac) -> ReencryptionRequest {
        let publisher_sk = SecretKey::random();
        let publisher_vk = publisher_sk.public_key();
        let bob_sk = SecretKey::random();
        let bob_vk = bob_sk.public_key();
        let (capsule, ciphertext) = umbral_pre::encrypt(&bob_vk, b"kfrag placeholder").unwrap();
        let mut signed = hrac.as_bytes().to_vec();
        signed.extend_from_slice(&ciphertext);
        let signature = Signer::new(publisher_sk).sign(&signed);

        ReencryptionRequest {
            hrac,
            capsules: vec![],
            encrypted_kfrag: EncryptedKeyFrag {
                hrac,
                capsule,
                ciphertext: ciphertext.to_vec(),
                publisher_verifying_key: publisher_vk,
                signature,
            },
            bob_verifying_key: bob_vk,
            publisher_verifying_key: publisher_vk,
            conditions: vec![],
            context: HashMap::new(),
            signature: Signer::new(bob_sk).sign(b"irrelevant, request rejected before this matters"),
        }
    }

    #[tokio::test]
    async fn revoked_policy_is_rejected_before_anything_else() {
        let hrac = Hrac([9u8; 32]);
        let revoked = RevocationSet::empty();
        revoked.revoke(hrac);
        let service = service_with_revocation(revoked);
        let err = service.reencrypt(&dummy_request(hrac)).await.unwrap_err();
        assert!(matches!(err, NodeError::PolicyRevoked(_)));
    }
}
