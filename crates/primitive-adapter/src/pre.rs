//! Proxy re-encryption primitives: a thin, side-effect-free wrapper over
//! `umbral-pre`.

use threshold_core::{
    CapsuleFragment, EncryptedKeyFrag, Hrac, KeyFragment, PublicKey, SecretKey, VerifiedKeyFragment,
};
use threshold_errors::{NodeError, Result};
use umbral_pre::Capsule;

/// Re-encrypt `capsule` under `kfrag`. Infallible given a verified kfrag;
/// `umbral_pre::reencrypt` never fails once the kfrag itself is trusted.
pub fn reencrypt(kfrag: &VerifiedKeyFragment, capsule: &Capsule) -> CapsuleFragment {
    umbral_pre::reencrypt(capsule, kfrag.clone())
}

/// `alice_vk` is accepted for symmetry with the wider API but is not part
/// of the check itself: Umbral v1 verifies a cfrag against the delegating
/// key, the receiving key, and the signer (`ursula_vk`), not the
/// original delegator's verifying key.
pub fn verify_cfrag(
    cfrag: &CapsuleFragment,
    capsule: &Capsule,
    _alice_vk: &PublicKey,
    ursula_vk: &PublicKey,
    policy_pk: &PublicKey,
    bob_pk: &PublicKey,
) -> bool {
    cfrag.clone().verify(capsule, policy_pk, bob_pk, ursula_vk).is_ok()
}

/// Decrypt an `EncryptedKeyFrag` into the raw `KeyFragment` it carries.
///
/// Checks, in order: the embedded HRAC matches the policy this request is
/// for (`WrongPolicy`), the publisher's signature over the envelope
/// (`InvalidSignature`), and the asymmetric decryption itself
/// (`DecryptionFailed`).
pub fn decrypt_kfrag(
    encrypted_kfrag: &EncryptedKeyFrag,
    decrypting_key: &SecretKey,
    hrac: &Hrac,
    publisher_vk: &PublicKey,
) -> Result<KeyFragment> {
    if encrypted_kfrag.hrac.as_bytes() != hrac.as_bytes() {
        return Err(NodeError::WrongPolicy);
    }
    if encrypted_kfrag.publisher_verifying_key != *publisher_vk
        || !encrypted_kfrag.verify_publisher_signature()
    {
        return Err(NodeError::InvalidSignature("publisher key fragment envelope".into()));
    }

    let plaintext = umbral_pre::decrypt_original(
        decrypting_key,
        &encrypted_kfrag.capsule,
        &encrypted_kfrag.ciphertext,
    )
    .map_err(|_| NodeError::DecryptionFailed)?;

    bincode::deserialize(&plaintext).map_err(|_| NodeError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use threshold_core::Signer;

    fn keypair() -> (SecretKey, PublicKey) {
        let sk = SecretKey::random();
        let pk = sk.public_key();
        (sk, pk)
    }

    #[test]
    fn decrypt_kfrag_rejects_wrong_policy() {
        let (publisher_sk, publisher_vk) = keypair();
        let (operator_sk, operator_vk) = keypair();
        let kfrag_bytes = b"not a real kfrag, just bytes".to_vec();
        let (capsule, ciphertext) = umbral_pre::encrypt(&operator_vk, &kfrag_bytes).unwrap();
        let signed_hrac = Hrac([1u8; 32]);
        let mut bytes = signed_hrac.as_bytes().to_vec();
        bytes.extend_from_slice(&ciphertext);
        let signer = Signer::new(publisher_sk.clone());
        let signature = signer.sign(&bytes);

        let envelope = EncryptedKeyFrag {
            hrac: signed_hrac,
            capsule,
            ciphertext: ciphertext.to_vec(),
            publisher_verifying_key: publisher_vk,
            signature,
        };

        let wrong_hrac = Hrac([2u8; 32]);
        let err = decrypt_kfrag(&envelope, &operator_sk, &wrong_hrac, &publisher_vk).unwrap_err();
        assert!(matches!(err, NodeError::WrongPolicy));
    }
}
