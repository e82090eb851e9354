//! `TreasureMap`: the publisher's record of which operator holds which
//! encrypted key fragment for a policy, immutable once published.

use crate::capsule::EncryptedKeyFrag;
use crate::hrac::Hrac;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use threshold_errors::{NodeError, Result};
use umbral_pre::PublicKey;

/// Checksummed operator address, as rendered by the coordinator contract.
pub type OperatorAddr = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasureMap {
    pub hrac: Hrac,
    pub threshold: usize,
    pub shares: usize,
    pub destinations: BTreeMap<OperatorAddr, EncryptedKeyFrag>,
    pub policy_encrypting_key: PublicKey,
    pub publisher_verifying_key: PublicKey,
}

impl TreasureMap {
    /// Validates `threshold <= shares <= destinations.len()` as required by
    /// the data model before the map is trusted anywhere else.
    pub fn new(
        hrac: Hrac,
        threshold: usize,
        shares: usize,
        destinations: BTreeMap<OperatorAddr, EncryptedKeyFrag>,
        policy_encrypting_key: PublicKey,
        publisher_verifying_key: PublicKey,
    ) -> Result<Self> {
        if threshold == 0 || threshold > shares || shares > destinations.len() {
            return Err(NodeError::InvalidCondition(format!(
                "treasure map requires threshold <= shares <= destinations.len(), got {threshold} <= {shares} <= {}",
                destinations.len()
            )));
        }
        Ok(TreasureMap {
            hrac,
            threshold,
            shares,
            destinations,
            policy_encrypting_key,
            publisher_verifying_key,
        })
    }
}
