//! `RevocationOrder`: publisher-signed instruction to stop honoring one
//! operator's key fragment for a policy.

use crate::capsule::EncryptedKeyFrag;
use crate::treasure_map::OperatorAddr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevocationOrder {
    pub ursula_address: OperatorAddr,
    pub encrypted_kfrag: EncryptedKeyFrag,
}
