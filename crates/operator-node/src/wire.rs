//! Self-describing node metadata served from `/public_information`, the
//! one piece of the node-discovery picture that is in scope: announcing
//! this node's own identity. Gossiping *other* nodes' announcements is
//! out of scope.

use serde::{Deserialize, Serialize};
use threshold_core::{OperatorAddr, PublicKey, Signature};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicInformation {
    pub operator_address: OperatorAddr,
    pub verifying_key: PublicKey,
    pub signature: Signature,
}

impl PublicInformation {
    pub fn signed_bytes(operator_address: &OperatorAddr, verifying_key: &PublicKey) -> Option<Vec<u8>> {
        bincode::serialize(&(operator_address, verifying_key)).ok()
    }
}
