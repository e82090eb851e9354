//! `/node_metadata` request/response envelopes.
//!
//! Node-discovery gossip itself is out of scope; only the wire shape is
//! modeled here so the HTTP surface has a real request/response type to
//! parse and sign.

use serde::{Deserialize, Serialize};
use umbral_pre::Signature;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataRequest {
    pub fleet_state_checksum: String,
    /// Opaque, already-serialized metadata announcements from the caller's
    /// known peers.
    pub announced_nodes: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub fleet_state_checksum: String,
    pub known_nodes: Vec<Vec<u8>>,
    pub signature: Signature,
}
