//! Read/write view of the on-chain coordinator contract that the ritual
//! engine and work tracker post to and read state from.

use crate::ritual::{Ritual, RitualStatus};
use crate::treasure_map::OperatorAddr;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use threshold_errors::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: u64,
}

#[async_trait]
pub trait CoordinatorContract: Send + Sync {
    async fn get_ritual(&self, id: u32) -> Result<Ritual>;
    async fn get_ritual_status(&self, id: u32) -> Result<RitualStatus>;
    async fn get_node_index(&self, id: u32, node: &str) -> Result<u32>;
    async fn post_transcript(&self, id: u32, node_index: u32, bytes: &[u8]) -> Result<TxReceipt>;
    async fn post_aggregation(&self, id: u32, node_index: u32, bytes: &[u8]) -> Result<TxReceipt>;
    /// Work tracker's on-chain commitment call.
    async fn confirm_operator_address(&self, operator: &OperatorAddr) -> Result<TxReceipt>;
}
