//! A `CoordinatorContract` that compiles and wires the HTTP surface but
//! performs no on-chain transaction sending, since that mechanics is out
//! of scope here (the coordinator is modeled only as the trait other
//! crates depend on). A deployment wires a real contract-backed
//! implementation in its place; this binary ships the trait's shape and
//! the rest of the pipeline, not that implementation.

use async_trait::async_trait;
use threshold_core::{CoordinatorContract, OperatorAddr, Ritual, RitualStatus, TxReceipt};
use threshold_errors::{NodeError, Result};

pub struct UnwiredCoordinator;

#[async_trait]
impl CoordinatorContract for UnwiredCoordinator {
    async fn get_ritual(&self, _id: u32) -> Result<Ritual> {
        Err(NodeError::InternalError)
    }

    async fn get_ritual_status(&self, _id: u32) -> Result<RitualStatus> {
        Err(NodeError::InternalError)
    }

    async fn get_node_index(&self, _id: u32, _node: &str) -> Result<u32> {
        Err(NodeError::InternalError)
    }

    async fn post_transcript(&self, _id: u32, _node_index: u32, _bytes: &[u8]) -> Result<TxReceipt> {
        Err(NodeError::InternalError)
    }

    async fn post_aggregation(&self, _id: u32, _node_index: u32, _bytes: &[u8]) -> Result<TxReceipt> {
        Err(NodeError::InternalError)
    }

    async fn confirm_operator_address(&self, _operator: &OperatorAddr) -> Result<TxReceipt> {
        Err(NodeError::InternalError)
    }
}
