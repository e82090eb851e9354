//! Read-only blockchain state access used to evaluate access conditions.
//!
//! This crate deliberately knows nothing about transaction sending: the
//! coordinator posting power lives with the ritual engine, not here. It
//! exposes the capability set described for the Chain Interface component —
//! `eth_call`, `block_timestamp`, `block_number`, `chain_id_supported` —
//! over a real JSON-RPC client, plus a mock used by condition-lingo tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use threshold_errors::{NodeError, Result};

/// Soft timeout: past this, a call is logged as slow but still awaited.
pub const SOFT_TIMEOUT: Duration = Duration::from_secs(5);
/// Hard timeout: past this, the call is aborted and `RpcTimeout` returned.
pub const HARD_TIMEOUT: Duration = Duration::from_secs(20);

/// Read-only capability set queried by the condition evaluator.
#[async_trait]
pub trait ChainInterface: Send + Sync {
    /// `eth_call`-equivalent: execute `data` against `to` on `chain_id` at
    /// the latest block, returning the raw ABI-encoded return bytes.
    async fn eth_call(&self, chain_id: u64, to: &str, data: &[u8]) -> Result<Vec<u8>>;

    /// Timestamp of the latest block on `chain_id`.
    async fn block_timestamp(&self, chain_id: u64) -> Result<u64>;

    /// Number of the latest block on `chain_id`.
    async fn block_number(&self, chain_id: u64) -> Result<u64>;

    /// Generic JSON-RPC call, used by `RpcCondition` for `eth_*` methods
    /// other than `eth_call` (e.g. `eth_getBalance`).
    async fn rpc_call(&self, chain_id: u64, method: &str, params: serde_json::Value) -> Result<serde_json::Value>;

    /// Whether this interface has a configured endpoint for `chain_id`.
    fn chain_id_supported(&self, chain_id: u64) -> bool;
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: serde_json::Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    message: String,
}

/// JSON-RPC-over-HTTP chain interface, one endpoint per chain id.
pub struct EthRpcChainInterface {
    client: reqwest::Client,
    endpoints: HashMap<u64, String>,
}

impl EthRpcChainInterface {
    /// Build a chain interface from a `chain_id -> RPC URL` table.
    pub fn new(endpoints: HashMap<u64, String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(HARD_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, endpoints }
    }

    fn endpoint(&self, chain_id: u64) -> Result<&str> {
        self.endpoints
            .get(&chain_id)
            .map(String::as_str)
            .ok_or(NodeError::NoConnectionForChain(chain_id))
    }

    async fn call(&self, chain_id: u64, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let url = self.endpoint(chain_id)?;
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        let soft_deadline = tokio::time::Instant::now() + SOFT_TIMEOUT;
        let request = self.client.post(url).json(&body).send();
        let response = tokio::time::timeout(HARD_TIMEOUT, request)
            .await
            .map_err(|_| NodeError::RpcTimeout(chain_id))?
            .map_err(|e| NodeError::RpcError(e.to_string()))?;

        if tokio::time::Instant::now() > soft_deadline {
            tracing::warn!(chain_id, method, "rpc call exceeded soft timeout");
        }

        let parsed: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| NodeError::RpcError(e.to_string()))?;

        if let Some(err) = parsed.error {
            return Err(NodeError::RpcError(err.message));
        }
        parsed.result.ok_or_else(|| NodeError::RpcError("missing result".into()))
    }
}

#[async_trait]
impl ChainInterface for EthRpcChainInterface {
    async fn eth_call(&self, chain_id: u64, to: &str, data: &[u8]) -> Result<Vec<u8>> {
        let params = serde_json::json!([
            { "to": to, "data": format!("0x{}", hex::encode(data)) },
            "latest",
        ]);
        let result = self.call(chain_id, "eth_call", params).await?;
        let hex_str = result
            .as_str()
            .ok_or_else(|| NodeError::RpcError("eth_call result was not a string".into()))?;
        hex::decode(hex_str.trim_start_matches("0x")).map_err(|e| NodeError::RpcError(e.to_string()))
    }

    async fn block_timestamp(&self, chain_id: u64) -> Result<u64> {
        let block = self.call(chain_id, "eth_getBlockByNumber", serde_json::json!(["latest", false])).await?;
        parse_hex_u64(&block, "timestamp")
    }

    async fn block_number(&self, chain_id: u64) -> Result<u64> {
        let result = self.call(chain_id, "eth_blockNumber", serde_json::json!([])).await?;
        let hex_str = result
            .as_str()
            .ok_or_else(|| NodeError::RpcError("eth_blockNumber result was not a string".into()))?;
        u64::from_str_radix(hex_str.trim_start_matches("0x"), 16)
            .map_err(|e| NodeError::RpcError(e.to_string()))
    }

    async fn rpc_call(&self, chain_id: u64, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        self.call(chain_id, method, params).await
    }

    fn chain_id_supported(&self, chain_id: u64) -> bool {
        self.endpoints.contains_key(&chain_id)
    }
}

fn parse_hex_u64(value: &serde_json::Value, field: &str) -> Result<u64> {
    let hex_str = value
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| NodeError::RpcError(format!("missing field {field}")))?;
    u64::from_str_radix(hex_str.trim_start_matches("0x"), 16)
        .map_err(|e| NodeError::RpcError(e.to_string()))
}

/// Deterministic, in-memory chain interface used by condition-lingo's and
/// ritual-engine's tests. Never performs network I/O.
#[derive(Debug, Clone, Default)]
pub struct MockChainInterface {
    pub timestamps: HashMap<u64, u64>,
    pub block_numbers: HashMap<u64, u64>,
    pub call_results: HashMap<(u64, String), Vec<u8>>,
    pub supported_chains: Vec<u64>,
}

impl MockChainInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamp(mut self, chain_id: u64, timestamp: u64) -> Self {
        self.supported_chains.push(chain_id);
        self.timestamps.insert(chain_id, timestamp);
        self
    }

    pub fn with_call_result(mut self, chain_id: u64, to: &str, result: Vec<u8>) -> Self {
        if !self.supported_chains.contains(&chain_id) {
            self.supported_chains.push(chain_id);
        }
        self.call_results.insert((chain_id, to.to_string()), result);
        self
    }
}

#[async_trait]
impl ChainInterface for MockChainInterface {
    async fn eth_call(&self, chain_id: u64, to: &str, _data: &[u8]) -> Result<Vec<u8>> {
        if !self.chain_id_supported(chain_id) {
            return Err(NodeError::NoConnectionForChain(chain_id));
        }
        self.call_results
            .get(&(chain_id, to.to_string()))
            .cloned()
            .ok_or_else(|| NodeError::RpcError(format!("no mock result for {to} on {chain_id}")))
    }

    async fn block_timestamp(&self, chain_id: u64) -> Result<u64> {
        if !self.chain_id_supported(chain_id) {
            return Err(NodeError::NoConnectionForChain(chain_id));
        }
        self.timestamps.get(&chain_id).copied().ok_or(NodeError::NoConnectionForChain(chain_id))
    }

    async fn block_number(&self, chain_id: u64) -> Result<u64> {
        if !self.chain_id_supported(chain_id) {
            return Err(NodeError::NoConnectionForChain(chain_id));
        }
        self.block_numbers.get(&chain_id).copied().ok_or(NodeError::NoConnectionForChain(chain_id))
    }

    async fn rpc_call(&self, chain_id: u64, _method: &str, _params: serde_json::Value) -> Result<serde_json::Value> {
        if !self.chain_id_supported(chain_id) {
            return Err(NodeError::NoConnectionForChain(chain_id));
        }
        Ok(serde_json::Value::Null)
    }

    fn chain_id_supported(&self, chain_id: u64) -> bool {
        self.supported_chains.contains(&chain_id)
    }
}
