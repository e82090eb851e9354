//! The HTTP surface: one handler per endpoint in the external interfaces
//! table, wired onto a single `axum::Router` in `main`.

use crate::state::AppState;
use crate::wire::PublicInformation;
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use reencryption_service::ReencryptionRequest;
use std::net::SocketAddr;
use threshold_core::{CoordinatorContract, MetadataRequest, MetadataResponse, RevocationOrder};
use threshold_errors::NodeError;

const OCTET_STREAM: &str = "application/octet-stream";

pub fn router<C: CoordinatorContract + 'static>(state: AppState<C>) -> Router {
    Router::new()
        .route("/public_information", get(public_information::<C>))
        .route("/node_metadata", get(known_nodes::<C>).post(node_metadata::<C>))
        .route("/reencrypt", post(reencrypt::<C>))
        .route("/revoke", post(revoke::<C>))
        .route("/ping", get(ping))
        .route("/check_availability", post(check_availability))
        .route("/status", get(status::<C>))
        .with_state(state)
}

/// Wraps a [`NodeError`] so it implements `IntoResponse` using the single
/// `http_status` mapping, per the error handling design.
struct ApiError(NodeError);

impl From<NodeError> for ApiError {
    fn from(error: NodeError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        tracing::warn!(error = %self.0, status = status.as_u16(), "request rejected");
        // Malformed requests get only the error class name in the body; the
        // `Display` detail echoes attacker-controlled parse-error text and
        // must never reach the caller.
        let body = if self.0.is_malformed_request() { self.0.class_name().to_string() } else { self.0.to_string() };
        (status, body).into_response()
    }
}

async fn public_information<C: CoordinatorContract + 'static>(
    State(state): State<AppState<C>>,
) -> Result<impl IntoResponse, ApiError> {
    let signed = PublicInformation::signed_bytes(&state.operator_address, &state.verifying_key)
        .ok_or(NodeError::InternalError)?;
    let signature = state.signer.sign(&signed);
    let info = PublicInformation {
        operator_address: state.operator_address.clone(),
        verifying_key: state.verifying_key,
        signature,
    };
    let body = bincode::serialize(&info).map_err(|_| NodeError::InternalError)?;
    Ok(([("content-type", OCTET_STREAM)], body))
}

/// Node-discovery gossip is out of scope; this always reports zero known
/// peers rather than pretending to track a fleet state.
async fn known_nodes<C: CoordinatorContract + 'static>(
    State(_state): State<AppState<C>>,
) -> impl IntoResponse {
    let empty: Vec<Vec<u8>> = Vec::new();
    let body = bincode::serialize(&empty).unwrap_or_default();
    ([("content-type", OCTET_STREAM)], body)
}

async fn node_metadata<C: CoordinatorContract + 'static>(
    State(state): State<AppState<C>>,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: MetadataRequest =
        bincode::deserialize(&body).map_err(|e| NodeError::MalformedRequest(e.to_string()))?;
    let response = MetadataResponse {
        fleet_state_checksum: request.fleet_state_checksum,
        known_nodes: Vec::new(),
        signature: state.signer.sign(request.announced_nodes.concat().as_slice()),
    };
    let body = bincode::serialize(&response).map_err(|_| NodeError::InternalError)?;
    Ok(([("content-type", OCTET_STREAM)], body))
}

async fn reencrypt<C: CoordinatorContract + 'static>(
    State(state): State<AppState<C>>,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request = ReencryptionRequest::from_wire_bytes(&body)?;
    let response = state.reencryption.reencrypt(&request).await?;
    let body = bincode::serialize(&response).map_err(|_| NodeError::InternalError)?;
    Ok(([("content-type", OCTET_STREAM)], body))
}

async fn revoke<C: CoordinatorContract + 'static>(
    State(state): State<AppState<C>>,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let order: RevocationOrder =
        bincode::deserialize(&body).map_err(|e| NodeError::MalformedRequest(e.to_string()))?;
    if !order.encrypted_kfrag.verify_publisher_signature() {
        return Err(NodeError::InvalidSignature("revocation order".into()).into());
    }
    state.reencryption.revoke(order.encrypted_kfrag.hrac);
    Ok(StatusCode::OK)
}

async fn ping(ConnectInfo(addr): ConnectInfo<SocketAddr>) -> String {
    addr.ip().to_string()
}

/// Basic shape check only: node-discovery compatibility rules beyond
/// "does this parse as an announcement" are out of scope.
async fn check_availability(body: axum::body::Bytes) -> StatusCode {
    match bincode::deserialize::<PublicInformation>(&body) {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::BAD_REQUEST,
    }
}

async fn status<C: CoordinatorContract + 'static>(State(state): State<AppState<C>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "operator_address": state.operator_address,
        "known_peers": 0,
    }))
}
