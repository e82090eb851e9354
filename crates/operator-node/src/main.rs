//! Operator node binary: loads configuration, wires the chain interface,
//! ritual engine, reencryption service, and work tracker, and serves the
//! HTTP surface.

mod config;
mod coordinator_stub;
mod routes;
mod state;
mod wire;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use config::NodeConfig;
use coordinator_stub::UnwiredCoordinator;
use reencryption_service::{AuditLog, ReencryptionService, RevocationSet};
use ritual_engine::ValidatorKeys;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use threshold_core::{SecretKey, Signer};
use work_tracker::{BondedAddressTask, WorkTracker, WorkTrackerConfig};

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "node.toml".to_string());
    let config = NodeConfig::load(&config_path).context("loading node configuration")?;

    // Keystore loading is out of scope: this generates ephemeral key
    // material on every start. A real deployment substitutes a keystore
    // that persists these across restarts.
    tracing::warn!("no keystore wired; generating ephemeral decrypting/signing/DKG keys for this run");
    let decrypting_key = SecretKey::random();
    let verifying_key_secret = SecretKey::random();
    let signer = Signer::new(verifying_key_secret.clone());
    let verifying_key = verifying_key_secret.public_key();
    let my_dkg_keypair = primitive_adapter::DkgKeypair::new();

    let chain = Arc::new(chain_interface::EthRpcChainInterface::new(config.chain_endpoints()?));
    let coordinator = Arc::new(UnwiredCoordinator);
    let revoked = RevocationSet::load(&config.revocation_set_path);
    let audit_log = AuditLog::open(&config.audit_log_path);
    let reencryption = ReencryptionService::new(
        decrypting_key,
        Signer::new(verifying_key_secret.clone()),
        chain.clone(),
        revoked,
        audit_log,
    );

    let app_state = state::AppState::new(
        config.operator_address.clone(),
        verifying_key,
        signer,
        chain,
        coordinator.clone(),
        ValidatorKeys::new(HashMap::new()),
        my_dkg_keypair,
        reencryption,
    );

    let tracker_config = WorkTrackerConfig {
        min_interval: config.work_tracker.min_interval(),
        max_interval: config.work_tracker.max_interval(),
        abort_on_error: config.work_tracker.abort_on_error,
    };
    let bonded_task = BondedAddressTask::new(coordinator, config.operator_address.clone());
    let tracker = WorkTracker::new(bonded_task, tracker_config);
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let tracker_handle = tokio::spawn(async move {
        if let Err(error) = tracker.run(shutdown_rx).await {
            tracing::error!(%error, "work tracker aborted");
        }
    });

    let app = routes::router(app_state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr: SocketAddr = config.bind_address.parse().context("parsing bind_address")?;
    tracing::info!(%addr, "operator node listening");
    let listener = tokio::net::TcpListener::bind(addr).await.context("binding HTTP listener")?;

    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("serving HTTP")?;

    let _ = shutdown_tx.send(true);
    let _ = tracker_handle.await;
    Ok(())
}
