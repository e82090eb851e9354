//! Shared, cloneable application state handed to every axum handler.

use chain_interface::EthRpcChainInterface;
use reencryption_service::ReencryptionService;
use ritual_engine::{RitualEngine, ValidatorKeys};
use ritual_store::RitualStore;
use std::sync::Arc;
use threshold_core::{CoordinatorContract, OperatorAddr, PublicKey, Signer};

#[derive(Clone)]
pub struct AppState<C: CoordinatorContract + 'static> {
    pub operator_address: OperatorAddr,
    pub verifying_key: PublicKey,
    pub signer: Arc<Signer>,
    pub chain: Arc<EthRpcChainInterface>,
    pub coordinator: Arc<C>,
    pub ritual_store: Arc<RitualStore>,
    pub ritual_engine: Arc<RitualEngine<C>>,
    pub reencryption: Arc<ReencryptionService>,
}

impl<C: CoordinatorContract + 'static> AppState<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        operator_address: OperatorAddr,
        verifying_key: PublicKey,
        signer: Signer,
        chain: Arc<EthRpcChainInterface>,
        coordinator: Arc<C>,
        validator_keys: ValidatorKeys,
        my_dkg_keypair: primitive_adapter::DkgKeypair,
        reencryption: ReencryptionService,
    ) -> Self {
        let ritual_store = Arc::new(RitualStore::new());
        let ritual_engine = Arc::new(RitualEngine::new(
            coordinator.clone(),
            ritual_store.clone(),
            validator_keys,
            operator_address.clone(),
            my_dkg_keypair,
        ));
        AppState {
            operator_address,
            verifying_key,
            signer: Arc::new(signer),
            chain,
            coordinator,
            ritual_store,
            ritual_engine,
            reencryption: Arc::new(reencryption),
        }
    }
}
