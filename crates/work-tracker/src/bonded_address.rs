//! The concrete periodic task: keep this operator's on-chain bonded
//! address commitment current by calling `confirm_operator_address`.

use crate::supervisor::{TaskOutcome, WorkTask};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use threshold_core::{CoordinatorContract, OperatorAddr};

pub struct BondedAddressTask<C: CoordinatorContract> {
    coordinator: Arc<C>,
    operator: OperatorAddr,
    outstanding: AtomicBool,
}

impl<C: CoordinatorContract> BondedAddressTask<C> {
    pub fn new(coordinator: Arc<C>, operator: OperatorAddr) -> Self {
        BondedAddressTask { coordinator, operator, outstanding: AtomicBool::new(false) }
    }
}

#[async_trait]
impl<C: CoordinatorContract> WorkTask for BondedAddressTask<C> {
    async fn run_once(&self) -> TaskOutcome {
        self.outstanding.store(true, Ordering::SeqCst);
        let result = self.coordinator.confirm_operator_address(&self.operator).await;
        self.outstanding.store(false, Ordering::SeqCst);

        match result {
            Ok(receipt) => {
                tracing::info!(tx_hash = %receipt.tx_hash, operator = %self.operator, "confirmed operator address");
                TaskOutcome::Continue
            }
            Err(error) => TaskOutcome::Crashed(error.to_string()),
        }
    }

    fn tx_outstanding(&self) -> bool {
        self.outstanding.load(Ordering::SeqCst)
    }
}
