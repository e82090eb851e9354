//! Wire-agnostic delivery of retrieval work orders, plus the driver loop
//! that runs a plan to completion (or exhaustion) against it.

use crate::plan::{RetrievalPlan, RetrievalWorkOrder};
use async_trait::async_trait;
use std::collections::HashMap;
use threshold_core::{CapsuleFragment, OperatorAddr, PublicKey, TreasureMap};
use threshold_errors::Result;

/// What the retrieval planner needs from whatever actually talks to
/// operators over the network: send a work order, get cfrags back, and
/// know the operator's verifying key well enough to check them.
#[async_trait]
pub trait RetrievalTransport: Send + Sync {
    async fn send_reencryption_request(
        &self,
        work_order: &RetrievalWorkOrder,
    ) -> Result<Vec<CapsuleFragment>>;

    fn verifying_key(&self, operator: &OperatorAddr) -> Option<PublicKey>;
}

/// Drive `plan` to completion (or until every operator is exhausted),
/// verifying every returned cfrag against the operator's verifying key,
/// the policy's encrypting key, and the requester's own key before it is
/// accepted toward threshold.
pub async fn run_plan(
    mut plan: RetrievalPlan,
    treasure_map: &TreasureMap,
    bob_verifying_key: &PublicKey,
    transport: &dyn RetrievalTransport,
) -> (Vec<HashMap<OperatorAddr, CapsuleFragment>>, Vec<HashMap<OperatorAddr, String>>) {
    while !plan.is_complete() {
        let Some(work_order) = plan.get_work_order() else { break };

        let Some(ursula_vk) = transport.verifying_key(&work_order.ursula_address) else {
            plan.update_errors(&work_order, "unknown operator verifying key");
            continue;
        };

        match transport.send_reencryption_request(&work_order).await {
            Ok(cfrags) if cfrags.len() == work_order.capsules.len() => {
                let mut accepted = HashMap::new();
                for (position, cfrag) in cfrags.into_iter().enumerate() {
                    let capsule = &work_order.capsules[position];
                    let ok = primitive_adapter::verify_cfrag(
                        &cfrag,
                        capsule,
                        bob_verifying_key,
                        &ursula_vk,
                        &treasure_map.policy_encrypting_key,
                        bob_verifying_key,
                    );
                    if ok {
                        accepted.insert(position, cfrag);
                    } else {
                        tracing::warn!(operator = %work_order.ursula_address, "rejected invalid capsule fragment");
                    }
                }
                if accepted.len() < work_order.capsules.len() {
                    plan.update_errors(&work_order, "one or more capsule fragments failed verification");
                }
                plan.update(&work_order, accepted);
            }
            Ok(_) => {
                plan.update_errors(&work_order, "operator returned the wrong number of capsule fragments");
            }
            Err(err) => {
                plan.update_errors(&work_order, &err.to_string());
            }
        }
    }

    plan.results()
}
