//! Async evaluation of a parsed [`ConditionTree`] against a [`ChainInterface`]
//! and a request [`Context`].
//!
//! Evaluation walks the tree left to right, short-circuiting `and`/`or` the
//! way Python's `functools.reduce` over `operator.and_`/`operator.or_` would:
//! the right side of an `and` is never evaluated once the left side fails,
//! and the right side of an `or` is never evaluated once the left side
//! passes. The leaf index reported on failure is whichever leaf was last
//! evaluated and failed — not necessarily the first leaf in the tree.

use crate::comparator::Comparator;
use crate::context::{self, Context};
use crate::leaf::{ContractCondition, LeafCondition, ReturnValueTest, RpcCondition, TimeCondition};
use crate::tree::{ConditionTree, Operator};
use crate::value::ConditionValue;
use chain_interface::ChainInterface;
use threshold_errors::{NodeError, Result};

/// Evaluate `tree` and return `Ok(())` if access is granted, or
/// `Err(NodeError::ConditionsNotSatisfied(leaf_index))` naming the leaf
/// that failed.
pub async fn evaluate(
    tree: &ConditionTree,
    chain: &dyn ChainInterface,
    context: &Context,
) -> Result<()> {
    match eval_tree(tree, chain, context).await? {
        None => Ok(()),
        Some(leaf_index) => Err(NodeError::ConditionsNotSatisfied(leaf_index)),
    }
}

/// `None` means the subtree passed; `Some(leaf_index)` names the failing leaf.
async fn eval_tree(
    tree: &ConditionTree,
    chain: &dyn ChainInterface,
    context: &Context,
) -> Result<Option<usize>> {
    match tree {
        ConditionTree::Leaf { condition, leaf_index } => {
            if eval_leaf(condition, chain, context).await? {
                Ok(None)
            } else {
                Ok(Some(*leaf_index))
            }
        }
        ConditionTree::Compound(Operator::And, left, right) => {
            match Box::pin(eval_tree(left, chain, context)).await? {
                Some(idx) => Ok(Some(idx)),
                None => Box::pin(eval_tree(right, chain, context)).await,
            }
        }
        ConditionTree::Compound(Operator::Or, left, right) => {
            match Box::pin(eval_tree(left, chain, context)).await? {
                None => Ok(None),
                Some(_) => Box::pin(eval_tree(right, chain, context)).await,
            }
        }
    }
}

async fn eval_leaf(leaf: &LeafCondition, chain: &dyn ChainInterface, context: &Context) -> Result<bool> {
    match leaf {
        LeafCondition::Time(time) => eval_time(time, chain, context).await,
        LeafCondition::Rpc(rpc) => eval_rpc(rpc, chain, context).await,
        LeafCondition::Contract(contract) => eval_contract(contract, chain, context).await,
    }
}

async fn eval_time(time: &TimeCondition, chain: &dyn ChainInterface, context: &Context) -> Result<bool> {
    let timestamp = chain.block_timestamp(time.chain).await?;
    run_test(&time.return_value_test, ConditionValue::Int(timestamp as i128), context)
}

async fn eval_rpc(rpc: &RpcCondition, chain: &dyn ChainInterface, context: &Context) -> Result<bool> {
    let params = context::resolve_params(&rpc.params, context)?;
    let result = chain
        .rpc_call(rpc.chain, &rpc.method, serde_json::Value::Array(params))
        .await?;
    let value = project(ConditionValue::from(result), rpc.return_value_test.index);
    run_test(&rpc.return_value_test, value, context)
}

async fn eval_contract(contract: &ContractCondition, chain: &dyn ChainInterface, context: &Context) -> Result<bool> {
    let abi = contract.resolve_abi()?;
    let params = context::resolve_params(&contract.params, context)?;
    let args: Vec<ConditionValue> = params.into_iter().map(ConditionValue::from).collect();
    let calldata = abi.encode_call(&args)?;
    let returned = chain.eth_call(contract.chain, &contract.address, &calldata).await?;
    let value = abi.decode_outputs(&returned, contract.return_value_test.index)?;
    run_test(&contract.return_value_test, value, context)
}

fn project(value: ConditionValue, index: Option<usize>) -> ConditionValue {
    match index {
        Some(i) => value.project(i).unwrap_or(value),
        None => value,
    }
}

fn run_test(test: &ReturnValueTest, left: ConditionValue, context: &Context) -> Result<bool> {
    let right = context::resolve_condition_value(&test.value, context)?;
    test.comparator.eval(&left, &right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::{ContractCondition, RpcCondition, TimeCondition};
    use crate::tree::LingoElement;
    use chain_interface::MockChainInterface;
    use serde_json::Value;

    fn rvt(comparator: Comparator, value: Value) -> ReturnValueTest {
        ReturnValueTest { comparator, value, index: None }
    }

    #[tokio::test]
    async fn time_condition_passes_when_deadline_reached() {
        let tree = ConditionTree::parse(&[LingoElement::Leaf(LeafCondition::Time(TimeCondition {
            chain: 1,
            return_value_test: rvt(Comparator::Ge, Value::from(1_700_000_000)),
        }))])
        .unwrap();
        let chain = MockChainInterface::new().with_timestamp(1, 1_700_000_001);
        assert!(evaluate(&tree, &chain, &Context::new()).await.is_ok());
    }

    #[tokio::test]
    async fn time_condition_fails_before_deadline() {
        let tree = ConditionTree::parse(&[LingoElement::Leaf(LeafCondition::Time(TimeCondition {
            chain: 1,
            return_value_test: rvt(Comparator::Ge, Value::from(1_700_000_000)),
        }))])
        .unwrap();
        let chain = MockChainInterface::new().with_timestamp(1, 100);
        let err = evaluate(&tree, &chain, &Context::new()).await.unwrap_err();
        assert!(matches!(err, NodeError::ConditionsNotSatisfied(0)));
    }

    #[tokio::test]
    async fn or_short_circuits_on_first_pass() {
        use crate::tree::Operator;
        let elements = vec![
            LingoElement::Leaf(LeafCondition::Time(TimeCondition {
                chain: 1,
                return_value_test: rvt(Comparator::Ge, Value::from(0)),
            })),
            LingoElement::Operator { operator: Operator::Or },
            LingoElement::Leaf(LeafCondition::Rpc(RpcCondition {
                chain: 99,
                method: "eth_getBalance".into(),
                params: vec![],
                return_value_test: rvt(Comparator::Eq, Value::Bool(true)),
            })),
        ];
        let tree = ConditionTree::parse(&elements).unwrap();
        // chain 99 is unsupported; if the right leaf were evaluated this would error.
        let chain = MockChainInterface::new().with_timestamp(1, 1_700_000_000);
        assert!(evaluate(&tree, &chain, &Context::new()).await.is_ok());
    }

    #[tokio::test]
    async fn and_reports_failing_right_leaf() {
        use crate::tree::Operator;
        let elements = vec![
            LingoElement::Leaf(LeafCondition::Time(TimeCondition {
                chain: 1,
                return_value_test: rvt(Comparator::Ge, Value::from(0)),
            })),
            LingoElement::Operator { operator: Operator::And },
            LingoElement::Leaf(LeafCondition::Contract(ContractCondition {
                chain: 1,
                address: "0x0000000000000000000000000000000000000001".into(),
                standard_contract_type: Some(crate::abi::StandardContractType::Erc20),
                function_abi: None,
                method: "balanceOf".into(),
                params: vec![Value::String(
                    "0x0000000000000000000000000000000000000002".into(),
                )],
                return_value_test: rvt(Comparator::Ge, Value::from(100)),
            })),
        ];
        let tree = ConditionTree::parse(&elements).unwrap();
        let mut ret = vec![0u8; 32];
        ret[31] = 1;
        let chain = MockChainInterface::new()
            .with_timestamp(1, 1_700_000_000)
            .with_call_result(1, "0x0000000000000000000000000000000000000001", ret);
        let err = evaluate(&tree, &chain, &Context::new()).await.unwrap_err();
        assert!(matches!(err, NodeError::ConditionsNotSatisfied(1)));
    }

    #[tokio::test]
    async fn missing_context_variable_propagates_as_error() {
        let tree = ConditionTree::parse(&[LingoElement::Leaf(LeafCondition::Time(TimeCondition {
            chain: 1,
            return_value_test: rvt(Comparator::Ge, Value::String(":deadline".into())),
        }))])
        .unwrap();
        let chain = MockChainInterface::new().with_timestamp(1, 1_700_000_000);
        let err = evaluate(&tree, &chain, &Context::new()).await.unwrap_err();
        assert!(matches!(err, NodeError::RequiredInput(name) if name == "deadline"));
    }
}
