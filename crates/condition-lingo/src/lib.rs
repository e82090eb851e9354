//! Boolean condition DSL evaluated against on-chain state and time, gating
//! every reencryption and decryption-share operation.

mod abi;
mod comparator;
mod context;
mod evaluator;
mod leaf;
mod tree;
mod value;

pub use abi::{AbiType, FunctionAbi, StandardContractType};
pub use comparator::Comparator;
pub use context::{is_context_variable, Context};
pub use evaluator::evaluate;
pub use leaf::{ContractCondition, LeafCondition, ReturnValueTest, RpcCondition, TimeCondition};
pub use tree::{ConditionTree, LingoElement, Operator};
pub use value::ConditionValue;

use threshold_errors::Result;

/// Parse the flat wire-format list into a tree, ready for [`evaluate`].
pub fn parse(elements: &[LingoElement]) -> Result<ConditionTree> {
    ConditionTree::parse(elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_interface::MockChainInterface;
    use serde_json::json;

    #[tokio::test]
    async fn parses_and_evaluates_from_json() {
        let raw = json!([
            { "condition_type": "time", "chain": 1, "return_value_test": { "comparator": ">=", "value": 0 } }
        ]);
        let elements: Vec<LingoElement> = serde_json::from_value(raw).unwrap();
        let tree = parse(&elements).unwrap();
        let chain = MockChainInterface::new().with_timestamp(1, 1_700_000_000);
        assert!(evaluate(&tree, &chain, &Context::new()).await.is_ok());
    }
}
