//! Leaf condition types and their construction-time validation.

use crate::abi::{FunctionAbi, StandardContractType};
use crate::comparator::Comparator;
use crate::context::is_context_variable;
use crate::value::ConditionValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use threshold_errors::{NodeError, Result};

/// `return_value_test := { comparator, value, optional index }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnValueTest {
    pub comparator: Comparator,
    pub value: Value,
    #[serde(default)]
    pub index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeCondition {
    pub chain: u64,
    pub return_value_test: ReturnValueTest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcCondition {
    pub chain: u64,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
    pub return_value_test: ReturnValueTest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractCondition {
    pub chain: u64,
    pub address: String,
    #[serde(default)]
    pub standard_contract_type: Option<StandardContractType>,
    #[serde(default)]
    pub function_abi: Option<FunctionAbi>,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
    pub return_value_test: ReturnValueTest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "condition_type", rename_all = "camelCase")]
pub enum LeafCondition {
    Time(TimeCondition),
    Rpc(RpcCondition),
    Contract(ContractCondition),
}

impl LeafCondition {
    /// Static validation performed once, at construction time.
    pub fn validate(&self) -> Result<()> {
        match self {
            LeafCondition::Time(t) => validate_return_value_test(&t.return_value_test, None),
            LeafCondition::Rpc(rpc) => {
                if !rpc.method.starts_with("eth_") {
                    return Err(NodeError::InvalidCondition(format!(
                        "rpc method {} must start with eth_",
                        rpc.method
                    )));
                }
                validate_return_value_test(&rpc.return_value_test, None)
            }
            LeafCondition::Contract(c) => {
                let abi = c.resolve_abi()?;
                if c.standard_contract_type.is_none() && c.function_abi.is_none() {
                    return Err(NodeError::InvalidCondition(
                        "contract condition requires standard_contract_type or function_abi".into(),
                    ));
                }
                validate_return_value_test(&c.return_value_test, Some(abi.output_len()))
            }
        }
    }
}

impl ContractCondition {
    pub fn resolve_abi(&self) -> Result<FunctionAbi> {
        if let Some(abi) = &self.function_abi {
            return Ok(abi.clone());
        }
        let kind = self
            .standard_contract_type
            .ok_or_else(|| NodeError::InvalidCondition("missing standard_contract_type".into()))?;
        FunctionAbi::standard(kind, &self.method).ok_or_else(|| {
            NodeError::InvalidCondition(format!("no standard ABI for {:?}.{}", kind, self.method))
        })
    }
}

fn validate_return_value_test(test: &ReturnValueTest, output_len: Option<usize>) -> Result<()> {
    if let Some(index) = test.index {
        if let Some(len) = output_len {
            if index >= len {
                return Err(NodeError::InvalidCondition(format!(
                    "return_value_test index {index} out of bounds for tuple of length {len}"
                )));
            }
        }
    }

    // Context variables bypass the static type check; they are re-checked
    // at evaluation time against the resolved value.
    if is_context_variable(&test.value) {
        return Ok(());
    }

    match ConditionValue::from(test.value.clone()) {
        ConditionValue::Sequence(_) if !test.comparator.supports_sequences() => {
            Err(NodeError::InvalidCondition(
                "sequence comparisons only support == and !=".into(),
            ))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::Comparator;

    fn rvt(value: Value) -> ReturnValueTest {
        ReturnValueTest {
            comparator: Comparator::Eq,
            value,
            index: None,
        }
    }

    #[test]
    fn rpc_method_must_start_with_eth() {
        let cond = LeafCondition::Rpc(RpcCondition {
            chain: 1,
            method: "getBalance".into(),
            params: vec![],
            return_value_test: rvt(Value::Bool(true)),
        });
        assert!(cond.validate().is_err());
    }

    #[test]
    fn contract_requires_type_or_abi() {
        let cond = LeafCondition::Contract(ContractCondition {
            chain: 1,
            address: "0x0".into(),
            standard_contract_type: None,
            function_abi: None,
            method: "balanceOf".into(),
            params: vec![],
            return_value_test: rvt(Value::from(1)),
        });
        assert!(cond.validate().is_err());
    }

    #[test]
    fn tuple_index_out_of_bounds_rejected() {
        let cond = LeafCondition::Contract(ContractCondition {
            chain: 1,
            address: "0x0".into(),
            standard_contract_type: Some(StandardContractType::Erc20),
            function_abi: None,
            method: "balanceOf".into(),
            params: vec![],
            return_value_test: ReturnValueTest {
                comparator: Comparator::Eq,
                value: Value::from(1),
                index: Some(5),
            },
        });
        assert!(cond.validate().is_err());
    }

    #[test]
    fn context_variable_bypasses_static_check() {
        let cond = LeafCondition::Time(TimeCondition {
            chain: 1,
            return_value_test: rvt(Value::String(":deadline".into())),
        });
        assert!(cond.validate().is_ok());
    }
}
