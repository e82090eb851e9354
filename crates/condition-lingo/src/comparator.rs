//! Comparators available to a `return_value_test`.

use crate::value::ConditionValue;
use serde::{Deserialize, Serialize};
use threshold_errors::{NodeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

impl Comparator {
    /// Sequences only support `==`/`!=`; anything else is a construction-time
    /// error caught by validation before this is ever called at eval time.
    pub fn supports_sequences(self) -> bool {
        matches!(self, Comparator::Eq | Comparator::Ne)
    }

    pub fn eval(self, left: &ConditionValue, right: &ConditionValue) -> Result<bool> {
        match (left, right) {
            (ConditionValue::Sequence(l), ConditionValue::Sequence(r)) => {
                if !self.supports_sequences() {
                    return Err(NodeError::InvalidCondition(
                        "sequences only support == and !=".into(),
                    ));
                }
                let equal = l == r;
                Ok(match self {
                    Comparator::Eq => equal,
                    Comparator::Ne => !equal,
                    _ => unreachable!("checked above"),
                })
            }
            (ConditionValue::Bool(l), ConditionValue::Bool(r)) => Ok(match self {
                Comparator::Eq => l == r,
                Comparator::Ne => l != r,
                _ => {
                    return Err(NodeError::InvalidCondition(
                        "bool only supports == and !=".into(),
                    ))
                }
            }),
            (ConditionValue::Int(l), ConditionValue::Int(r)) => Ok(match self {
                Comparator::Eq => l == r,
                Comparator::Ne => l != r,
                Comparator::Gt => l > r,
                Comparator::Lt => l < r,
                Comparator::Ge => l >= r,
                Comparator::Le => l <= r,
            }),
            (ConditionValue::HexString(l), ConditionValue::HexString(r)) => Ok(match self {
                Comparator::Eq => l.eq_ignore_ascii_case(r),
                Comparator::Ne => !l.eq_ignore_ascii_case(r),
                _ => {
                    return Err(NodeError::InvalidCondition(
                        "hex values only support == and !=".into(),
                    ))
                }
            }),
            _ => Err(NodeError::InvalidCondition(format!(
                "cannot compare {} to {}",
                left.type_name(),
                right.type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_ordering() {
        assert!(Comparator::Lt.eval(&ConditionValue::Int(1), &ConditionValue::Int(2)).unwrap());
        assert!(!Comparator::Gt.eval(&ConditionValue::Int(1), &ConditionValue::Int(2)).unwrap());
    }

    #[test]
    fn sequence_rejects_ordering_operators() {
        let seq = ConditionValue::Sequence(vec![ConditionValue::Int(1)]);
        assert!(Comparator::Gt.eval(&seq, &seq).is_err());
        assert!(Comparator::Eq.eval(&seq, &seq).unwrap());
    }
}
