//! The comparable value domain for condition return-value tests.
//!
//! Permitted types per the validation rules: booleans, signed/unsigned
//! integers, addresses and bytes (both as hex strings), and ordered
//! sequences of these, recursively.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Bool(bool),
    Int(i128),
    /// Hex-encoded address or bytes value (`0x...`). Kept as a string so we
    /// never lose leading zeroes or need to know the byte width up front.
    HexString(String),
    Sequence(Vec<ConditionValue>),
}

impl ConditionValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ConditionValue::Bool(_) => "bool",
            ConditionValue::Int(_) => "int",
            ConditionValue::HexString(_) => "hex",
            ConditionValue::Sequence(_) => "sequence",
        }
    }

    /// Project the `index`-th element out of a tuple/sequence return value.
    pub fn project(&self, index: usize) -> Option<ConditionValue> {
        match self {
            ConditionValue::Sequence(items) => items.get(index).cloned(),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for ConditionValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => ConditionValue::Bool(b),
            serde_json::Value::Number(n) => {
                ConditionValue::Int(n.as_i64().map(i128::from).unwrap_or_default())
            }
            serde_json::Value::String(s) => ConditionValue::HexString(s),
            serde_json::Value::Array(items) => {
                ConditionValue::Sequence(items.into_iter().map(ConditionValue::from).collect())
            }
            _ => ConditionValue::HexString(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_tuple_index() {
        let seq = ConditionValue::Sequence(vec![ConditionValue::Int(1), ConditionValue::Int(2)]);
        assert_eq!(seq.project(1), Some(ConditionValue::Int(2)));
        assert_eq!(seq.project(5), None);
    }
}
