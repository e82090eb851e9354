//! The flat, alternating wire format and its parse into a left-leaning tree.
//!
//! Dynamic dispatch over a condition tree is avoided in favor of a closed
//! sum type: `Condition = Leaf | Compound(Operator, Box<Condition>,
//! Box<Condition>)`. The wire format stays the flat "odd length,
//! alternating leaf/operator" list described by the data model.

use crate::leaf::LeafCondition;
use serde::{Deserialize, Serialize};
use threshold_errors::{NodeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    And,
    Or,
}

/// One element of the flat wire-format list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LingoElement {
    Leaf(LeafCondition),
    Operator { operator: Operator },
}

/// A parsed condition tree, ready for evaluation.
#[derive(Debug, Clone)]
pub enum ConditionTree {
    Leaf {
        condition: LeafCondition,
        /// Position of this leaf among all leaves, left to right — used to
        /// report which leaf failed.
        leaf_index: usize,
    },
    Compound(Operator, Box<ConditionTree>, Box<ConditionTree>),
}

impl ConditionTree {
    /// Parse and validate the flat wire-format list described in the data
    /// model: odd length, alternating leaf/operator/leaf/...
    pub fn parse(elements: &[LingoElement]) -> Result<Self> {
        if elements.is_empty() || elements.len() % 2 == 0 {
            return Err(NodeError::InvalidCondition(
                "condition lingo must have odd length".into(),
            ));
        }

        let mut leaf_index = 0usize;
        let mut leaves_and_ops: Vec<Either> = Vec::with_capacity(elements.len());
        for (i, element) in elements.iter().enumerate() {
            match element {
                LingoElement::Leaf(leaf) => {
                    if i % 2 != 0 {
                        return Err(NodeError::InvalidCondition(format!(
                            "element {i} must be an operator"
                        )));
                    }
                    leaf.validate()?;
                    leaves_and_ops.push(Either::Leaf(leaf.clone(), leaf_index));
                    leaf_index += 1;
                }
                LingoElement::Operator { operator } => {
                    if i % 2 == 0 {
                        return Err(NodeError::InvalidCondition(format!(
                            "element {i} must be a condition"
                        )));
                    }
                    leaves_and_ops.push(Either::Op(*operator));
                }
            }
        }

        // Fold left-to-right into a left-leaning tree: (((l0 op0 l1) op1 l2) ...)
        let mut iter = leaves_and_ops.into_iter();
        let first = match iter.next() {
            Some(Either::Leaf(leaf, idx)) => ConditionTree::Leaf {
                condition: leaf,
                leaf_index: idx,
            },
            _ => unreachable!("validated to start with a leaf"),
        };

        let mut tree = first;
        loop {
            let op = match iter.next() {
                Some(Either::Op(op)) => op,
                Some(Either::Leaf(..)) => unreachable!("validated alternation"),
                None => break,
            };
            let leaf = match iter.next() {
                Some(Either::Leaf(leaf, idx)) => ConditionTree::Leaf {
                    condition: leaf,
                    leaf_index: idx,
                },
                _ => unreachable!("validated alternation"),
            };
            tree = ConditionTree::Compound(op, Box::new(tree), Box::new(leaf));
        }

        Ok(tree)
    }
}

enum Either {
    Leaf(LeafCondition, usize),
    Op(Operator),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::Comparator;
    use crate::leaf::{ReturnValueTest, TimeCondition};
    use serde_json::Value;

    fn time_leaf(v: i64) -> LingoElement {
        LingoElement::Leaf(LeafCondition::Time(TimeCondition {
            chain: 1,
            return_value_test: ReturnValueTest {
                comparator: Comparator::Lt,
                value: Value::from(v),
                index: None,
            },
        }))
    }

    #[test]
    fn rejects_even_length() {
        let elements = vec![time_leaf(0), LingoElement::Operator { operator: Operator::And }];
        assert!(ConditionTree::parse(&elements).is_err());
    }

    #[test]
    fn parses_single_leaf() {
        let elements = vec![time_leaf(0)];
        let tree = ConditionTree::parse(&elements).unwrap();
        assert!(matches!(tree, ConditionTree::Leaf { leaf_index: 0, .. }));
    }

    #[test]
    fn parses_left_leaning_tree() {
        let elements = vec![
            time_leaf(0),
            LingoElement::Operator { operator: Operator::Or },
            time_leaf(1),
            LingoElement::Operator { operator: Operator::And },
            time_leaf(2),
        ];
        let tree = ConditionTree::parse(&elements).unwrap();
        match tree {
            ConditionTree::Compound(Operator::And, left, right) => {
                assert!(matches!(*right, ConditionTree::Leaf { leaf_index: 2, .. }));
                assert!(matches!(*left, ConditionTree::Compound(Operator::Or, _, _)));
            }
            _ => panic!("expected a left-leaning compound tree"),
        }
    }
}
