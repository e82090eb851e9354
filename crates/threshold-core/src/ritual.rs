//! The on-chain-mirrored state of one DKG ritual.

use crate::treasure_map::OperatorAddr;
use serde::{Deserialize, Serialize};
use threshold_errors::{NodeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RitualStatus {
    NonInitiated,
    AwaitingTranscripts,
    AwaitingAggregations,
    Finalized,
    Timeout,
    Invalid,
}

impl RitualStatus {
    /// Whether a ritual in this status can ever change status again.
    pub fn is_terminal(self) -> bool {
        matches!(self, RitualStatus::Finalized | RitualStatus::Timeout | RitualStatus::Invalid)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ritual {
    pub id: u32,
    pub initiator: OperatorAddr,
    pub nodes: Vec<OperatorAddr>,
    pub threshold: usize,
    pub shares: usize,
    /// One slot per node, in `nodes` order; `Some` once that node has
    /// posted round 1.
    pub transcripts: Vec<Option<Vec<u8>>>,
    /// One slot per node, in `nodes` order; `Some` once that node has
    /// posted round 2.
    pub aggregations: Vec<Option<Vec<u8>>>,
    pub public_key: Option<Vec<u8>>,
    pub status: RitualStatus,
}

impl Ritual {
    pub fn new(id: u32, initiator: OperatorAddr, nodes: Vec<OperatorAddr>, threshold: usize) -> Result<Self> {
        let shares = nodes.len();
        if threshold == 0 || threshold > shares {
            return Err(NodeError::InvalidRitualState {
                ritual_id: id,
                reason: format!("threshold {threshold} must be in 1..={shares}"),
            });
        }
        Ok(Ritual {
            id,
            initiator,
            transcripts: vec![None; shares],
            aggregations: vec![None; shares],
            threshold,
            shares,
            nodes,
            public_key: None,
            status: RitualStatus::NonInitiated,
        })
    }

    pub fn node_index(&self, node: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n == node)
    }

    pub fn has_posted_transcript(&self, node: &str) -> bool {
        self.node_index(node).and_then(|i| self.transcripts[i].as_ref()).is_some()
    }

    pub fn has_posted_aggregation(&self, node: &str) -> bool {
        self.node_index(node).and_then(|i| self.aggregations[i].as_ref()).is_some()
    }

    pub fn all_transcripts_present(&self) -> bool {
        self.transcripts.iter().all(Option::is_some)
    }

    /// Move to `next`, refusing any transition out of a terminal status.
    pub fn transition(&mut self, next: RitualStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(NodeError::InvalidRitualState {
                ritual_id: self.id,
                reason: format!("ritual already terminal at {:?}", self.status),
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(n: usize) -> Vec<OperatorAddr> {
        (0..n).map(|i| format!("0x{i:040x}")).collect()
    }

    #[test]
    fn shares_equals_node_count() {
        let ritual = Ritual::new(1, nodes(1)[0].clone(), nodes(4), 3).unwrap();
        assert_eq!(ritual.shares, 4);
        assert_eq!(ritual.transcripts.len(), 4);
    }

    #[test]
    fn rejects_threshold_above_shares() {
        assert!(Ritual::new(1, nodes(1)[0].clone(), nodes(2), 3).is_err());
    }

    #[test]
    fn finalized_ritual_cannot_transition_again() {
        let mut ritual = Ritual::new(1, nodes(1)[0].clone(), nodes(2), 2).unwrap();
        ritual.transition(RitualStatus::AwaitingTranscripts).unwrap();
        ritual.transition(RitualStatus::Finalized).unwrap();
        assert!(ritual.transition(RitualStatus::Timeout).is_err());
    }
}
