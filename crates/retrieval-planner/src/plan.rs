//! Client-side scheduling of reencryption work orders: which operator to
//! contact next, for which capsules, and how results accumulate toward
//! each capsule's threshold.

use condition_lingo::LingoElement;
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet, VecDeque};
use threshold_core::{CapsuleFragment, OperatorAddr, TreasureMap};
use umbral_pre::Capsule;

/// One capsule's retrieval request, carrying whatever operators the caller
/// has already queried for it (e.g. from a prior, partially-successful
/// retrieval attempt).
#[derive(Debug, Clone)]
pub struct RetrievalKit {
    pub capsule: Capsule,
    pub conditions: Option<Vec<LingoElement>>,
    pub queried_addresses: HashSet<OperatorAddr>,
}

#[derive(Debug, Clone)]
pub struct RetrievalWorkOrder {
    pub ursula_address: OperatorAddr,
    /// Indices into the plan's original capsule order.
    pub capsule_indices: Vec<usize>,
    pub capsules: Vec<Capsule>,
    pub conditions: Vec<Option<Vec<LingoElement>>>,
}

#[derive(Debug)]
pub struct RetrievalPlan {
    capsules: Vec<Capsule>,
    conditions: Vec<Option<Vec<LingoElement>>>,
    threshold: usize,
    results: Vec<HashMap<OperatorAddr, CapsuleFragment>>,
    errors: Vec<HashMap<OperatorAddr, String>>,
    queried_addresses: Vec<HashSet<OperatorAddr>>,
    processed_capsules: HashMap<OperatorAddr, HashSet<usize>>,
    pick_order: VecDeque<OperatorAddr>,
}

impl RetrievalPlan {
    pub fn new(treasure_map: &TreasureMap, kits: Vec<RetrievalKit>) -> Self {
        let n = kits.len();
        let mut capsules = Vec::with_capacity(n);
        let mut conditions = Vec::with_capacity(n);
        let mut queried_addresses = Vec::with_capacity(n);
        let mut processed_capsules: HashMap<OperatorAddr, HashSet<usize>> = HashMap::new();
        let mut contact_last: HashSet<OperatorAddr> = HashSet::new();

        for (i, kit) in kits.into_iter().enumerate() {
            capsules.push(kit.capsule);
            conditions.push(kit.conditions);
            for addr in &kit.queried_addresses {
                processed_capsules.entry(addr.clone()).or_default().insert(i);
                contact_last.insert(addr.clone());
            }
            queried_addresses.push(kit.queried_addresses);
        }

        let mut pick_order: Vec<OperatorAddr> = treasure_map.destinations.keys().cloned().collect();
        pick_order.shuffle(&mut rand::thread_rng());
        // Partition, preserving the random order established by the single
        // shuffle above within each half.
        let (first, last): (Vec<_>, Vec<_>) = pick_order.into_iter().partition(|a| !contact_last.contains(a));
        let pick_order: VecDeque<OperatorAddr> = first.into_iter().chain(last).collect();

        RetrievalPlan {
            results: vec![HashMap::new(); n],
            errors: vec![HashMap::new(); n],
            threshold: treasure_map.threshold,
            capsules,
            conditions,
            queried_addresses,
            processed_capsules,
            pick_order,
        }
    }

    /// Pop the next operator with unanswered, still-needed work, skipping
    /// operators with nothing left to contribute. `None` once the plan has
    /// no more candidates — callers should check `is_complete` first.
    pub fn get_work_order(&mut self) -> Option<RetrievalWorkOrder> {
        while let Some(address) = self.pick_order.pop_front() {
            let processed = self.processed_capsules.get(&address);
            let indices: Vec<usize> = (0..self.capsules.len())
                .filter(|&i| {
                    !processed.map(|p| p.contains(&i)).unwrap_or(false)
                        && self.queried_addresses[i].len() < self.threshold
                })
                .collect();
            if indices.is_empty() {
                continue;
            }
            let capsules = indices.iter().map(|&i| self.capsules[i].clone()).collect();
            let conditions = indices.iter().map(|&i| self.conditions[i].clone()).collect();
            return Some(RetrievalWorkOrder { ursula_address: address, capsule_indices: indices, capsules, conditions });
        }
        None
    }

    pub fn is_complete(&self) -> bool {
        self.pick_order.is_empty() || self.queried_addresses.iter().all(|s| s.len() >= self.threshold)
    }

    /// Record cfrags obtained for a work order, keyed by position within
    /// `work_order.capsule_indices`.
    pub fn update(&mut self, work_order: &RetrievalWorkOrder, cfrags: HashMap<usize, CapsuleFragment>) {
        for (position, cfrag) in cfrags {
            let capsule_index = work_order.capsule_indices[position];
            self.queried_addresses[capsule_index].insert(work_order.ursula_address.clone());
            self.processed_capsules
                .entry(work_order.ursula_address.clone())
                .or_default()
                .insert(capsule_index);
            self.results[capsule_index].insert(work_order.ursula_address.clone(), cfrag);
        }
    }

    pub fn update_errors(&mut self, work_order: &RetrievalWorkOrder, error_message: &str) {
        for &capsule_index in &work_order.capsule_indices {
            self.errors[capsule_index]
                .insert(work_order.ursula_address.clone(), error_message.to_string());
        }
    }

    /// Results and errors in the original capsule order.
    pub fn results(self) -> (Vec<HashMap<OperatorAddr, CapsuleFragment>>, Vec<HashMap<OperatorAddr, String>>) {
        (self.results, self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn dummy_capsule() -> Capsule {
        let pk = umbral_pre::SecretKey::random().public_key();
        umbral_pre::encrypt(&pk, b"x").unwrap().0
    }

    fn map_with_destinations(addrs: &[&str], threshold: usize) -> TreasureMap {
        let sk = umbral_pre::SecretKey::random();
        let pk = sk.public_key();
        let mut destinations = BTreeMap::new();
        for addr in addrs {
            destinations.insert(addr.to_string(), dummy_encrypted_kfrag(pk));
        }
        TreasureMap::new(threshold_core::Hrac([0u8; 32]), threshold, addrs.len(), destinations, pk, pk).unwrap()
    }

    fn dummy_encrypted_kfrag(pk: umbral_pre::PublicKey) -> threshold_core::EncryptedKeyFrag {
        let (capsule, ciphertext) = umbral_pre::encrypt(&pk, b"kfrag").unwrap();
        let signer = umbral_pre::Signer::new(umbral_pre::SecretKey::random());
        let signature = signer.sign(&ciphertext);
        threshold_core::EncryptedKeyFrag {
            hrac: threshold_core::Hrac([0u8; 32]),
            capsule,
            ciphertext: ciphertext.to_vec(),
            publisher_verifying_key: pk,
            signature,
        }
    }

    #[test]
    fn fairness_no_operator_contacted_twice() {
        let map = map_with_destinations(&["a", "b", "c"], 2);
        let kit = RetrievalKit { capsule: dummy_capsule(), conditions: None, queried_addresses: HashSet::new() };
        let mut plan = RetrievalPlan::new(&map, vec![kit]);

        let mut contacted = HashSet::new();
        while !plan.is_complete() {
            let Some(wo) = plan.get_work_order() else { break };
            assert!(contacted.insert(wo.ursula_address.clone()), "operator contacted twice");
            plan.update_errors(&wo, "simulated failure");
        }
    }

    #[test]
    fn stops_once_threshold_reached() {
        let map = map_with_destinations(&["a", "b", "c"], 1);
        let kit = RetrievalKit { capsule: dummy_capsule(), conditions: None, queried_addresses: HashSet::new() };
        let mut plan = RetrievalPlan::new(&map, vec![kit]);

        let wo = plan.get_work_order().unwrap();
        let cfrag_source_kfrag = {
            let sk = umbral_pre::SecretKey::random();
            umbral_pre::generate_kfrags(&sk, &sk.public_key(), &umbral_pre::Signer::new(sk.clone()), 1, 1, false, false)
        };
        let cfrag = primitive_adapter::reencrypt(&cfrag_source_kfrag[0], &wo.capsules[0]);
        let mut cfrags = HashMap::new();
        cfrags.insert(0, cfrag);
        plan.update(&wo, cfrags);

        assert!(plan.is_complete());
    }

    #[test]
    fn previously_queried_addresses_are_demoted() {
        let map = map_with_destinations(&["a", "b"], 2);
        let mut queried = HashSet::new();
        queried.insert("a".to_string());
        let kit = RetrievalKit { capsule: dummy_capsule(), conditions: None, queried_addresses: queried };
        let mut plan = RetrievalPlan::new(&map, vec![kit]);
        // "a" already answered for this capsule; the only real work left is "b".
        let wo = plan.get_work_order().unwrap();
        assert_eq!(wo.ursula_address, "b");
    }

    proptest! {
        /// No operator is ever handed a second work order for a capsule it
        /// already failed, across arbitrary operator counts and thresholds.
        #[test]
        fn fairness_holds_for_any_operator_count_and_threshold(n_operators in 2usize..8, raw_threshold in 1usize..6) {
            let threshold = raw_threshold.min(n_operators);
            let addrs: Vec<String> = (0..n_operators).map(|i| format!("op{i}")).collect();
            let addr_refs: Vec<&str> = addrs.iter().map(|s| s.as_str()).collect();
            let map = map_with_destinations(&addr_refs, threshold);
            let kit = RetrievalKit { capsule: dummy_capsule(), conditions: None, queried_addresses: HashSet::new() };
            let mut plan = RetrievalPlan::new(&map, vec![kit]);

            let mut contacted = HashSet::new();
            let mut rounds = 0usize;
            while !plan.is_complete() {
                let Some(wo) = plan.get_work_order() else { break };
                prop_assert!(contacted.insert(wo.ursula_address.clone()), "operator contacted twice");
                plan.update_errors(&wo, "simulated failure");
                rounds += 1;
                prop_assert!(rounds <= n_operators);
            }
        }
    }
}
