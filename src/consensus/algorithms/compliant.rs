//! Compliant quorum node
//! Accepts a transaction only when enough distinct, still-trusted followees
//! propose it in the same round. The required fraction tightens over rounds.

use crate::consensus::reliability::PeerReliabilityTracker;
use crate::consensus::threshold::ThresholdSchedule;
use crate::consensus::traits::Node;
use crate::consensus::types::{Candidate, NodeParams, NodeState, Transaction};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct QuorumConsensusNode {
    id: Option<usize>,
    params: NodeParams,
    schedule: ThresholdSchedule,
    tracker: PeerReliabilityTracker,
    followees_set: bool,
    round: usize,
    beliefs: HashSet<Transaction>,
}

impl QuorumConsensusNode {
    pub fn new(params: NodeParams) -> Self {
        let params = NodeParams::new(
            params.graph_density,
            params.malicious_fraction,
            params.tx_distribution,
            params.num_rounds,
        );
        Self {
            id: None,
            schedule: ThresholdSchedule::from_estimates(
                params.malicious_fraction,
                params.num_rounds,
            ),
            params,
            tracker: PeerReliabilityTracker::new(),
            followees_set: false,
            round: 0,
            beliefs: HashSet::new(),
        }
    }

    /// Peer index used as logging context only
    pub fn with_id(mut self, id: usize) -> Self {
        self.id = Some(id);
        self
    }

    /// Replace the schedule derived from the estimates
    pub fn with_schedule(mut self, schedule: ThresholdSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn params(&self) -> &NodeParams {
        &self.params
    }

    pub fn schedule(&self) -> &ThresholdSchedule {
        &self.schedule
    }

    pub fn tracker(&self) -> &PeerReliabilityTracker {
        &self.tracker
    }

    pub fn beliefs(&self) -> &HashSet<Transaction> {
        &self.beliefs
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn active_followees(&self) -> usize {
        self.tracker.active_count()
    }

    pub fn state(&self) -> NodeState {
        if self.round > 0 {
            NodeState::RoundActive
        } else if self.followees_set {
            NodeState::Seeded
        } else {
            NodeState::Uninitialized
        }
    }

    /// Group accepted candidates by transaction, counting each sender once.
    fn collect_support(
        &mut self,
        candidates: &[Candidate],
    ) -> HashMap<Transaction, HashSet<usize>> {
        let mut support: HashMap<Transaction, HashSet<usize>> = HashMap::new();
        for candidate in candidates {
            if !self.tracker.record_spoke(candidate.sender) {
                trace!(
                    node = ?self.id,
                    sender = candidate.sender,
                    tx = %candidate.tx,
                    "Discarding candidate from untrusted sender"
                );
                continue;
            }
            support
                .entry(candidate.tx)
                .or_insert_with(HashSet::new)
                .insert(candidate.sender);
        }
        support
    }
}

impl Node for QuorumConsensusNode {
    fn set_followees(&mut self, followees: &[bool]) {
        self.tracker.initialize(followees);
        self.followees_set = true;
        debug!(
            node = ?self.id,
            followees = self.tracker.total_count(),
            "Followees configured"
        );
    }

    fn seed_pending_transactions(&mut self, pending: &HashSet<Transaction>) {
        self.beliefs.extend(pending.iter().copied());
    }

    fn send_to_followers(&self) -> HashSet<Transaction> {
        self.beliefs.clone()
    }

    fn receive_from_followees(&mut self, candidates: &[Candidate]) {
        if self.tracker.total_count() == 0 {
            self.round += 1;
            return;
        }

        let support = self.collect_support(candidates);

        // Only after every candidate is counted, so one surviving message
        // is enough to keep a followee trusted.
        self.tracker.finalize_round();

        let active = self.tracker.active_count();
        let quorum = self.schedule.quorum(self.round, active);

        let next: HashSet<Transaction> = support
            .iter()
            .filter(|(_, supporters)| supporters.len() >= quorum)
            .map(|(tx, _)| *tx)
            .collect();

        if support.is_empty() && !self.beliefs.is_empty() {
            debug!(
                node = ?self.id,
                round = self.round,
                retained = self.beliefs.len(),
                "No candidates received, retaining beliefs"
            );
        } else {
            debug!(
                node = ?self.id,
                round = self.round,
                active,
                quorum,
                candidates = support.len(),
                accepted = next.len(),
                "Round processed"
            );
            self.beliefs = next;
        }

        self.round += 1;
    }

    fn name(&self) -> &str {
        "Compliant (Adaptive Quorum)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(followees: &[bool], schedule: ThresholdSchedule) -> QuorumConsensusNode {
        let params = NodeParams::new(0.2, 0.3, 0.05, schedule.num_rounds());
        let mut node = QuorumConsensusNode::new(params).with_schedule(schedule);
        node.set_followees(followees);
        node
    }

    fn seed(node: &mut QuorumConsensusNode, ids: &[u64]) {
        let set: HashSet<Transaction> = ids.iter().map(|id| Transaction(*id)).collect();
        node.seed_pending_transactions(&set);
    }

    fn ids(set: &HashSet<Transaction>) -> Vec<u64> {
        let mut ids: Vec<u64> = set.iter().map(|tx| tx.id()).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_seed_is_union() {
        let mut node = node(&[true], ThresholdSchedule::new(0.4, 0.4, 1));
        seed(&mut node, &[1, 2]);
        seed(&mut node, &[2, 3]);
        assert_eq!(ids(&node.send_to_followers()), vec![1, 2, 3]);
    }

    #[test]
    fn test_state_transitions() {
        let mut node = QuorumConsensusNode::new(NodeParams::new(0.2, 0.3, 0.05, 5));
        assert_eq!(node.state(), NodeState::Uninitialized);
        node.set_followees(&[true, true]);
        assert_eq!(node.state(), NodeState::Seeded);
        node.receive_from_followees(&[]);
        assert_eq!(node.state(), NodeState::RoundActive);
    }

    #[test]
    fn test_duplicate_support_counts_once() {
        let mut node = node(&[true, true, true], ThresholdSchedule::new(0.4, 0.4, 1));
        let tx = Transaction(9);
        node.receive_from_followees(&[
            Candidate::new(tx, 0),
            Candidate::new(tx, 0),
            Candidate::new(Transaction(1), 1),
            Candidate::new(Transaction(1), 2),
        ]);
        // Quorum is ceil(0.4 * 3) = 2; tx 9 only has one distinct supporter.
        assert_eq!(ids(node.beliefs()), vec![1]);
    }

    #[test]
    fn test_out_of_range_and_non_followee_senders_ignored() {
        let mut node = node(&[true, false, true], ThresholdSchedule::new(0.4, 0.4, 1));
        let tx = Transaction(5);
        node.receive_from_followees(&[
            Candidate::new(tx, 0),
            Candidate::new(tx, 1),
            Candidate::new(tx, 17),
        ]);
        // Follower 2 was silent and is excluded, leaving one active followee.
        assert_eq!(node.active_followees(), 1);
        assert_eq!(ids(node.beliefs()), vec![5]);
        assert!(!node.tracker().is_excluded(1));
    }

    #[test]
    fn test_unsupported_beliefs_are_dropped() {
        let mut node = node(&[true, true], ThresholdSchedule::new(0.5, 0.5, 1));
        seed(&mut node, &[100]);
        node.receive_from_followees(&[
            Candidate::new(Transaction(1), 0),
            Candidate::new(Transaction(2), 1),
        ]);
        // Quorum is 1 of 2; tx 100 was never proposed.
        assert_eq!(ids(node.beliefs()), vec![1, 2]);
    }

    #[test]
    fn test_beliefs_may_shrink_to_empty() {
        let mut node = node(&[true, true, true], ThresholdSchedule::new(0.9, 0.9, 1));
        seed(&mut node, &[1]);
        node.receive_from_followees(&[
            Candidate::new(Transaction(1), 0),
            Candidate::new(Transaction(2), 1),
            Candidate::new(Transaction(3), 2),
        ]);
        assert!(node.beliefs().is_empty());
        assert_eq!(node.round(), 1);
    }

    #[test]
    fn test_excluded_sender_is_ignored_next_round() {
        let mut node = node(&[true, true, true], ThresholdSchedule::new(0.4, 0.4, 1));
        node.receive_from_followees(&[
            Candidate::new(Transaction(1), 0),
            Candidate::new(Transaction(1), 1),
        ]);
        assert!(node.tracker().is_excluded(2));

        node.receive_from_followees(&[
            Candidate::new(Transaction(2), 0),
            Candidate::new(Transaction(3), 2),
            Candidate::new(Transaction(3), 1),
        ]);
        // Quorum is ceil(0.4 * 2) = 1, sender 2 no longer counts.
        assert_eq!(ids(node.beliefs()), vec![2, 3]);
        assert_eq!(node.active_followees(), 2);
    }

    #[test]
    fn test_send_does_not_mutate() {
        let mut node = node(&[true], ThresholdSchedule::new(0.4, 0.4, 1));
        seed(&mut node, &[4]);
        let first = node.send_to_followers();
        let second = node.send_to_followers();
        assert_eq!(first, second);
        assert_eq!(node.round(), 0);
    }
}
