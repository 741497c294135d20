//! Follow graph and initial transaction seeding.

use crate::consensus::Transaction;
use rand::Rng;
use std::collections::HashSet;

/// Seed pool size is `p_tx * SEED_SCALE`, rounded, at least 1.
pub const SEED_SCALE: f64 = 1000.0;

/// Probability that a node receives any seed transactions at all.
pub const SEEDED_NODE_PROBABILITY: f64 = 0.8;

/// Directed follow relation. `edges[followee][follower]` is true when
/// `follower` receives everything `followee` emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowGraph {
    edges: Vec<Vec<bool>>,
}

impl FollowGraph {
    /// Graph with no edges
    pub fn empty(num_nodes: usize) -> Self {
        FollowGraph {
            edges: vec![vec![false; num_nodes]; num_nodes],
        }
    }

    /// Each ordered pair (followee, follower) with followee != follower gets
    /// an edge with probability `p_graph`.
    pub fn random(num_nodes: usize, p_graph: f64, rng: &mut impl Rng) -> Self {
        let mut graph = Self::empty(num_nodes);
        for follower in 0..num_nodes {
            for followee in 0..num_nodes {
                if follower == followee {
                    continue;
                }
                if rng.gen::<f64>() < p_graph {
                    graph.edges[followee][follower] = true;
                }
            }
        }
        graph
    }

    pub fn num_nodes(&self) -> usize {
        self.edges.len()
    }

    pub fn add_edge(&mut self, followee: usize, follower: usize) {
        if followee != follower && followee < self.num_nodes() && follower < self.num_nodes() {
            self.edges[followee][follower] = true;
        }
    }

    pub fn follows(&self, follower: usize, followee: usize) -> bool {
        self.edges
            .get(followee)
            .and_then(|row| row.get(follower))
            .copied()
            .unwrap_or(false)
    }

    /// Membership vector handed to `Node::set_followees`
    pub fn followees_of(&self, follower: usize) -> Vec<bool> {
        (0..self.num_nodes())
            .map(|followee| self.follows(follower, followee))
            .collect()
    }

    pub fn followers_of(&self, followee: usize) -> Vec<usize> {
        (0..self.num_nodes())
            .filter(|follower| self.follows(*follower, followee))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.edges
            .iter()
            .map(|row| row.iter().filter(|e| **e).count())
            .sum()
    }
}

/// Valid transactions and each node's starting subset of them.
#[derive(Debug, Clone)]
pub struct SeedPlan {
    pub valid: Vec<Transaction>,
    pub per_node: Vec<HashSet<Transaction>>,
}

/// Draw the valid pool `1..=count` and hand most nodes a few of them.
pub fn seed_transactions(num_nodes: usize, p_tx: f64, rng: &mut impl Rng) -> SeedPlan {
    let count = ((p_tx * SEED_SCALE).round() as usize).max(1);
    let valid: Vec<Transaction> = (1..=count as u64).map(Transaction).collect();

    let per_node = (0..num_nodes)
        .map(|_| {
            let mut init = HashSet::new();
            if rng.gen::<f64>() < SEEDED_NODE_PROBABILITY {
                let take = 1 + rng.gen_range(0..(count / 10 + 1));
                for _ in 0..take {
                    init.insert(valid[rng.gen_range(0..valid.len())]);
                }
            }
            init
        })
        .collect();

    SeedPlan { valid, per_node }
}
