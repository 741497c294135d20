//! Round-driven simulation of a gossip network
//!
//! Every round is emission from all nodes, then delivery along follow
//! edges, then every node consumes its inbox. No node sees another node's
//! state except through delivered candidates.

use crate::consensus::{Candidate, Node, QuorumConsensusNode, Transaction};
use crate::simulation::adversary::MaliciousNode;
use crate::simulation::config::{ConfigError, ConfigResult, SimulationConfig};
use crate::simulation::evaluation::{evaluate, SimulationReport};
use crate::simulation::network::{seed_transactions, FollowGraph};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::error::Error;
use tracing::{debug, info, warn};

pub struct Simulation {
    config: SimulationConfig,
    nodes: Vec<Box<dyn Node>>,
    malicious: Vec<bool>,
    graph: FollowGraph,
    valid: HashSet<Transaction>,
    round: usize,
}

impl Simulation {
    /// Build the graph, the nodes and their seeds from `config`.
    pub fn new(config: SimulationConfig) -> ConfigResult<Self> {
        config.validate()?;

        let n = config.num_nodes;
        let malicious_count = config.malicious_count();
        let malicious: Vec<bool> = (0..n).map(|i| i < malicious_count).collect();

        let mut nodes: Vec<Box<dyn Node>> = Vec::with_capacity(n);
        for (index, is_malicious) in malicious.iter().enumerate() {
            if *is_malicious {
                nodes.push(Box::new(MaliciousNode::new(
                    config.adversary,
                    config.adversary_seed.wrapping_add(index as u64),
                )));
            } else {
                nodes.push(Box::new(
                    QuorumConsensusNode::new(config.node_params()).with_id(index),
                ));
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(config.graph_seed);
        let graph = FollowGraph::random(n, config.p_graph, &mut rng);
        for (index, node) in nodes.iter_mut().enumerate() {
            node.set_followees(&graph.followees_of(index));
        }

        let plan = seed_transactions(n, config.p_tx_distribution, &mut rng);
        for (node, init) in nodes.iter_mut().zip(plan.per_node.iter()) {
            node.seed_pending_transactions(init);
        }

        info!(
            nodes = n,
            malicious = malicious_count,
            edges = graph.edge_count(),
            valid_txs = plan.valid.len(),
            rounds = config.num_rounds,
            "Simulation initialized"
        );

        Ok(Simulation {
            valid: plan.valid.into_iter().collect(),
            config,
            nodes,
            malicious,
            graph,
            round: 0,
        })
    }

    /// Use caller-supplied nodes and graph. Node `i` of `nodes` is peer `i`.
    ///
    /// `nodes`, `malicious` and `graph` must all describe the same peers.
    pub fn from_parts(
        config: SimulationConfig,
        nodes: Vec<Box<dyn Node>>,
        malicious: Vec<bool>,
        graph: FollowGraph,
        valid: HashSet<Transaction>,
    ) -> ConfigResult<Self> {
        config.validate()?;
        if malicious.len() != nodes.len() {
            return Err(ConfigError::OutOfRange {
                field: "malicious".to_string(),
                reason: format!("{} flags for {} nodes", malicious.len(), nodes.len()),
            });
        }
        if graph.num_nodes() != nodes.len() {
            return Err(ConfigError::OutOfRange {
                field: "graph".to_string(),
                reason: format!("{} peers for {} nodes", graph.num_nodes(), nodes.len()),
            });
        }

        Ok(Simulation {
            config,
            nodes,
            malicious,
            graph,
            valid,
            round: 0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn graph(&self) -> &FollowGraph {
        &self.graph
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn valid_transactions(&self) -> &HashSet<Transaction> {
        &self.valid
    }

    pub fn is_malicious(&self, index: usize) -> bool {
        self.malicious.get(index).copied().unwrap_or(false)
    }

    /// Collect every node's emission, then build each node's inbox.
    fn deliver(&self) -> Vec<Vec<Candidate>> {
        let proposals: Vec<HashSet<Transaction>> =
            self.nodes.iter().map(|node| node.send_to_followers()).collect();

        let mut inboxes: Vec<Vec<Candidate>> = vec![Vec::new(); self.nodes.len()];
        for (sender, proposal) in proposals.iter().enumerate() {
            for follower in self.graph.followers_of(sender) {
                inboxes[follower].extend(proposal.iter().map(|tx| Candidate::new(*tx, sender)));
            }
        }
        inboxes
    }

    /// Run one round on the current thread.
    pub fn step(&mut self) {
        let inboxes = self.deliver();
        for (node, inbox) in self.nodes.iter_mut().zip(inboxes.iter()) {
            node.receive_from_followees(inbox);
        }
        debug!(round = self.round, "Round complete");
        self.round += 1;
    }

    /// Run all configured rounds sequentially.
    pub fn run(&mut self) -> SimulationReport {
        while self.round < self.config.num_rounds {
            self.step();
        }
        self.report()
    }

    /// Run all configured rounds, processing each node's inbox on a tokio
    /// blocking task. All tasks of a round are joined before the next
    /// emission starts.
    ///
    /// If a task fails, the remaining tasks of that round are still awaited
    /// and their nodes put back, then the first error is returned without
    /// advancing the round. The failed node is gone, so the simulation
    /// should not be run further.
    pub async fn run_parallel(&mut self) -> Result<SimulationReport, Box<dyn Error>> {
        while self.round < self.config.num_rounds {
            let inboxes = self.deliver();
            let nodes = std::mem::take(&mut self.nodes);

            let handles: Vec<_> = nodes
                .into_iter()
                .zip(inboxes)
                .map(|(mut node, inbox)| {
                    tokio::task::spawn_blocking(move || {
                        node.receive_from_followees(&inbox);
                        node
                    })
                })
                .collect();

            let mut first_error = None;
            for handle in handles {
                match handle.await {
                    Ok(node) => self.nodes.push(node),
                    Err(e) => {
                        warn!(round = self.round, error = %e, "Node task failed");
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
            }
            if let Some(e) = first_error {
                return Err(e.into());
            }
            debug!(round = self.round, "Round complete (parallel)");
            self.round += 1;
        }
        Ok(self.report())
    }

    /// What every node would broadcast right now
    pub fn final_sets(&self) -> Vec<HashSet<Transaction>> {
        self.nodes.iter().map(|node| node.send_to_followers()).collect()
    }

    pub fn report(&self) -> SimulationReport {
        let report = evaluate(
            &self.final_sets(),
            &self.malicious,
            &self.valid,
            self.config.agreement_ratio,
            self.round,
        );
        info!(
            passed = report.passed(),
            cluster = report.largest_cluster,
            compliant = report.compliant_nodes,
            agreed = report.agreed.len(),
            "Simulation evaluated"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{NodeParams, ThresholdSchedule};
    use crate::simulation::adversary::AdversaryKind;

    fn small_config() -> SimulationConfig {
        SimulationConfig::new()
            .with_nodes(12)
            .with_graph_density(0.4)
            .with_rounds(6)
    }

    #[test]
    fn test_run_advances_all_rounds() {
        let mut sim = Simulation::new(small_config()).unwrap();
        let report = sim.run();
        assert_eq!(sim.round(), 6);
        assert_eq!(report.rounds, 6);
        assert_eq!(report.compliant_nodes, 12 - 3);
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(Simulation::new(small_config().with_rounds(0)).is_err());
    }

    fn full_mesh(n: usize) -> FollowGraph {
        let mut graph = FollowGraph::empty(n);
        for a in 0..n {
            for b in 0..n {
                graph.add_edge(a, b);
            }
        }
        graph
    }

    #[test]
    fn test_lone_flooder_cannot_reach_quorum() {
        // Peer 0 floods, peers 1..=4 are compliant and follow everyone.
        let n = 5;
        let graph = full_mesh(n);
        let seed: HashSet<Transaction> = [Transaction(1), Transaction(2)].into_iter().collect();

        let mut nodes: Vec<Box<dyn Node>> = Vec::new();
        let mut flooder = MaliciousNode::new(AdversaryKind::Flooding, 11);
        flooder.set_followees(&graph.followees_of(0));
        nodes.push(Box::new(flooder));
        for i in 1..n {
            let mut node = QuorumConsensusNode::new(NodeParams::new(1.0, 0.2, 0.1, 4)).with_id(i);
            node.set_followees(&graph.followees_of(i));
            node.seed_pending_transactions(&seed);
            nodes.push(Box::new(node));
        }

        let config = SimulationConfig::new().with_nodes(n).with_rounds(4);
        let malicious = (0..n).map(|i| i == 0).collect();
        let mut sim =
            Simulation::from_parts(config, nodes, malicious, graph, seed.clone()).unwrap();
        let report = sim.run();

        for (index, set) in sim.final_sets().iter().enumerate().skip(1) {
            assert_eq!(set, &seed, "node {} diverged", index);
        }
        assert!(report.passed());
        assert_eq!(report.largest_cluster, 4);
    }

    #[test]
    fn test_from_parts_full_mesh_converges() {
        let n = 4;
        let graph = full_mesh(n);
        let schedule = ThresholdSchedule::new(0.5, 0.5, 2);
        let nodes: Vec<Box<dyn Node>> = (0..n)
            .map(|i| {
                let mut node = QuorumConsensusNode::new(NodeParams::new(1.0, 0.0, 0.1, 2))
                    .with_schedule(schedule);
                node.set_followees(&graph.followees_of(i));
                let seed: HashSet<Transaction> = [Transaction(1)].into_iter().collect();
                node.seed_pending_transactions(&seed);
                Box::new(node) as Box<dyn Node>
            })
            .collect();

        let valid: HashSet<Transaction> = [Transaction(1)].into_iter().collect();
        let config = SimulationConfig::new().with_nodes(n).with_rounds(2);
        let mut sim =
            Simulation::from_parts(config, nodes, vec![false; n], graph, valid).unwrap();
        let report = sim.run();

        assert!(report.passed());
        assert_eq!(report.largest_cluster, 4);
        assert!(report.agreed.contains(&1));
    }

    fn compliant_nodes(graph: &FollowGraph, count: usize) -> Vec<Box<dyn Node>> {
        (0..count)
            .map(|i| {
                let mut node = QuorumConsensusNode::new(NodeParams::new(0.5, 0.0, 0.1, 2));
                if i < graph.num_nodes() {
                    node.set_followees(&graph.followees_of(i));
                }
                Box::new(node) as Box<dyn Node>
            })
            .collect()
    }

    #[test]
    fn test_from_parts_rejects_graph_larger_than_nodes() {
        let mut graph = FollowGraph::empty(3);
        graph.add_edge(0, 2);
        let nodes = compliant_nodes(&graph, 2);
        let config = SimulationConfig::new().with_nodes(2).with_rounds(1);

        let result = Simulation::from_parts(config, nodes, vec![false; 2], graph, HashSet::new());
        match result {
            Err(ConfigError::OutOfRange { field, .. }) => assert_eq!(field, "graph"),
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("mismatched graph was accepted"),
        }
    }

    #[test]
    fn test_from_parts_rejects_mismatched_malicious_flags() {
        let graph = full_mesh(3);
        let nodes = compliant_nodes(&graph, 3);
        let config = SimulationConfig::new().with_nodes(3).with_rounds(1);

        let result = Simulation::from_parts(config, nodes, vec![false; 2], graph, HashSet::new());
        assert!(matches!(result, Err(ConfigError::OutOfRange { .. })));
    }

    /// Panics the first time it receives, standing in for a crashed peer.
    struct CrashingNode;

    impl Node for CrashingNode {
        fn set_followees(&mut self, _followees: &[bool]) {}
        fn seed_pending_transactions(&mut self, _pending: &HashSet<Transaction>) {}
        fn send_to_followers(&self) -> HashSet<Transaction> {
            HashSet::new()
        }
        fn receive_from_followees(&mut self, _candidates: &[Candidate]) {
            panic!("node crashed");
        }
        fn name(&self) -> &str {
            "Crashing"
        }
    }

    #[tokio::test]
    async fn test_parallel_failure_keeps_surviving_nodes() {
        let graph = full_mesh(3);
        let mut nodes = compliant_nodes(&graph, 3);
        nodes[1] = Box::new(CrashingNode);
        let config = SimulationConfig::new().with_nodes(3).with_rounds(2);
        let mut sim =
            Simulation::from_parts(config, nodes, vec![false; 3], graph, HashSet::new()).unwrap();

        assert!(sim.run_parallel().await.is_err());
        assert_eq!(sim.round(), 0);
        assert_eq!(sim.num_nodes(), 2);
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let mut sequential = Simulation::new(small_config()).unwrap();
        let mut parallel = Simulation::new(small_config()).unwrap();

        sequential.run();
        parallel.run_parallel().await.unwrap();

        assert_eq!(parallel.round(), sequential.round());
        assert_eq!(parallel.final_sets(), sequential.final_sets());
    }
}
