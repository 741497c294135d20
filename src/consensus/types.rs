//! Consensus types and data structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque transaction identifier. Validity is decided outside the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Transaction(pub u64);

impl Transaction {
    pub fn new(id: u64) -> Self {
        Transaction(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx#{}", self.0)
    }
}

/// One inbound claim: `sender` proposes `tx` this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub tx: Transaction,
    pub sender: usize,
}

impl Candidate {
    pub fn new(tx: Transaction, sender: usize) -> Self {
        Candidate { tx, sender }
    }
}

/// Lifecycle of a node as seen from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// Followees not yet configured
    Uninitialized,
    /// Followees configured, no round processed yet
    Seeded,
    /// At least one round processed
    RoundActive,
}

/// Network estimates handed to a compliant node at construction.
///
/// Only `malicious_fraction` and `num_rounds` influence behavior; the other
/// two are kept so drivers can hand every node the same parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeParams {
    pub graph_density: f64,
    pub malicious_fraction: f64,
    pub tx_distribution: f64,
    pub num_rounds: usize,
}

impl NodeParams {
    /// Fractions are clamped into [0, 1] and rounds to at least 1.
    pub fn new(
        graph_density: f64,
        malicious_fraction: f64,
        tx_distribution: f64,
        num_rounds: usize,
    ) -> Self {
        NodeParams {
            graph_density: clamp_fraction(graph_density),
            malicious_fraction: clamp_fraction(malicious_fraction),
            tx_distribution: clamp_fraction(tx_distribution),
            num_rounds: num_rounds.max(1),
        }
    }
}

/// NaN collapses to 0.0.
pub(crate) fn clamp_fraction(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
