//! Round-driven gossip network simulation
//!
//! Builds a random follow graph, mixes compliant and adversarial nodes,
//! runs the round loop and scores how well compliant nodes agree.

pub mod adversary;
pub mod config;
pub mod evaluation;
pub mod network;
pub mod runner;

pub use adversary::{AdversaryKind, MaliciousNode};
pub use config::{ConfigError, ConfigResult, SimulationConfig};
pub use evaluation::{evaluate, print_report, SimulationReport};
pub use network::{seed_transactions, FollowGraph, SeedPlan};
pub use runner::Simulation;
