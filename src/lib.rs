//! Gossip quorum node
//!
//! A peer-to-peer node that filters transaction proposals from the peers it
//! follows through an adaptive quorum, excludes silent peers, and
//! republishes what it believes. The `simulation` module drives networks of
//! such nodes against adversarial peers.

pub mod consensus;
pub mod logger;
pub mod simulation;
