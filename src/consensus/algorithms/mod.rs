//! Node behavior implementations

// Adaptive quorum node (the only protocol-following variant)
pub mod compliant;

pub use compliant::QuorumConsensusNode;
