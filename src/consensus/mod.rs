//! Per-node gossip consensus
//!
//! This module holds the node-side protocol: which followees are still
//! trusted, how many of them must agree on a transaction, and how the
//! node's belief set evolves from round to round.
//!
//! ## Structure
//! - `traits.rs` - `Node` trait shared by every node variant
//! - `types.rs` - Transactions, candidates and node parameters
//! - `reliability.rs` - Followee exclusion tracking
//! - `threshold.rs` - Adaptive quorum schedule
//! - `algorithms/` - Node implementations
//!   - `compliant.rs` - Adaptive quorum node
//! - `tests.rs` - Protocol property tests

// Re-export public API
pub use algorithms::QuorumConsensusNode;
pub use reliability::PeerReliabilityTracker;
pub use threshold::ThresholdSchedule;
pub use traits::Node;
pub use types::{Candidate, NodeParams, NodeState, Transaction};

// Node implementations
pub mod algorithms;
pub mod reliability;
pub mod threshold;


// Internal modules
mod traits;
mod types;
