//! Node behavior trait definition

use crate::consensus::types::{Candidate, Transaction};
use std::collections::HashSet;

/// Capability set every participant in a gossip round exposes to the driver.
///
/// The driver calls `set_followees` once, then `seed_pending_transactions`
/// once, then alternates `send_to_followers` / `receive_from_followees` once
/// per round. Implementations must be `Send` so a driver can move them onto
/// worker tasks between round barriers.
pub trait Node: Send {
    /// Configure which peer indices this node follows
    fn set_followees(&mut self, followees: &[bool]);

    /// Merge the initial transaction set into the node's starting state
    fn seed_pending_transactions(&mut self, pending: &HashSet<Transaction>);

    /// Transactions this node broadcasts this round
    fn send_to_followers(&self) -> HashSet<Transaction>;

    /// Consume this round's inbox
    fn receive_from_followees(&mut self, candidates: &[Candidate]);

    /// Get the node variant name
    fn name(&self) -> &str;
}
