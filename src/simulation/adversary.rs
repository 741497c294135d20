//! Adversarial node models used to exercise compliant nodes
//! None of them run the quorum logic; they only emit noise or stay silent.

use crate::consensus::{Candidate, Node, Transaction};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Fresh spam ids are drawn from `SPAM_ID_BASE..SPAM_ID_BASE + SPAM_ID_SPAN`,
/// far above any seeded transaction.
pub const SPAM_ID_BASE: u64 = 1_000_000;
pub const SPAM_ID_SPAN: u64 = 1_000_000;

/// Transactions emitted per flooding round
pub const SPAM_PER_ROUND: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AdversaryKind {
    /// Never emits anything
    Silent,
    /// Emits fresh random ids every round
    Flooding,
    /// Floods on even rounds, silent on odd rounds
    Alternating,
}

impl FromStr for AdversaryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "silent" => Ok(AdversaryKind::Silent),
            "flooding" => Ok(AdversaryKind::Flooding),
            "alternating" => Ok(AdversaryKind::Alternating),
            other => Err(format!("unknown adversary kind '{}'", other)),
        }
    }
}

pub struct MaliciousNode {
    kind: AdversaryKind,
    rng: ChaCha8Rng,
    followees: Vec<bool>,
    round: usize,
}

impl MaliciousNode {
    pub fn new(kind: AdversaryKind, seed: u64) -> Self {
        Self {
            kind,
            rng: ChaCha8Rng::seed_from_u64(seed),
            followees: Vec::new(),
            round: 0,
        }
    }

    pub fn kind(&self) -> AdversaryKind {
        self.kind
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn followees(&self) -> &[bool] {
        &self.followees
    }

    fn floods_this_round(&self) -> bool {
        match self.kind {
            AdversaryKind::Silent => false,
            AdversaryKind::Flooding => true,
            AdversaryKind::Alternating => self.round % 2 == 0,
        }
    }
}

impl Node for MaliciousNode {
    fn set_followees(&mut self, followees: &[bool]) {
        self.followees = followees.to_vec();
    }

    fn seed_pending_transactions(&mut self, _pending: &HashSet<Transaction>) {
        // Seeds are ignored.
    }

    fn send_to_followers(&self) -> HashSet<Transaction> {
        if !self.floods_this_round() {
            return HashSet::new();
        }
        // Emission is read-only: draw from a copy, the real generator
        // advances on receive.
        draw_spam(&mut self.rng.clone())
    }

    fn receive_from_followees(&mut self, _candidates: &[Candidate]) {
        if self.floods_this_round() {
            draw_spam(&mut self.rng);
        }
        self.round += 1;
    }

    fn name(&self) -> &str {
        match self.kind {
            AdversaryKind::Silent => "Malicious (Silent)",
            AdversaryKind::Flooding => "Malicious (Flooding)",
            AdversaryKind::Alternating => "Malicious (Alternating)",
        }
    }
}

fn draw_spam(rng: &mut ChaCha8Rng) -> HashSet<Transaction> {
    (0..SPAM_PER_ROUND)
        .map(|_| Transaction(SPAM_ID_BASE + rng.gen_range(0..SPAM_ID_SPAN)))
        .collect()
}
