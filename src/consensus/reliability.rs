//! Followee reliability tracking
//!
//! A followee that stays silent for a whole round is excluded for good.
//! Exclusions never revert; the only way to clear them is a full
//! [`PeerReliabilityTracker::initialize`].

use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct PeerReliabilityTracker {
    followees: Vec<bool>,
    excluded: Vec<bool>,
    spoke: Vec<bool>,
    total: usize,
    active: usize,
}

impl PeerReliabilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the followee membership and reset all reliability history.
    pub fn initialize(&mut self, membership: &[bool]) {
        self.followees = membership.to_vec();
        self.excluded = vec![false; membership.len()];
        self.spoke = vec![false; membership.len()];
        self.total = membership.iter().filter(|f| **f).count();
        self.active = self.total;
    }

    /// Mark `index` as having spoken this round.
    ///
    /// Returns false (and records nothing) for indices that are out of range,
    /// not followees, or already excluded.
    pub fn record_spoke(&mut self, index: usize) -> bool {
        if !self.is_trusted(index) {
            return false;
        }
        self.spoke[index] = true;
        true
    }

    /// Exclude every trusted followee that did not speak since the last call.
    ///
    /// Returns the newly excluded indices.
    pub fn finalize_round(&mut self) -> Vec<usize> {
        let mut newly_excluded = Vec::new();
        for index in 0..self.followees.len() {
            if !self.followees[index] || self.excluded[index] {
                continue;
            }
            if !self.spoke[index] {
                self.excluded[index] = true;
                newly_excluded.push(index);
            }
        }
        self.active = self.active.saturating_sub(newly_excluded.len());
        self.spoke.iter_mut().for_each(|s| *s = false);

        if !newly_excluded.is_empty() {
            debug!(
                excluded = ?newly_excluded,
                active = self.active,
                "Silent followees excluded"
            );
        }
        newly_excluded
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn total_count(&self) -> usize {
        self.total
    }

    pub fn is_followee(&self, index: usize) -> bool {
        self.followees.get(index).copied().unwrap_or(false)
    }

    pub fn is_excluded(&self, index: usize) -> bool {
        self.excluded.get(index).copied().unwrap_or(false)
    }

    /// Followee that has not been excluded
    pub fn is_trusted(&self, index: usize) -> bool {
        self.is_followee(index) && !self.is_excluded(index)
    }
}
