//! Adaptive quorum threshold.
//!
//! The fraction of active followees that must corroborate a transaction
//! starts lenient and tightens linearly until the last round:
//! - `alpha_start = max(0.40, malicious + 0.05)`
//! - `alpha_end   = max(0.55, malicious + 0.10)`
//!
//! Early rounds let transactions spread across a sparse graph; late rounds
//! sit above the expected malicious fraction.

use crate::consensus::types::clamp_fraction;
use serde::{Deserialize, Serialize};

/// Lower bound on the starting fraction.
pub const MIN_ALPHA_START: f64 = 0.40;

/// Lower bound on the final fraction.
pub const MIN_ALPHA_END: f64 = 0.55;

/// Margin added over the malicious estimate in the first round.
pub const START_MARGIN: f64 = 0.05;

/// Margin added over the malicious estimate in the last round.
pub const END_MARGIN: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSchedule {
    alpha_start: f64,
    alpha_end: f64,
    num_rounds: usize,
}

impl ThresholdSchedule {
    /// Explicit bounds. Both are clamped into [0, 1] and `alpha_end` is
    /// raised to `alpha_start` if it is lower.
    pub fn new(alpha_start: f64, alpha_end: f64, num_rounds: usize) -> Self {
        let alpha_start = clamp_fraction(alpha_start);
        let alpha_end = clamp_fraction(alpha_end).max(alpha_start);
        ThresholdSchedule {
            alpha_start,
            alpha_end,
            num_rounds: num_rounds.max(1),
        }
    }

    /// Bounds derived from the estimated malicious fraction.
    ///
    /// ```
    /// use gossip_quorum::consensus::ThresholdSchedule;
    ///
    /// let schedule = ThresholdSchedule::from_estimates(0.30, 15);
    /// assert!((schedule.alpha_start() - 0.40).abs() < 1e-9);
    /// assert!((schedule.alpha_end() - 0.55).abs() < 1e-9);
    /// ```
    pub fn from_estimates(malicious_fraction: f64, num_rounds: usize) -> Self {
        let malicious = clamp_fraction(malicious_fraction);
        Self::new(
            MIN_ALPHA_START.max(malicious + START_MARGIN),
            MIN_ALPHA_END.max(malicious + END_MARGIN),
            num_rounds,
        )
    }

    pub fn alpha_start(&self) -> f64 {
        self.alpha_start
    }

    pub fn alpha_end(&self) -> f64 {
        self.alpha_end
    }

    pub fn num_rounds(&self) -> usize {
        self.num_rounds
    }

    /// Fraction of the schedule elapsed at `round`, in [0, 1].
    pub fn progress(&self, round: usize) -> f64 {
        if self.num_rounds <= 1 {
            return 1.0;
        }
        (round as f64 / (self.num_rounds - 1) as f64).min(1.0)
    }

    pub fn alpha(&self, round: usize) -> f64 {
        self.alpha_start + (self.alpha_end - self.alpha_start) * self.progress(round)
    }

    /// Distinct supporters required at `round` given `active` followees.
    /// Never below 1.
    pub fn quorum(&self, round: usize, active: usize) -> usize {
        let denominator = active.max(1) as f64;
        let required = (self.alpha(round) * denominator).ceil() as usize;
        required.max(1)
    }
}
