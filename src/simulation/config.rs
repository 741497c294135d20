//! Simulation configuration
//!
//! Defaults reproduce the reference scenario (30 nodes, 30% adversarial,
//! 15 rounds). `load_env` loads `.env` first, then applies `GQ_*` overrides.

use crate::consensus::NodeParams;
use crate::simulation::adversary::AdversaryKind;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Custom error type for configuration problems
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidValue { key: String, value: String },
    OutOfRange { field: String, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
            ConfigError::OutOfRange { field, reason } => {
                write!(f, "Configuration error in {}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub num_nodes: usize,
    /// Probability that a given node follows another
    pub p_graph: f64,
    /// Fraction of nodes that are adversarial
    pub p_malicious: f64,
    /// Controls how many valid transactions get seeded
    pub p_tx_distribution: f64,
    pub num_rounds: usize,
    pub graph_seed: u64,
    pub adversary_seed: u64,
    /// Share of compliant nodes that must hold the identical final set
    pub agreement_ratio: f64,
    pub adversary: AdversaryKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            num_nodes: 30,
            p_graph: 0.2,
            p_malicious: 0.30,
            p_tx_distribution: 0.05,
            num_rounds: 15,
            graph_seed: 7,
            adversary_seed: 42,
            agreement_ratio: 0.75,
            adversary: AdversaryKind::Alternating,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `load_env`, then `validate`.
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self::load_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `GQ_*` environment variables (after `.env`).
    /// Only parse errors are reported; callers that layer further overrides
    /// on top validate the merged result.
    pub fn load_env() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Some(v) = read_var("GQ_NODES")? {
            config.num_nodes = v;
        }
        if let Some(v) = read_var("GQ_P_GRAPH")? {
            config.p_graph = v;
        }
        if let Some(v) = read_var("GQ_P_MALICIOUS")? {
            config.p_malicious = v;
        }
        if let Some(v) = read_var("GQ_P_TX")? {
            config.p_tx_distribution = v;
        }
        if let Some(v) = read_var("GQ_ROUNDS")? {
            config.num_rounds = v;
        }
        if let Some(v) = read_var("GQ_GRAPH_SEED")? {
            config.graph_seed = v;
        }
        if let Some(v) = read_var("GQ_ADVERSARY_SEED")? {
            config.adversary_seed = v;
        }
        if let Some(v) = read_var("GQ_AGREEMENT")? {
            config.agreement_ratio = v;
        }
        if let Some(v) = read_var("GQ_ADVERSARY")? {
            config.adversary = v;
        }
        Ok(config)
    }

    pub fn with_nodes(mut self, num_nodes: usize) -> Self {
        self.num_nodes = num_nodes;
        self
    }

    pub fn with_graph_density(mut self, p_graph: f64) -> Self {
        self.p_graph = p_graph;
        self
    }

    pub fn with_malicious_fraction(mut self, p_malicious: f64) -> Self {
        self.p_malicious = p_malicious;
        self
    }

    pub fn with_tx_distribution(mut self, p_tx: f64) -> Self {
        self.p_tx_distribution = p_tx;
        self
    }

    pub fn with_rounds(mut self, num_rounds: usize) -> Self {
        self.num_rounds = num_rounds;
        self
    }

    pub fn with_seeds(mut self, graph_seed: u64, adversary_seed: u64) -> Self {
        self.graph_seed = graph_seed;
        self.adversary_seed = adversary_seed;
        self
    }

    pub fn with_agreement_ratio(mut self, ratio: f64) -> Self {
        self.agreement_ratio = ratio;
        self
    }

    pub fn with_adversary(mut self, adversary: AdversaryKind) -> Self {
        self.adversary = adversary;
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.num_nodes == 0 {
            return Err(out_of_range("num_nodes", "must be at least 1"));
        }
        if self.num_rounds == 0 {
            return Err(out_of_range("num_rounds", "must be at least 1"));
        }
        for (field, value) in [
            ("p_graph", self.p_graph),
            ("p_malicious", self.p_malicious),
            ("p_tx_distribution", self.p_tx_distribution),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(out_of_range(
                    field,
                    &format!("{} is outside [0, 1]", value),
                ));
            }
        }
        if !(self.agreement_ratio > 0.0 && self.agreement_ratio <= 1.0) {
            return Err(out_of_range(
                "agreement_ratio",
                &format!("{} is outside (0, 1]", self.agreement_ratio),
            ));
        }
        Ok(())
    }

    /// Parameter block handed to every compliant node
    pub fn node_params(&self) -> NodeParams {
        NodeParams::new(
            self.p_graph,
            self.p_malicious,
            self.p_tx_distribution,
            self.num_rounds,
        )
    }

    /// Number of adversarial nodes; they take the lowest indices.
    pub fn malicious_count(&self) -> usize {
        ((self.p_malicious * self.num_nodes as f64).floor() as usize).min(self.num_nodes)
    }
}

fn out_of_range(field: &str, reason: &str) -> ConfigError {
    ConfigError::OutOfRange {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn read_var<T: FromStr>(key: &str) -> ConfigResult<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        Err(_) => Ok(None),
    }
}
