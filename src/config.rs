//! Solver configuration, loaded from TOML.
//!
//! ```
//! use table_planner::config::SolverConfig;
//!
//! let config = SolverConfig::from_toml_str(r#"
//!     seed = 7
//!
//!     [weights]
//!     penalty_relation = 300
//!
//!     [search]
//!     restarts = 4
//!     [search.acceptance]
//!     type = "annealing"
//!     temperature = 200.0
//!     cooling_rate = 0.995
//! "#).unwrap();
//!
//! assert_eq!(config.weights.penalty_relation, 300);
//! assert_eq!(config.weights.bonus_preferred, 1000);
//! assert_eq!(config.search.restarts, 4);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::anneal::{Acceptance, Params};
use crate::model::condition::{Score, Weights};

/// Largest accepted weight. Keeps a table's summed score far from `i64` overflow.
pub const MAX_WEIGHT: Score = 1_000_000_000_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Seed of the random source shared by all meals of a run.
    pub seed: u64,
    pub weights: Weights,
    pub search: Params,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            seed: 0,
            weights: Weights::default(),
            search: Params::default(),
        }
    }
}

impl SolverConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Rejects values that would make the search meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        let named = [
            ("bonus_preferred", w.bonus_preferred),
            ("penalty_relation", w.penalty_relation),
            ("penalty_repeat", w.penalty_repeat),
            ("penalty_same_sex", w.penalty_same_sex),
            ("penalty_same_sex_excess", w.penalty_same_sex_excess),
        ];
        if let Some((name, value)) = named.iter().find(|(_, value)| *value < 0) {
            return Err(ConfigError::Invalid(format!("weight {} must not be negative, got {}", name, value)));
        }
        if let Some((name, value)) = named.iter().find(|(_, value)| *value > MAX_WEIGHT) {
            return Err(ConfigError::Invalid(format!("weight {} must not exceed {}, got {}", name, MAX_WEIGHT, value)));
        }
        if w.penalty_same_sex_excess <= w.bonus_preferred {
            return Err(ConfigError::Invalid(format!(
                "penalty_same_sex_excess ({}) must exceed bonus_preferred ({})",
                w.penalty_same_sex_excess, w.bonus_preferred,
            )));
        }
        if self.search.restarts == 0 {
            return Err(ConfigError::Invalid("search.restarts must be at least 1".into()));
        }
        if self.search.iterations == 0 {
            return Err(ConfigError::Invalid("search.iterations must be at least 1".into()));
        }
        if let Acceptance::Annealing { temperature, cooling_rate } = self.search.acceptance {
            if !(temperature > 0.0) {
                return Err(ConfigError::Invalid(format!("temperature must be positive, got {}", temperature)));
            }
            if !(cooling_rate > 0.0 && cooling_rate <= 1.0) {
                return Err(ConfigError::Invalid(format!("cooling_rate must be in (0, 1], got {}", cooling_rate)));
            }
        }
        Ok(())
    }
}
