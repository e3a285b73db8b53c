//! Selector construction settings and per-call budgets.

use pc_types::{config_error, PcResult};
use serde::{Deserialize, Serialize};

use crate::strategies::{DEFAULT_MAX_LOCAL_SEARCH_STARTS, DEFAULT_MAX_RECOMBINATION_ATTEMPTS};

/// Which selection flow to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    /// Exploit random and local search, explore with anchored batches.
    #[default]
    Plain,
    /// Additionally fixes the constant steps to a marginally best prefix.
    Cached,
}

/// Settings fixed for the lifetime of a selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub kind: SelectorKind,

    /// Seed of the selector's random stream.
    pub seed: u64,

    /// Evaluation configurations drawn per marginalized scoring call.
    pub evaluation_samples: usize,

    /// Random candidates scored when choosing the cached prefix.
    pub marginalization_samples: usize,

    pub max_recombination_attempts: usize,

    /// Cap on derived local-search starts.
    pub max_local_search_starts: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            kind: SelectorKind::Plain,
            seed: 0,
            evaluation_samples: 100,
            marginalization_samples: 10,
            max_recombination_attempts: DEFAULT_MAX_RECOMBINATION_ATTEMPTS,
            max_local_search_starts: DEFAULT_MAX_LOCAL_SEARCH_STARTS,
        }
    }
}

impl SelectorConfig {
    pub fn new(kind: SelectorKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Parse from JSON; absent fields take their defaults.
    pub fn from_json(json: &str) -> PcResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_evaluation_samples(mut self, n: usize) -> Self {
        self.evaluation_samples = n;
        self
    }

    pub fn with_marginalization_samples(mut self, n: usize) -> Self {
        self.marginalization_samples = n;
        self
    }

    pub fn with_max_recombination_attempts(mut self, n: usize) -> Self {
        self.max_recombination_attempts = n;
        self
    }

    pub fn with_max_local_search_starts(mut self, n: usize) -> Self {
        self.max_local_search_starts = n;
        self
    }

    pub fn validate(&self) -> PcResult<()> {
        if self.evaluation_samples == 0 {
            return Err(config_error!("evaluation_samples must be at least 1"));
        }
        if self.marginalization_samples == 0 {
            return Err(config_error!("marginalization_samples must be at least 1"));
        }
        if self.max_recombination_attempts == 0 {
            return Err(config_error!("max_recombination_attempts must be at least 1"));
        }
        Ok(())
    }
}

/// Sizes of one `select` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionBudget {
    /// Random candidates scored for exploitation.
    pub n_random: usize,

    /// Local-search starts; derived from the intensification average when
    /// absent.
    pub n_local: Option<usize>,

    /// Configurations per exploration batch.
    pub leaf_size: usize,
}

impl Default for SelectionBudget {
    fn default() -> Self {
        Self {
            n_random: 10_000,
            n_local: None,
            leaf_size: 1,
        }
    }
}

impl SelectionBudget {
    pub fn new(n_random: usize, leaf_size: usize) -> Self {
        Self {
            n_random,
            leaf_size,
            ..Self::default()
        }
    }

    pub fn with_n_local(mut self, n: usize) -> Self {
        self.n_local = Some(n);
        self
    }

    pub fn validate(&self) -> PcResult<()> {
        if self.leaf_size == 0 {
            return Err(config_error!("leaf_size must be at least 1"));
        }
        Ok(())
    }
}
