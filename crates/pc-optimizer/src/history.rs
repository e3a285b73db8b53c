//! In-memory run history and intensification statistics.

use pc_types::Configuration;
use serde::{Deserialize, Serialize};

use crate::collaborators::{IntensifyStatistics, RunHistory};

/// Smoothing factor of the configurations-per-intensify average.
pub const DEFAULT_EMA_ALPHA: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RunRecord {
    configuration: Configuration,
    costs: Vec<f64>,
}

impl RunRecord {
    fn mean_cost(&self) -> f64 {
        self.costs.iter().sum::<f64>() / self.costs.len() as f64
    }
}

/// Runs grouped by configuration in first-seen order. The cost of a
/// configuration is the mean over its runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryRunHistory {
    records: Vec<RunRecord>,
}

impl InMemoryRunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, configuration: Configuration, cost: f64) {
        match self.records.iter_mut().find(|r| r.configuration == configuration) {
            Some(record) => record.costs.push(cost),
            None => self.records.push(RunRecord {
                configuration,
                costs: vec![cost],
            }),
        }
    }

    /// Number of distinct configurations.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn run_count(&self) -> usize {
        self.records.iter().map(|r| r.costs.len()).sum()
    }

    /// Lowest-cost configuration, if any.
    pub fn best(&self) -> Option<(&Configuration, f64)> {
        self.records
            .iter()
            .map(|r| (&r.configuration, r.mean_cost()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

impl RunHistory for InMemoryRunHistory {
    fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn cost(&self, config: &Configuration) -> Option<f64> {
        self.records
            .iter()
            .find(|r| &r.configuration == config)
            .map(RunRecord::mean_cost)
    }

    fn configurations(&self) -> Vec<Configuration> {
        self.records.iter().map(|r| r.configuration.clone()).collect()
    }
}

/// Tracks how many configurations each intensification call evaluates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensifyStats {
    alpha: f64,
    ema_configs_per_intensify: f64,
    intensify_calls: usize,
}

impl Default for IntensifyStats {
    fn default() -> Self {
        Self::new(DEFAULT_EMA_ALPHA)
    }
}

impl IntensifyStats {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            ema_configs_per_intensify: 0.0,
            intensify_calls: 0,
        }
    }

    /// Start from a known average, e.g. when resuming a run.
    pub fn with_ema(mut self, ema: f64) -> Self {
        self.ema_configs_per_intensify = ema;
        self
    }

    pub fn record_intensify(&mut self, configs_evaluated: usize) {
        self.intensify_calls += 1;
        self.ema_configs_per_intensify =
            (1.0 - self.alpha) * self.ema_configs_per_intensify + self.alpha * configs_evaluated as f64;
    }

    pub fn intensify_calls(&self) -> usize {
        self.intensify_calls
    }
}

impl IntensifyStatistics for IntensifyStats {
    fn ema_configs_per_intensify(&self) -> f64 {
        self.ema_configs_per_intensify
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_types::{HyperparameterKey, HyperparameterValue};

    fn config(strategy: &str) -> Configuration {
        Configuration::new(
            [(
                HyperparameterKey::parse("imputation:imputation:strategy"),
                HyperparameterValue::from(strategy),
            )]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn cost_is_mean_over_runs() {
        let mut history = InMemoryRunHistory::new();
        assert!(history.is_empty());

        history.add(config("mean"), 0.4);
        history.add(config("mean"), 0.2);
        history.add(config("median"), 0.5);

        assert_eq!(history.len(), 2);
        assert_eq!(history.run_count(), 3);
        assert!((history.cost(&config("mean")).unwrap() - 0.3).abs() < 1e-12);
        assert_eq!(history.cost(&config("most_frequent")), None);
        assert_eq!(history.configurations(), vec![config("mean"), config("median")]);

        let (best, cost) = history.best().unwrap();
        assert_eq!(best, &config("mean"));
        assert!((cost - 0.3).abs() < 1e-12);
    }

    #[test]
    fn ema_tracks_intensify_calls() {
        let mut stats = IntensifyStats::default();
        assert_eq!(stats.ema_configs_per_intensify(), 0.0);

        stats.record_intensify(10);
        assert!((stats.ema_configs_per_intensify() - 3.0).abs() < 1e-12);

        stats.record_intensify(10);
        assert!((stats.ema_configs_per_intensify() - 5.1).abs() < 1e-12);
        assert_eq!(stats.intensify_calls(), 2);

        let resumed = IntensifyStats::default().with_ema(18.0);
        assert_eq!(resumed.ema_configs_per_intensify(), 18.0);
    }
}
