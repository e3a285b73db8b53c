//! Contracts of the components the selector consumes but does not own the
//! logic of: surrogate model, acquisition function, local-search optimizer,
//! run history and intensification statistics.

use pc_types::{Configuration, PcResult};
use rand::RngCore;

use crate::acquisition::AcquisitionScorer;

/// Regression model fit on past observations.
pub trait SurrogateModel {
    /// Fit on an N×D feature matrix and an N×O target matrix.
    fn train(&mut self, x: &[Vec<f64>], y: &[Vec<f64>]) -> PcResult<()>;

    /// Predictive mean and variance for one encoded configuration.
    fn predict(&self, x: &[f64]) -> PcResult<(f64, f64)>;
}

/// Scores configurations against the current model and incumbent value.
pub trait AcquisitionFunction {
    fn update(&mut self, model: &dyn SurrogateModel, eta: f64);

    /// One value per configuration, higher is better.
    fn score(&self, model: &dyn SurrogateModel, configs: &[Configuration]) -> PcResult<Vec<f64>>;

    /// One value per configuration, integrated over `evaluation_configs`.
    fn score_marginalized(
        &self,
        model: &dyn SurrogateModel,
        configs: &[Configuration],
        evaluation_configs: &[Configuration],
    ) -> PcResult<Vec<f64>>;
}

/// Hill-climbs one start point to a local acquisition optimum.
pub trait LocalSearchOptimizer {
    /// Returns the local optimum and its acquisition value.
    fn maximize(
        &mut self,
        start: &Configuration,
        scorer: &AcquisitionScorer,
        rng: &mut dyn RngCore,
    ) -> PcResult<(Configuration, f64)>;
}

/// Read-only view of past evaluations.
pub trait RunHistory {
    fn is_empty(&self) -> bool;

    /// Recorded cost of `config`, `None` if it was never evaluated.
    fn cost(&self, config: &Configuration) -> Option<f64>;

    fn configurations(&self) -> Vec<Configuration>;
}

/// Budget hint from the outer loop.
pub trait IntensifyStatistics {
    /// Exponential moving average of configurations evaluated per
    /// intensification call.
    fn ema_configs_per_intensify(&self) -> f64;
}
