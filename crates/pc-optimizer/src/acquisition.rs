//! Acquisition scoring and randomized tie-break ranking.

use std::cmp::Ordering;

use pc_space::ConfigurationSpace;
use pc_types::{Configuration, PcError, PcResult, ScoredConfiguration};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::collaborators::{AcquisitionFunction, RunHistory, SurrogateModel};

/// How a batch of candidates is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringMode {
    /// Plain acquisition value per configuration.
    Standard,
    /// Acquisition value integrated over a fresh sample of evaluation
    /// configurations.
    Marginalized,
}

/// Owns the surrogate model and the acquisition function and exposes the
/// scoring operations the search strategies need.
pub struct AcquisitionScorer {
    model: Box<dyn SurrogateModel>,
    acquisition: Box<dyn AcquisitionFunction>,
    evaluation_samples: usize,
    eta: f64,
}

impl AcquisitionScorer {
    pub fn new(
        model: Box<dyn SurrogateModel>,
        acquisition: Box<dyn AcquisitionFunction>,
        evaluation_samples: usize,
    ) -> Self {
        Self {
            model,
            acquisition,
            evaluation_samples,
            eta: 0.0,
        }
    }

    /// Incumbent value of the last update.
    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn evaluation_samples(&self) -> usize {
        self.evaluation_samples
    }

    pub fn model(&self) -> &dyn SurrogateModel {
        self.model.as_ref()
    }

    /// Retrain the model and point the acquisition function at it.
    pub fn update(&mut self, x: &[Vec<f64>], y: &[Vec<f64>], eta: f64) -> PcResult<()> {
        if x.len() != y.len() {
            return Err(PcError::Model {
                message: format!("{} feature rows but {} target rows", x.len(), y.len()),
            });
        }
        self.model.train(x, y)?;
        self.acquisition.update(self.model.as_ref(), eta);
        self.eta = eta;
        debug!("Acquisition updated on {} observations, eta={}", x.len(), eta);
        Ok(())
    }

    pub fn score(&self, configs: &[Configuration]) -> PcResult<Vec<f64>> {
        if configs.is_empty() {
            return Ok(Vec::new());
        }
        let values = self.acquisition.score(self.model.as_ref(), configs)?;
        check_len(configs.len(), values)
    }

    /// Scores integrated over `evaluation_samples` configurations freshly
    /// drawn from `space` for this call.
    pub fn score_marginalized<R: Rng + ?Sized>(
        &self,
        configs: &[Configuration],
        space: &ConfigurationSpace,
        rng: &mut R,
    ) -> PcResult<Vec<f64>> {
        if configs.is_empty() {
            return Ok(Vec::new());
        }
        let evaluation_configs = space.sample(self.evaluation_samples, rng)?;
        let values = self
            .acquisition
            .score_marginalized(self.model.as_ref(), configs, &evaluation_configs)?;
        check_len(configs.len(), values)
    }

    /// Score and order best-first. Ties are broken by a random draw.
    pub fn rank<R: Rng + ?Sized>(
        &self,
        configs: Vec<Configuration>,
        mode: ScoringMode,
        space: &ConfigurationSpace,
        rng: &mut R,
    ) -> PcResult<Vec<ScoredConfiguration>> {
        let values = match mode {
            ScoringMode::Standard => self.score(&configs)?,
            ScoringMode::Marginalized => self.score_marginalized(&configs, space, rng)?,
        };
        let scored = values
            .into_iter()
            .zip(configs)
            .map(|(value, config)| ScoredConfiguration::new(value, config))
            .collect();
        Ok(sort_scored(scored, rng))
    }
}

fn check_len(expected: usize, values: Vec<f64>) -> PcResult<Vec<f64>> {
    if values.len() != expected {
        return Err(PcError::Acquisition {
            message: format!("expected {expected} values, got {}", values.len()),
        });
    }
    Ok(values)
}

/// Cost of the incumbent, or 0.0 when there is no usable incumbent.
pub fn incumbent_value(run_history: &dyn RunHistory, incumbent: Option<&Configuration>) -> f64 {
    if run_history.is_empty() {
        return 0.0;
    }
    match incumbent {
        None => 0.0,
        Some(config) => run_history.cost(config).unwrap_or_else(|| {
            warn!("Incumbent {} has no recorded cost, using 0.0", config);
            0.0
        }),
    }
}

/// Descending order on acquisition values with NaN below everything.
pub(crate) fn compare_values(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/// Order best-first, breaking ties between equal values with one uniform
/// draw per item.
pub fn sort_scored<R: Rng + ?Sized>(
    items: Vec<ScoredConfiguration>,
    rng: &mut R,
) -> Vec<ScoredConfiguration> {
    let mut keyed: Vec<(f64, ScoredConfiguration)> = items
        .into_iter()
        .map(|item| (rng.random::<f64>(), item))
        .collect();
    keyed.sort_by(|(draw_a, a), (draw_b, b)| {
        compare_values(a.acquisition_value, b.acquisition_value).then_with(|| draw_b.total_cmp(draw_a))
    });
    keyed.into_iter().map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::InMemoryRunHistory;
    use crate::test_support::*;
    use pc_types::Origin;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn scored(values: &[f64]) -> Vec<ScoredConfiguration> {
        let space = toy_space();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        space
            .sample(values.len(), &mut rng)
            .unwrap()
            .into_iter()
            .zip(values)
            .map(|(config, value)| ScoredConfiguration::new(*value, config))
            .collect()
    }

    #[test]
    fn sort_is_descending_with_nan_last() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let sorted = sort_scored(scored(&[0.1, f64::NAN, 3.0, -2.0, 1.5]), &mut rng);
        let values: Vec<f64> = sorted.iter().map(|s| s.acquisition_value).collect();
        assert_eq!(&values[..4], &[3.0, 1.5, 0.1, -2.0]);
        assert!(values[4].is_nan());
    }

    #[test]
    fn distinct_values_ignore_the_seed() {
        let items = scored(&[0.3, 0.9, 0.1, 0.5]);
        let mut first = ChaCha8Rng::seed_from_u64(1);
        let mut second = ChaCha8Rng::seed_from_u64(2);
        let a = sort_scored(items.clone(), &mut first);
        let b = sort_scored(items, &mut second);
        assert_eq!(a, b);
    }

    #[test]
    fn ties_are_deterministic_for_a_seed() {
        let items = scored(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let a = sort_scored(items.clone(), &mut ChaCha8Rng::seed_from_u64(5));
        let b = sort_scored(items.clone(), &mut ChaCha8Rng::seed_from_u64(5));
        assert_eq!(a, b);

        // Every item survives the shuffle.
        for item in &items {
            assert!(a.contains(item));
        }
    }

    #[test]
    fn ties_are_reordered_by_the_draw() {
        let items: Vec<ScoredConfiguration> = depth_ladder(6)
            .into_iter()
            .map(|c| ScoredConfiguration::new(1.0, c))
            .collect();
        let input_order = depths(items.iter().map(|item| &item.configuration));

        let orders: Vec<Vec<f64>> = (0..10)
            .map(|seed| {
                let sorted = sort_scored(items.clone(), &mut ChaCha8Rng::seed_from_u64(seed));
                depths(sorted.iter().map(|item| &item.configuration))
            })
            .collect();
        assert!(orders.iter().any(|order| *order != input_order));
        assert!(orders.iter().any(|order| *order != orders[0]));
    }

    #[test]
    fn eta_derivation() {
        let space = toy_space();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let configs = space.sample(2, &mut rng).unwrap();

        let empty = InMemoryRunHistory::new();
        assert_eq!(incumbent_value(&empty, Some(&configs[0])), 0.0);

        let mut history = InMemoryRunHistory::new();
        history.add(configs[0].clone(), 0.25);
        assert_eq!(incumbent_value(&history, None), 0.0);
        assert_eq!(incumbent_value(&history, Some(&configs[0])), 0.25);

        let unknown = space.default_configuration().unwrap();
        if history.cost(&unknown).is_none() {
            assert_eq!(incumbent_value(&history, Some(&unknown)), 0.0);
        }
    }

    #[test]
    fn update_trains_the_model_and_passes_eta() {
        let counters = Counters::default();
        let mut scorer = fake_scorer(&counters, 4);
        let x = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let y = vec![vec![0.5], vec![0.7]];

        scorer.update(&x, &y, 0.5).unwrap();
        assert_eq!(counters.train_calls.get(), 1);
        assert_eq!(counters.eta.get(), 0.5);
        assert_eq!(scorer.eta(), 0.5);

        let mismatched = scorer.update(&x, &y[..1], 0.5);
        assert!(matches!(mismatched, Err(PcError::Model { .. })));
    }

    #[test]
    fn marginalized_scoring_draws_evaluation_configs() {
        let counters = Counters::default();
        let scorer = fake_scorer(&counters, 7);
        let space = toy_space();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let configs = space.sample(3, &mut rng).unwrap();

        let values = scorer.score_marginalized(&configs, &space, &mut rng).unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(counters.last_evaluation_count.get(), 7);

        assert!(scorer.score_marginalized(&[], &space, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn rank_orders_by_score_and_keeps_origins() {
        let counters = Counters::default();
        let scorer = fake_scorer(&counters, 4);
        let space = toy_space();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let configs: Vec<Configuration> = space
            .sample(20, &mut rng)
            .unwrap()
            .into_iter()
            .map(|c| c.with_origin(Origin::RandomSearchSorted))
            .collect();

        let ranked = scorer
            .rank(configs.clone(), ScoringMode::Standard, &space, &mut rng)
            .unwrap();
        assert_eq!(ranked.len(), 20);
        for pair in ranked.windows(2) {
            assert!(pair[0].acquisition_value >= pair[1].acquisition_value);
        }
        for item in &ranked {
            assert_eq!(item.configuration.origin(), Origin::RandomSearchSorted);
            assert_eq!(item.acquisition_value, toy_score(&item.configuration));
            assert!(configs.contains(&item.configuration));
        }
    }

    #[test]
    fn wrong_number_of_values_is_an_error() {
        let counters = Counters::default();
        let scorer = AcquisitionScorer::new(
            Box::new(FakeModel::new(&counters)),
            Box::new(FakeAcquisition::new(&counters, |_| 1.0).truncating()),
            4,
        );
        let space = toy_space();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let configs = space.sample(3, &mut rng).unwrap();
        assert!(matches!(scorer.score(&configs), Err(PcError::Acquisition { .. })));
    }
}
