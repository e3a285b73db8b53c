//! Runs a few rounds of challenger selection on the default pipeline space
//! against a synthetic objective.
//!
//! `CHALLENGER_DEMO_SELECTOR=cached` switches to the cached selector,
//! `CHALLENGER_DEMO_SEED` sets the seed and `RUST_LOG` the log level.

use pc_optimizer::{
    AcquisitionFunction, AcquisitionScorer, InMemoryRunHistory, IntensifyStats, LocalSearchOptimizer,
    SelectionBudget, SelectionContext, SelectionEngine, SelectorConfig, SelectorKind, SurrogateModel,
};
use pc_space::{default_pipeline_space, ConfigurationSpace};
use pc_types::{Configuration, PcError, PcResult, PipelineStepSet};
use rand::RngCore;
use tracing::info;
use tracing_subscriber::EnvFilter;

const ROUNDS: usize = 8;
const EVALUATIONS_PER_ROUND: usize = 4;

/// Mean is the cost of the closest observation, variance its squared
/// distance.
#[derive(Default)]
struct NearestNeighbour {
    x: Vec<Vec<f64>>,
    y: Vec<f64>,
}

impl SurrogateModel for NearestNeighbour {
    fn train(&mut self, x: &[Vec<f64>], y: &[Vec<f64>]) -> PcResult<()> {
        self.x = x.to_vec();
        self.y = y
            .iter()
            .map(|row| {
                row.first().copied().ok_or_else(|| PcError::Model {
                    message: "empty target row".to_string(),
                })
            })
            .collect::<PcResult<_>>()?;
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> PcResult<(f64, f64)> {
        let nearest = self
            .x
            .iter()
            .zip(&self.y)
            .map(|(row, cost)| (squared_distance(row, x), *cost))
            .min_by(|a, b| a.0.total_cmp(&b.0));
        Ok(match nearest {
            Some((distance, cost)) => (cost, distance),
            None => (0.0, 1.0),
        })
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(p, q)| (p - q).powi(2)).sum()
}

/// Improvement over eta plus one standard deviation.
struct OptimisticImprovement {
    space: ConfigurationSpace,
    eta: f64,
}

impl OptimisticImprovement {
    fn value(&self, model: &dyn SurrogateModel, x: &[f64]) -> PcResult<f64> {
        let (mean, variance) = model.predict(x)?;
        Ok(self.eta - mean + variance.sqrt())
    }
}

impl AcquisitionFunction for OptimisticImprovement {
    fn update(&mut self, _model: &dyn SurrogateModel, eta: f64) {
        self.eta = eta;
    }

    fn score(&self, model: &dyn SurrogateModel, configs: &[Configuration]) -> PcResult<Vec<f64>> {
        configs
            .iter()
            .map(|c| self.value(model, &self.space.to_vector(c)))
            .collect()
    }

    fn score_marginalized(
        &self,
        model: &dyn SurrogateModel,
        configs: &[Configuration],
        evaluation_configs: &[Configuration],
    ) -> PcResult<Vec<f64>> {
        let evaluation: Vec<Vec<f64>> = evaluation_configs.iter().map(|c| self.space.to_vector(c)).collect();
        configs
            .iter()
            .map(|c| {
                let x = self.space.to_vector(c);
                let mut total = 0.0;
                for other in &evaluation {
                    let blended: Vec<f64> = x.iter().zip(other).map(|(a, b)| 0.5 * (a + b)).collect();
                    total += self.value(model, &blended)?;
                }
                Ok(total / evaluation.len().max(1) as f64)
            })
            .collect()
    }
}

/// Best of the start point and a handful of random draws.
struct RandomNeighbourhood {
    space: ConfigurationSpace,
    draws: usize,
}

impl LocalSearchOptimizer for RandomNeighbourhood {
    fn maximize(
        &mut self,
        start: &Configuration,
        scorer: &AcquisitionScorer,
        rng: &mut dyn RngCore,
    ) -> PcResult<(Configuration, f64)> {
        let mut candidates = vec![start.clone()];
        candidates.extend(self.space.sample(self.draws, rng)?);
        let values = scorer.score(&candidates)?;
        candidates
            .into_iter()
            .zip(values)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or_else(|| PcError::LocalSearch {
                message: "no candidates".to_string(),
            })
    }
}

fn objective(space: &ConfigurationSpace, config: &Configuration) -> f64 {
    let x = space.to_vector(config);
    let total: f64 = x
        .iter()
        .enumerate()
        .map(|(i, v)| (v - ((i * 7) % 10) as f64 / 10.0).powi(2))
        .sum();
    total / x.len().max(1) as f64
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let seed = std::env::var("CHALLENGER_DEMO_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let kind = match std::env::var("CHALLENGER_DEMO_SELECTOR").as_deref() {
        Ok("cached") => SelectorKind::Cached,
        _ => SelectorKind::Plain,
    };

    let space = default_pipeline_space()?;
    let steps = PipelineStepSet::new(["imputation", "feature_preprocessor"], ["classifier"])?;
    let mut selector = SelectionEngine::new(
        space.clone(),
        steps,
        Box::new(NearestNeighbour::default()),
        Box::new(OptimisticImprovement {
            space: space.clone(),
            eta: 0.0,
        }),
        Box::new(RandomNeighbourhood {
            space: space.clone(),
            draws: 20,
        }),
        SelectorConfig::new(kind).with_seed(seed).with_evaluation_samples(20),
    )?
    .into_selector();
    let budget = SelectionBudget::new(200, 2);

    let mut history = InMemoryRunHistory::new();
    let mut stats = IntensifyStats::default();
    let mut x = Vec::new();
    let mut y = Vec::new();

    let initial = space.default_configuration()?;
    let cost = objective(&space, &initial);
    x.push(space.to_vector(&initial));
    y.push(vec![cost]);
    history.add(initial, cost);

    for round in 0..ROUNDS {
        let incumbent = history.best().map(|(config, _)| config.clone());
        let ctx = SelectionContext::new(&x, &y, &history, &stats).with_incumbent(incumbent.as_ref());
        let challengers = selector.select(&ctx, &budget)?;

        for challenger in challengers.iter().take(EVALUATIONS_PER_ROUND) {
            let cost = objective(&space, challenger);
            info!("Round {} evaluated {} -> {:.4}", round, challenger.origin(), cost);
            x.push(space.to_vector(challenger));
            y.push(vec![cost]);
            history.add(challenger.clone(), cost);
        }
        stats.record_intensify(EVALUATIONS_PER_ROUND);

        if let Some(summary) = selector.last_summary() {
            println!("{}", serde_json::to_string(summary)?);
        }
    }

    if let Some((best, cost)) = history.best() {
        println!("Best after {} runs: {:.4} {}", history.run_count(), cost, best);
    }
    Ok(())
}
