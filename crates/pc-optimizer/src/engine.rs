//! Shared state and stages of the challenger selectors.

use pc_space::ConfigurationSpace;
use pc_types::{
    internal_error, Configuration, Origin, PcResult, PipelineStepSet, ScoredConfiguration, ValidationError,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::acquisition::{incumbent_value, sort_scored, AcquisitionScorer, ScoringMode};
use crate::collaborators::{AcquisitionFunction, LocalSearchOptimizer, SurrogateModel};
use crate::config::{SelectionBudget, SelectorConfig, SelectorKind};
use crate::partition::PipelineStepPartitioner;
use crate::selector::{CachedSelector, ChallengerSelector, PlainSelector, SelectionContext};
use crate::strategies::{local_search_budget, BatchVariantSearch, LocalSearch, RandomSearch};

/// Everything a selector needs between calls. All randomness is drawn from
/// one seeded stream so a run is reproducible from its seed.
pub struct SelectionEngine {
    space: ConfigurationSpace,
    partitioner: PipelineStepPartitioner,
    scorer: AcquisitionScorer,
    local_optimizer: Box<dyn LocalSearchOptimizer>,
    config: SelectorConfig,
    rng: ChaCha8Rng,
}

impl SelectionEngine {
    pub fn new(
        space: ConfigurationSpace,
        steps: PipelineStepSet,
        model: Box<dyn SurrogateModel>,
        acquisition: Box<dyn AcquisitionFunction>,
        local_optimizer: Box<dyn LocalSearchOptimizer>,
        config: SelectorConfig,
    ) -> PcResult<Self> {
        config.validate()?;
        Ok(Self {
            space,
            partitioner: PipelineStepPartitioner::new(steps),
            scorer: AcquisitionScorer::new(model, acquisition, config.evaluation_samples),
            local_optimizer,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
        })
    }

    pub fn space(&self) -> &ConfigurationSpace {
        &self.space
    }

    pub fn partitioner(&self) -> &PipelineStepPartitioner {
        &self.partitioner
    }

    pub fn scorer(&self) -> &AcquisitionScorer {
        &self.scorer
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Wrap in the selector named by the config.
    pub fn into_selector(self) -> Box<dyn ChallengerSelector> {
        match self.config.kind {
            SelectorKind::Plain => Box::new(PlainSelector::new(self)),
            SelectorKind::Cached => Box::new(CachedSelector::new(self)),
        }
    }

    /// Derive the incumbent value and refit the model. Returns eta.
    pub(crate) fn prepare(&mut self, ctx: &SelectionContext<'_>) -> PcResult<f64> {
        let eta = incumbent_value(ctx.run_history, ctx.incumbent);
        self.scorer.update(ctx.x, ctx.y, eta)?;
        Ok(eta)
    }

    pub(crate) fn local_search_starts(&self, ctx: &SelectionContext<'_>, budget: &SelectionBudget) -> usize {
        local_search_budget(
            budget.n_local,
            ctx.stats.ema_configs_per_intensify(),
            self.config.max_local_search_starts,
        )
    }

    pub(crate) fn random_sorted(&mut self, n: usize, mode: ScoringMode) -> PcResult<Vec<ScoredConfiguration>> {
        RandomSearch::new(&self.space).sample_sorted(n, &self.scorer, mode, &mut self.rng)
    }

    pub(crate) fn rank(&mut self, configs: Vec<Configuration>, mode: ScoringMode) -> PcResult<Vec<ScoredConfiguration>> {
        self.scorer.rank(configs, mode, &self.space, &mut self.rng)
    }

    /// Rank `seeds` and hill-climb from the best `k` of them.
    pub(crate) fn local_from_seeds(&mut self, seeds: Vec<Configuration>, k: usize) -> PcResult<Vec<ScoredConfiguration>> {
        if seeds.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let starts: Vec<Configuration> = self
            .rank(seeds, ScoringMode::Standard)?
            .into_iter()
            .take(k)
            .map(|s| s.configuration)
            .collect();
        LocalSearch::new(self.local_optimizer.as_mut(), &self.scorer).run(&starts, &mut self.rng)
    }

    pub(crate) fn sort(&mut self, items: Vec<ScoredConfiguration>) -> Vec<ScoredConfiguration> {
        sort_scored(items, &mut self.rng)
    }

    pub(crate) fn variant(&mut self, anchor: &Configuration, origin: Origin) -> PcResult<Configuration> {
        BatchVariantSearch::new(&self.space, &self.partitioner, self.config.max_recombination_attempts)
            .make_variant(anchor, origin, &mut self.rng)
    }

    pub(crate) fn recombine(&self, anchor: &Configuration, donor: &Configuration) -> Result<Configuration, ValidationError> {
        self.partitioner.combine(&self.space, anchor, donor)
    }

    /// Anchored random batches for exploration.
    pub(crate) fn explore(&mut self, n_anchors: usize, leaf_size: usize) -> PcResult<Vec<Configuration>> {
        BatchVariantSearch::new(&self.space, &self.partitioner, self.config.max_recombination_attempts)
            .make_batches(n_anchors, leaf_size, &mut self.rng)
    }

    /// Best candidate under marginalized scoring among a few random samples
    /// and the evaluated configurations.
    pub(crate) fn marginal_best(&mut self, history: &[Configuration]) -> PcResult<ScoredConfiguration> {
        let mut candidates = self.random_sorted(self.config.marginalization_samples, ScoringMode::Marginalized)?;
        candidates.extend(self.rank(history.to_vec(), ScoringMode::Marginalized)?);
        let best = self
            .sort(candidates)
            .into_iter()
            .next()
            .ok_or_else(|| internal_error!("no candidates to choose a cached prefix from"))?;
        debug!(
            "Cached prefix chosen with marginal value {} ({})",
            best.acquisition_value,
            best.configuration.origin()
        );
        Ok(best)
    }

    /// History configurations rebuilt on top of `anchor`'s constant steps.
    /// Invalid combinations are skipped.
    pub(crate) fn recombine_history(&self, anchor: &Configuration, history: &[Configuration]) -> Vec<Configuration> {
        history
            .iter()
            .filter_map(|donor| match self.recombine(anchor, donor) {
                Ok(config) => Some(config),
                Err(e) => {
                    trace!("Skipping history configuration: {}", e);
                    None
                }
            })
            .collect()
    }
}
