//! Candidate generators: random search, anchored batch variants and
//! multi-start local search.

use pc_space::ConfigurationSpace;
use pc_types::{Configuration, Origin, PcResult, ScoredConfiguration};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use tracing::{trace, warn};

use crate::acquisition::{compare_values, AcquisitionScorer, ScoringMode};
use crate::collaborators::LocalSearchOptimizer;
use crate::partition::PipelineStepPartitioner;

/// Upper bound on local-search starts when no explicit count is given.
pub const DEFAULT_MAX_LOCAL_SEARCH_STARTS: usize = 10;

/// Recombination attempts per variant before falling back to the anchor.
pub const DEFAULT_MAX_RECOMBINATION_ATTEMPTS: usize = 1000;

// ---- Random search ----

/// Uniform sampling from the configuration space.
#[derive(Debug, Clone, Copy)]
pub struct RandomSearch<'a> {
    space: &'a ConfigurationSpace,
}

impl<'a> RandomSearch<'a> {
    pub fn new(space: &'a ConfigurationSpace) -> Self {
        Self { space }
    }

    /// `n` samples with a dummy acquisition value of 0.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> PcResult<Vec<ScoredConfiguration>> {
        Ok(self
            .space
            .sample(n, rng)?
            .into_iter()
            .map(|c| ScoredConfiguration::new(0.0, c.with_origin(Origin::RandomSearch)))
            .collect())
    }

    /// `n` samples scored and ordered best-first.
    pub fn sample_sorted<R: Rng + ?Sized>(
        &self,
        n: usize,
        scorer: &AcquisitionScorer,
        mode: ScoringMode,
        rng: &mut R,
    ) -> PcResult<Vec<ScoredConfiguration>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let configs = self
            .space
            .sample(n, rng)?
            .into_iter()
            .map(|c| c.with_origin(Origin::RandomSearchSorted))
            .collect();
        scorer.rank(configs, mode, self.space, rng)
    }
}

// ---- Anchored batch variants ----

/// Builds variants of an anchor that keep its constant steps and resample
/// the variable ones.
#[derive(Debug, Clone, Copy)]
pub struct BatchVariantSearch<'a> {
    space: &'a ConfigurationSpace,
    partitioner: &'a PipelineStepPartitioner,
    max_attempts: usize,
}

impl<'a> BatchVariantSearch<'a> {
    pub fn new(space: &'a ConfigurationSpace, partitioner: &'a PipelineStepPartitioner, max_attempts: usize) -> Self {
        Self {
            space,
            partitioner,
            max_attempts,
        }
    }

    /// Recombine `anchor` with fresh donors until one is valid. After
    /// `max_attempts` failures the result is a copy of the anchor tagged
    /// [`Origin::AnchorFallback`].
    pub fn make_variant<R: Rng + ?Sized>(
        &self,
        anchor: &Configuration,
        origin: Origin,
        rng: &mut R,
    ) -> PcResult<Configuration> {
        for attempt in 1..=self.max_attempts {
            let donor = match self.space.sample_one(rng) {
                Ok(donor) => donor,
                Err(e) => {
                    trace!("Recombination attempt {} found no donor: {}", attempt, e);
                    continue;
                }
            };
            match self.partitioner.combine(self.space, anchor, &donor) {
                Ok(variant) => return Ok(variant.with_origin(origin)),
                Err(e) => trace!("Recombination attempt {} rejected: {}", attempt, e),
            }
        }
        warn!(
            "No valid variant after {} attempts, reusing anchor {}",
            self.max_attempts, anchor
        );
        Ok(anchor.clone().with_origin(Origin::AnchorFallback))
    }

    /// `n_anchors` groups of one fresh anchor followed by `leaf_size - 1`
    /// variants of it. A leaf size of 0 behaves like 1.
    pub fn make_batches<R: Rng + ?Sized>(
        &self,
        n_anchors: usize,
        leaf_size: usize,
        rng: &mut R,
    ) -> PcResult<Vec<Configuration>> {
        let leaf_size = leaf_size.max(1);
        let mut batches = Vec::with_capacity(n_anchors * leaf_size);
        for _ in 0..n_anchors {
            let anchor = self.space.sample_one(rng)?.with_origin(Origin::RandomSearchBatch);
            batches.push(anchor.clone());
            for _ in 1..leaf_size {
                batches.push(self.make_variant(&anchor, Origin::RandomSearchBatch, rng)?);
            }
        }
        Ok(batches)
    }
}

// ---- Local search ----

/// Number of local-search starts. An explicit count wins; otherwise the
/// count follows the intensification average, capped at `cap`.
pub fn local_search_budget(n_local: Option<usize>, ema_configs_per_intensify: f64, cap: usize) -> usize {
    if let Some(n) = n_local {
        return n;
    }
    if ema_configs_per_intensify > 0.0 {
        let derived = ((0.5 * ema_configs_per_intensify).ceil() as usize).saturating_add(1);
        derived.min(cap)
    } else {
        cap
    }
}

/// Runs the local-search optimizer from several start points.
pub struct LocalSearch<'a> {
    optimizer: &'a mut dyn LocalSearchOptimizer,
    scorer: &'a AcquisitionScorer,
}

impl<'a> LocalSearch<'a> {
    pub fn new(optimizer: &'a mut dyn LocalSearchOptimizer, scorer: &'a AcquisitionScorer) -> Self {
        Self { optimizer, scorer }
    }

    /// One result per start, tagged [`Origin::LocalSearch`], ordered
    /// best-first. Equal values end up in random order.
    pub fn run<R: RngCore>(&mut self, starts: &[Configuration], rng: &mut R) -> PcResult<Vec<ScoredConfiguration>> {
        let mut results = Vec::with_capacity(starts.len());
        for start in starts {
            let (config, value) = self.optimizer.maximize(start, self.scorer, rng)?;
            results.push(ScoredConfiguration::new(value, config.with_origin(Origin::LocalSearch)));
        }
        results.shuffle(rng);
        results.sort_by(|a, b| compare_values(a.acquisition_value, b.acquisition_value));
        Ok(results)
    }
}
