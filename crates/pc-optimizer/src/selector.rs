//! Challenger selectors: the plain and the cached selection flows.

use std::time::Instant;

use pc_types::{Configuration, Origin, PcResult, ScoredConfiguration};
use tracing::{debug, info};

use crate::acquisition::ScoringMode;
use crate::collaborators::{IntensifyStatistics, RunHistory};
use crate::config::SelectionBudget;
use crate::engine::SelectionEngine;
use crate::interleave::{interleave_alternating, interleave_blocks};
use crate::summary::SelectionSummary;

/// Inputs of one selection call.
#[derive(Clone, Copy)]
pub struct SelectionContext<'a> {
    /// Encoded configurations evaluated so far.
    pub x: &'a [Vec<f64>],
    /// Observed costs, one row per row of `x`.
    pub y: &'a [Vec<f64>],
    pub incumbent: Option<&'a Configuration>,
    pub run_history: &'a dyn RunHistory,
    pub stats: &'a dyn IntensifyStatistics,
}

impl<'a> SelectionContext<'a> {
    pub fn new(
        x: &'a [Vec<f64>],
        y: &'a [Vec<f64>],
        run_history: &'a dyn RunHistory,
        stats: &'a dyn IntensifyStatistics,
    ) -> Self {
        Self {
            x,
            y,
            incumbent: None,
            run_history,
            stats,
        }
    }

    pub fn with_incumbent(mut self, incumbent: Option<&'a Configuration>) -> Self {
        self.incumbent = incumbent;
        self
    }
}

/// Produces the ordered list of configurations to evaluate next.
pub trait ChallengerSelector {
    fn select(&mut self, ctx: &SelectionContext<'_>, budget: &SelectionBudget) -> PcResult<Vec<Configuration>>;

    fn name(&self) -> &str;

    /// Diagnostics of the most recent successful `select`.
    fn last_summary(&self) -> Option<&SelectionSummary>;
}

fn log_head(selector: &str, exploit: &[ScoredConfiguration]) {
    for (rank, item) in exploit.iter().take(10).enumerate() {
        debug!(
            "{} exploit #{}: value={:.5} origin={}",
            selector,
            rank,
            item.acquisition_value,
            item.configuration.origin()
        );
    }
}

fn finish(
    selector: &str,
    mut summary: SelectionSummary,
    exploit: Vec<ScoredConfiguration>,
    explore: Vec<Configuration>,
    challengers: impl FnOnce(Vec<Configuration>, Vec<Configuration>) -> Vec<Configuration>,
) -> (Vec<Configuration>, SelectionSummary) {
    summary.best_acquisition_value = exploit.first().map(|s| s.acquisition_value);
    summary.exploit_count = exploit.len();
    summary.explore_count = explore.len();

    let exploit = exploit.into_iter().map(|s| s.configuration).collect();
    let challengers = challengers(exploit, explore);
    summary.finish(&challengers);

    info!(
        "{} selector returned {} challengers ({} exploit, {} explore) in {}ms",
        selector,
        challengers.len(),
        summary.exploit_count,
        summary.explore_count,
        summary.duration_ms
    );
    (challengers, summary)
}

// ---- Plain selector ----

/// Exploits with scored random samples and local search from the best
/// evaluated configurations, explores with anchored random batches.
pub struct PlainSelector {
    engine: SelectionEngine,
    last_summary: Option<SelectionSummary>,
}

impl PlainSelector {
    pub fn new(engine: SelectionEngine) -> Self {
        Self {
            engine,
            last_summary: None,
        }
    }

    pub fn engine(&self) -> &SelectionEngine {
        &self.engine
    }
}

impl ChallengerSelector for PlainSelector {
    fn select(&mut self, ctx: &SelectionContext<'_>, budget: &SelectionBudget) -> PcResult<Vec<Configuration>> {
        budget.validate()?;
        let mut summary = SelectionSummary::start(self.name());
        summary.eta = self.engine.prepare(ctx)?;

        let history = ctx.run_history.configurations();
        let k = self.engine.local_search_starts(ctx, budget);
        summary.local_search_starts = k.min(history.len());

        let stage = Instant::now();
        let mut exploit = self.engine.random_sorted(budget.n_random, ScoringMode::Standard)?;
        exploit.extend(self.engine.local_from_seeds(history, k)?);
        let exploit = self.engine.sort(exploit);
        debug!("Exploitation took {:?}", stage.elapsed());
        log_head(self.name(), &exploit);

        let stage = Instant::now();
        let explore = self.engine.explore(exploit.len(), budget.leaf_size)?;
        debug!("Exploration took {:?}", stage.elapsed());
        let leaf_size = budget.leaf_size;
        let (challengers, summary) = finish(self.name(), summary, exploit, explore, |exploit, explore| {
            interleave_alternating(exploit, explore, leaf_size)
        });
        self.last_summary = Some(summary);
        Ok(challengers)
    }

    fn name(&self) -> &str {
        "plain"
    }

    fn last_summary(&self) -> Option<&SelectionSummary> {
        self.last_summary.as_ref()
    }
}

// ---- Cached selector ----

/// Plain selection plus candidates that share the constant steps of the
/// marginally best configuration, so their prefix can be reused.
pub struct CachedSelector {
    engine: SelectionEngine,
    last_summary: Option<SelectionSummary>,
}

impl CachedSelector {
    pub fn new(engine: SelectionEngine) -> Self {
        Self {
            engine,
            last_summary: None,
        }
    }

    pub fn engine(&self) -> &SelectionEngine {
        &self.engine
    }
}

impl ChallengerSelector for CachedSelector {
    fn select(&mut self, ctx: &SelectionContext<'_>, budget: &SelectionBudget) -> PcResult<Vec<Configuration>> {
        budget.validate()?;
        let mut summary = SelectionSummary::start(self.name());
        summary.eta = self.engine.prepare(ctx)?;

        let history = ctx.run_history.configurations();
        let k = self.engine.local_search_starts(ctx, budget);

        let stage = Instant::now();
        let best = self.engine.marginal_best(&history)?.configuration;

        let mut variants = Vec::with_capacity(budget.n_random);
        for _ in 0..budget.n_random {
            variants.push(self.engine.variant(&best, Origin::RandomSearchMarginalizedSorted)?);
        }
        let anchored_random = self.engine.rank(variants, ScoringMode::Standard)?;

        let rebuilt = self.engine.recombine_history(&best, &history);
        let anchored_starts = k.min(rebuilt.len());
        let mut anchored_local = self.engine.local_from_seeds(rebuilt, k)?;
        for item in &mut anchored_local {
            item.configuration.set_origin(Origin::LocalSearchMarginalized);
        }
        debug!("Anchored exploitation took {:?}", stage.elapsed());

        let stage = Instant::now();
        let exploit_random = self.engine.random_sorted(budget.n_random, ScoringMode::Standard)?;
        summary.local_search_starts = anchored_starts + k.min(history.len());
        let exploit_local = self.engine.local_from_seeds(history, k)?;

        let mut merged = anchored_random;
        merged.extend(anchored_local);
        merged.extend(exploit_random);
        merged.extend(exploit_local);
        let exploit = self.engine.sort(merged);
        debug!("Exploitation took {:?}", stage.elapsed());
        log_head(self.name(), &exploit);

        let leaf_size = budget.leaf_size;
        let stage = Instant::now();
        let explore = self.engine.explore(exploit.len() / leaf_size, leaf_size)?;
        debug!("Exploration took {:?}", stage.elapsed());
        let (challengers, summary) = finish(self.name(), summary, exploit, explore, |exploit, explore| {
            interleave_blocks(exploit, explore, leaf_size)
        });
        self.last_summary = Some(summary);
        Ok(challengers)
    }

    fn name(&self) -> &str {
        "cached"
    }

    fn last_summary(&self) -> Option<&SelectionSummary> {
        self.last_summary.as_ref()
    }
}
