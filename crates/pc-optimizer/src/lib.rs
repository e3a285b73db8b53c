//! # pc-optimizer
//!
//! Challenger selection for sequential model-based optimization of machine
//! learning pipelines.
//!
//! Each selection call refits the surrogate model, exploits the acquisition
//! function with scored random samples and multi-start local search, and
//! interleaves those with exploratory batches that share their preprocessing
//! prefix. The cached selector additionally anchors candidates on the
//! marginally best preprocessing prefix.

mod acquisition;
mod collaborators;
mod config;
mod engine;
mod history;
mod interleave;
mod partition;
mod selector;
mod strategies;
mod summary;

#[cfg(test)]
mod test_support;

pub use acquisition::{incumbent_value, sort_scored, AcquisitionScorer, ScoringMode};
pub use collaborators::{
    AcquisitionFunction, IntensifyStatistics, LocalSearchOptimizer, RunHistory, SurrogateModel,
};
pub use config::{SelectionBudget, SelectorConfig, SelectorKind};
pub use engine::SelectionEngine;
pub use history::{InMemoryRunHistory, IntensifyStats, DEFAULT_EMA_ALPHA};
pub use interleave::{interleave_alternating, interleave_blocks};
pub use partition::{Partition, PipelineStepPartitioner};
pub use selector::{CachedSelector, ChallengerSelector, PlainSelector, SelectionContext};
pub use strategies::{
    local_search_budget, BatchVariantSearch, LocalSearch, RandomSearch, DEFAULT_MAX_LOCAL_SEARCH_STARTS,
    DEFAULT_MAX_RECOMBINATION_ATTEMPTS,
};
pub use summary::{SelectionId, SelectionSummary};
