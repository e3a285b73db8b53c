//! Fakes shared by the unit tests.

use std::cell::Cell;
use std::rc::Rc;

use pc_space::{Condition, ConfigurationSpace, ConfigurationSpaceBuilder, ForbiddenClause};
use pc_types::{Configuration, HyperparameterKey, HyperparameterValue, PcError, PcResult, PipelineStepSet};
use rand::RngCore;

use crate::acquisition::AcquisitionScorer;
use crate::collaborators::{AcquisitionFunction, LocalSearchOptimizer, SurrogateModel};
use crate::config::SelectorConfig;
use crate::engine::SelectionEngine;

/// Counters shared between a test and the fakes it hands out.
#[derive(Debug, Clone, Default)]
pub(crate) struct Counters {
    pub train_calls: Rc<Cell<usize>>,
    pub eta: Rc<Cell<f64>>,
    pub last_evaluation_count: Rc<Cell<usize>>,
    pub local_search_calls: Rc<Cell<usize>>,
}

fn toy_builder() -> ConfigurationSpaceBuilder {
    ConfigurationSpace::builder()
        .add_categorical("preprocessor:__choice__", &["none", "pca"], "none")
        .add_float("preprocessor:pca:keep_variance", 0.5, 0.99, 0.9)
        .add_categorical("classifier:__choice__", &["tree", "svc"], "tree")
        .add_int("classifier:tree:max_depth", 1, 10, 3)
        .add_log_float("classifier:svc:C", 0.01, 100.0, 1.0)
        .add_condition(Condition::equals(
            "preprocessor:pca:keep_variance",
            "preprocessor:__choice__",
            "pca",
        ))
        .add_condition(Condition::equals("classifier:tree:max_depth", "classifier:__choice__", "tree"))
        .add_condition(Condition::equals("classifier:svc:C", "classifier:__choice__", "svc"))
}

/// Two-step pipeline: `preprocessor` then `classifier`.
pub(crate) fn toy_space() -> ConfigurationSpace {
    toy_builder().build().unwrap()
}

/// The toy space where pca may not feed an svc.
pub(crate) fn toy_space_with_cross_forbidden() -> ConfigurationSpace {
    toy_builder()
        .add_forbidden(ForbiddenClause::and(vec![
            ForbiddenClause::equals("preprocessor:__choice__", "pca"),
            ForbiddenClause::equals("classifier:__choice__", "svc"),
        ]))
        .build()
        .unwrap()
}

/// The toy space plus a step that is neither constant nor variable.
pub(crate) fn toy_space_with_unassigned_step() -> ConfigurationSpace {
    toy_builder()
        .add_categorical("postprocessor:calibrate", &["yes", "no"], "no")
        .build()
        .unwrap()
}

/// Distinct valid toy configurations, `max_depth` running from 1 to `n`.
pub(crate) fn depth_ladder(n: i64) -> Vec<Configuration> {
    let space = toy_space();
    (1..=n)
        .map(|depth| {
            space
                .configuration(
                    [
                        ("preprocessor:__choice__", HyperparameterValue::from("none")),
                        ("classifier:__choice__", HyperparameterValue::from("tree")),
                        ("classifier:tree:max_depth", HyperparameterValue::Int(depth)),
                    ]
                    .into_iter()
                    .map(|(name, value)| (HyperparameterKey::parse(name), value))
                    .collect(),
                )
                .unwrap()
        })
        .collect()
}

/// `max_depth` of each configuration, in order.
pub(crate) fn depths<'a>(configs: impl IntoIterator<Item = &'a Configuration>) -> Vec<f64> {
    configs
        .into_iter()
        .map(|c| c.get_by_name("classifier:tree:max_depth").and_then(|v| v.as_f64()).unwrap_or(0.0))
        .collect()
}

pub(crate) fn toy_steps() -> PipelineStepSet {
    PipelineStepSet::new(["preprocessor"], ["classifier"]).unwrap()
}

/// Deterministic acquisition: favours pca with high kept variance and svc
/// with large C.
pub(crate) fn toy_score(config: &Configuration) -> f64 {
    let number = |name: &str| config.get_by_name(name).and_then(|v| v.as_f64()).unwrap_or(0.0);
    let choice = |name: &str| config.get_by_name(name).and_then(|v| v.as_str()).unwrap_or("");

    let preprocessor = match choice("preprocessor:__choice__") {
        "pca" => number("preprocessor:pca:keep_variance"),
        _ => 0.0,
    };
    let classifier = match choice("classifier:__choice__") {
        "svc" => number("classifier:svc:C").ln(),
        "tree" => number("classifier:tree:max_depth") / 10.0,
        _ => 0.0,
    };
    preprocessor + classifier
}

pub(crate) struct FakeModel {
    counters: Counters,
}

impl FakeModel {
    pub fn new(counters: &Counters) -> Self {
        Self { counters: counters.clone() }
    }
}

impl SurrogateModel for FakeModel {
    fn train(&mut self, _x: &[Vec<f64>], _y: &[Vec<f64>]) -> PcResult<()> {
        self.counters.train_calls.set(self.counters.train_calls.get() + 1);
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> PcResult<(f64, f64)> {
        Ok((x.iter().sum(), 1.0))
    }
}

pub(crate) struct FakeAcquisition {
    counters: Counters,
    score_fn: fn(&Configuration) -> f64,
    truncate: bool,
}

impl FakeAcquisition {
    pub fn new(counters: &Counters, score_fn: fn(&Configuration) -> f64) -> Self {
        Self {
            counters: counters.clone(),
            score_fn,
            truncate: false,
        }
    }

    /// Return one value fewer than asked for.
    pub fn truncating(mut self) -> Self {
        self.truncate = true;
        self
    }

    fn values(&self, configs: &[Configuration]) -> Vec<f64> {
        let mut values: Vec<f64> = configs.iter().map(self.score_fn).collect();
        if self.truncate {
            values.pop();
        }
        values
    }
}

impl AcquisitionFunction for FakeAcquisition {
    fn update(&mut self, _model: &dyn SurrogateModel, eta: f64) {
        self.counters.eta.set(eta);
    }

    fn score(&self, _model: &dyn SurrogateModel, configs: &[Configuration]) -> PcResult<Vec<f64>> {
        Ok(self.values(configs))
    }

    fn score_marginalized(
        &self,
        _model: &dyn SurrogateModel,
        configs: &[Configuration],
        evaluation_configs: &[Configuration],
    ) -> PcResult<Vec<f64>> {
        self.counters.last_evaluation_count.set(evaluation_configs.len());
        Ok(self.values(configs))
    }
}

/// Returns its start point unchanged.
pub(crate) struct StayingLocalSearch {
    counters: Counters,
    fail: bool,
}

impl StayingLocalSearch {
    pub fn new(counters: &Counters) -> Self {
        Self {
            counters: counters.clone(),
            fail: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl LocalSearchOptimizer for StayingLocalSearch {
    fn maximize(
        &mut self,
        start: &Configuration,
        scorer: &AcquisitionScorer,
        _rng: &mut dyn RngCore,
    ) -> PcResult<(Configuration, f64)> {
        self.counters.local_search_calls.set(self.counters.local_search_calls.get() + 1);
        if self.fail {
            return Err(PcError::LocalSearch {
                message: "stuck".to_string(),
            });
        }
        let value = scorer.score(std::slice::from_ref(start))?[0];
        Ok((start.clone(), value))
    }
}

pub(crate) fn fake_scorer(counters: &Counters, evaluation_samples: usize) -> AcquisitionScorer {
    AcquisitionScorer::new(
        Box::new(FakeModel::new(counters)),
        Box::new(FakeAcquisition::new(counters, toy_score)),
        evaluation_samples,
    )
}

pub(crate) fn fake_engine(counters: &Counters, space: ConfigurationSpace, config: SelectorConfig) -> SelectionEngine {
    SelectionEngine::new(
        space,
        toy_steps(),
        Box::new(FakeModel::new(counters)),
        Box::new(FakeAcquisition::new(counters, toy_score)),
        Box::new(StayingLocalSearch::new(counters)),
        config,
    )
    .unwrap()
}
