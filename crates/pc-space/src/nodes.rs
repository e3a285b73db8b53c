//! Search spaces of the pipeline nodes and the builder that assembles them
//! into one pipeline configuration space.
//!
//! A node's hyperparameters are declared unprefixed; [`PipelineSpaceBuilder`]
//! moves them under `"<step>:<node>:"` and makes them conditional on the
//! step's `"<step>:__choice__"` categorical.

use pc_types::{HyperparameterValue, SpaceError};
use std::collections::BTreeMap;

use crate::conditions::{prefix_key, Condition};
use crate::forbidden::ForbiddenClause;
use crate::hyperparameter::Hyperparameter;
use crate::space::{ConfigurationSpace, ConfigurationSpaceBuilder};

/// Name of the categorical selecting a step's node.
pub const CHOICE_FIELD: &str = "__choice__";

/// Unprefixed search space of a single node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSpace {
    pub hyperparameters: Vec<Hyperparameter>,
    pub conditions: Vec<Condition>,
    pub forbidden: Vec<ForbiddenClause>,
}

/// A pipeline stage algorithm that contributes hyperparameters.
pub trait PipelineNode {
    fn name(&self) -> &'static str;

    /// Pipeline stage the node belongs to, e.g. `"classifier"`.
    fn step_type(&self) -> &'static str;

    /// Values used for every hyperparameter the node accepts, including
    /// ones that are not searched.
    fn default_hyperparameters(&self) -> BTreeMap<String, HyperparameterValue>;

    fn search_space(&self) -> NodeSpace;

    fn full_name(&self) -> String {
        format!("{}:{}", self.step_type(), self.name())
    }

    /// Fill in defaults for every hyperparameter not given.
    fn with_defaults(
        &self,
        mut given: BTreeMap<String, HyperparameterValue>,
    ) -> BTreeMap<String, HyperparameterValue> {
        for (name, value) in self.default_hyperparameters() {
            given.entry(name).or_insert(value);
        }
        given
    }
}

fn defaults(pairs: &[(&str, HyperparameterValue)]) -> BTreeMap<String, HyperparameterValue> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImputationNode;

impl PipelineNode for ImputationNode {
    fn name(&self) -> &'static str {
        "imputation"
    }

    fn step_type(&self) -> &'static str {
        "imputation"
    }

    fn default_hyperparameters(&self) -> BTreeMap<String, HyperparameterValue> {
        defaults(&[("strategy", "mean".into())])
    }

    fn search_space(&self) -> NodeSpace {
        NodeSpace {
            hyperparameters: vec![Hyperparameter::categorical(
                "strategy",
                &["mean", "median", "most_frequent"],
                "mean",
            )],
            ..NodeSpace::default()
        }
    }
}

/// Nystroem kernel approximation.
#[derive(Debug, Clone, Copy)]
pub struct NystroemSamplerNode {
    /// `chi2` needs dense, non-negative input.
    pub allow_chi2: bool,
}

impl Default for NystroemSamplerNode {
    fn default() -> Self {
        Self { allow_chi2: true }
    }
}

impl PipelineNode for NystroemSamplerNode {
    fn name(&self) -> &'static str {
        "nystroem_sampler"
    }

    fn step_type(&self) -> &'static str {
        "feature_preprocessor"
    }

    fn default_hyperparameters(&self) -> BTreeMap<String, HyperparameterValue> {
        defaults(&[
            ("n_components", HyperparameterValue::Int(100)),
            ("kernel", "rbf".into()),
            ("degree", HyperparameterValue::Int(3)),
            ("gamma", HyperparameterValue::Float(1.0)),
            ("coef0", HyperparameterValue::Float(0.0)),
        ])
    }

    fn search_space(&self) -> NodeSpace {
        let mut kernels = vec!["poly", "rbf", "sigmoid", "cosine"];
        let mut gamma_kernels = vec!["poly", "rbf", "sigmoid"];
        if self.allow_chi2 {
            kernels.push("chi2");
            gamma_kernels.push("chi2");
        }

        NodeSpace {
            hyperparameters: vec![
                Hyperparameter::categorical("kernel", &kernels, "rbf"),
                Hyperparameter::uniform_int("degree", 2, 5, 3),
                Hyperparameter::log_float("gamma", 3.0517578125e-05, 8.0, 0.1),
                Hyperparameter::uniform_float("coef0", -1.0, 1.0, 0.0),
                Hyperparameter::log_int("n_components", 50, 10000, 100),
            ],
            conditions: vec![
                Condition::equals("degree", "kernel", "poly"),
                Condition::one_of("coef0", "kernel", &["poly", "sigmoid"]),
                Condition::one_of("gamma", "kernel", &gamma_kernels),
            ],
            forbidden: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionTreeNode;

impl PipelineNode for DecisionTreeNode {
    fn name(&self) -> &'static str {
        "decision_tree"
    }

    fn step_type(&self) -> &'static str {
        "classifier"
    }

    fn default_hyperparameters(&self) -> BTreeMap<String, HyperparameterValue> {
        defaults(&[
            ("criterion", "gini".into()),
            ("splitter", "best".into()),
            ("max_features", HyperparameterValue::Float(1.0)),
            ("max_depth", HyperparameterValue::Float(0.5)),
            ("min_samples_split", HyperparameterValue::Int(2)),
            ("min_samples_leaf", HyperparameterValue::Int(1)),
            ("min_weight_fraction_leaf", HyperparameterValue::Float(0.0)),
            ("max_leaf_nodes", "None".into()),
        ])
    }

    fn search_space(&self) -> NodeSpace {
        NodeSpace {
            hyperparameters: vec![
                Hyperparameter::categorical("criterion", &["gini", "entropy"], "gini"),
                Hyperparameter::uniform_float("max_depth", 0.0, 2.0, 0.5),
                Hyperparameter::uniform_int("min_samples_split", 2, 20, 2),
                Hyperparameter::uniform_int("min_samples_leaf", 1, 20, 1),
            ],
            ..NodeSpace::default()
        }
    }
}

/// Linear SVC backed by liblinear.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibLinearSvcNode;

impl PipelineNode for LibLinearSvcNode {
    fn name(&self) -> &'static str {
        "liblinear_svc"
    }

    fn step_type(&self) -> &'static str {
        "classifier"
    }

    fn default_hyperparameters(&self) -> BTreeMap<String, HyperparameterValue> {
        defaults(&[
            ("penalty", "l2".into()),
            ("loss", "squared_hinge".into()),
            ("dual", "False".into()),
            ("tol", HyperparameterValue::Float(1e-4)),
            ("C", HyperparameterValue::Float(1.0)),
            ("multi_class", "ovr".into()),
            ("fit_intercept", "True".into()),
            ("intercept_scaling", HyperparameterValue::Int(1)),
        ])
    }

    fn search_space(&self) -> NodeSpace {
        // dual is fixed to False, which rules out l1 entirely.
        NodeSpace {
            hyperparameters: vec![
                Hyperparameter::categorical("penalty", &["l1", "l2"], "l2"),
                Hyperparameter::categorical("loss", &["hinge", "squared_hinge"], "squared_hinge"),
                Hyperparameter::log_float("tol", 1e-5, 1e-1, 1e-4),
                Hyperparameter::log_float("C", 0.03125, 32768.0, 1.0),
            ],
            conditions: Vec::new(),
            forbidden: vec![
                ForbiddenClause::and(vec![
                    ForbiddenClause::equals("penalty", "l1"),
                    ForbiddenClause::equals("loss", "hinge"),
                ]),
                ForbiddenClause::and(vec![
                    ForbiddenClause::equals("penalty", "l2"),
                    ForbiddenClause::equals("loss", "hinge"),
                ]),
                ForbiddenClause::equals("penalty", "l1"),
            ],
        }
    }
}

/// Assembles node spaces step by step into one configuration space.
#[derive(Debug, Clone, Default)]
pub struct PipelineSpaceBuilder {
    builder: ConfigurationSpaceBuilder,
}

impl PipelineSpaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step whose algorithm is chosen among `nodes`; the first node is
    /// the default choice.
    pub fn add_step(mut self, step: &str, nodes: &[&dyn PipelineNode]) -> Result<Self, SpaceError> {
        let Some(first) = nodes.first() else {
            return Err(SpaceError::EmptyChoices {
                name: format!("{step}:{CHOICE_FIELD}"),
            });
        };

        let choice = format!("{step}:{CHOICE_FIELD}");
        let names: Vec<&str> = nodes.iter().map(|n| n.name()).collect();
        let mut builder = self.builder.add_categorical(&choice, &names, first.name());

        for node in nodes {
            let prefix = format!("{step}:{}", node.name());
            let space = node.search_space();

            for hp in &space.hyperparameters {
                let renamed = prefix_key(&prefix, &hp.name);
                let gate = Condition::equals(&renamed.to_string(), &choice, node.name());
                builder = builder.add_hyperparameter(hp.renamed(renamed)).add_condition(gate);
            }
            for condition in &space.conditions {
                builder = builder.add_condition(condition.prefixed(&prefix));
            }
            for clause in &space.forbidden {
                builder = builder.add_forbidden(clause.prefixed(&prefix));
            }
        }

        self.builder = builder;
        Ok(self)
    }

    /// Forbid a combination spanning several steps, e.g. a preprocessor that
    /// is incompatible with a classifier.
    pub fn add_forbidden(mut self, clause: ForbiddenClause) -> Self {
        self.builder = self.builder.add_forbidden(clause);
        self
    }

    pub fn build(self) -> Result<ConfigurationSpace, SpaceError> {
        self.builder.build()
    }
}

/// The imputation → Nystroem → {decision tree, liblinear SVC} pipeline.
pub fn default_pipeline_space() -> Result<ConfigurationSpace, SpaceError> {
    PipelineSpaceBuilder::new()
        .add_step("imputation", &[&ImputationNode])?
        .add_step("feature_preprocessor", &[&NystroemSamplerNode::default()])?
        .add_step("classifier", &[&DecisionTreeNode, &LibLinearSvcNode])?
        .build()
}
