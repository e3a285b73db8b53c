//! # pc-space
//!
//! Conditional configuration spaces for pipeline search.
//!
//! Provides hyperparameter dimensions, activation conditions, forbidden
//! clauses, a validating builder, rejection sampling, numeric encoding for
//! surrogate models, and the search spaces of the pipeline nodes.

mod conditions;
mod forbidden;
mod hyperparameter;
pub mod nodes;
mod space;

pub use conditions::Condition;
pub use forbidden::ForbiddenClause;
pub use hyperparameter::{Hyperparameter, HyperparameterKind};
pub use nodes::{
    default_pipeline_space, DecisionTreeNode, ImputationNode, LibLinearSvcNode, NodeSpace,
    NystroemSamplerNode, PipelineNode, PipelineSpaceBuilder,
};
pub use space::{ConfigurationSpace, ConfigurationSpaceBuilder, MAX_SAMPLING_ATTEMPTS};
