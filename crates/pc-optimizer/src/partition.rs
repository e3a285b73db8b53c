//! Constant/variable split of pipeline configurations and recombination.

use std::collections::BTreeMap;

use pc_space::ConfigurationSpace;
use pc_types::{
    Configuration, HyperparameterKey, HyperparameterValue, PipelineStepSet, StepRole, ValidationError,
};
use serde::{Deserialize, Serialize};

type Values = BTreeMap<HyperparameterKey, HyperparameterValue>;

/// The two halves of a configuration. Fields of unassigned steps are in
/// neither.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub constant: Values,
    pub variable: Values,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStepPartitioner {
    steps: PipelineStepSet,
}

impl PipelineStepPartitioner {
    pub fn new(steps: PipelineStepSet) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &PipelineStepSet {
        &self.steps
    }

    pub fn split(&self, config: &Configuration) -> Partition {
        let mut partition = Partition::default();
        for (key, value) in config.iter() {
            match self.steps.role_of(key) {
                StepRole::Constant => {
                    partition.constant.insert(key.clone(), value.clone());
                }
                StepRole::Variable => {
                    partition.variable.insert(key.clone(), value.clone());
                }
                StepRole::Unassigned => {}
            }
        }
        partition
    }

    /// Constant-step values of `anchor` joined with variable-step values of
    /// `donor`, validated against `space`.
    pub fn combine(
        &self,
        space: &ConfigurationSpace,
        anchor: &Configuration,
        donor: &Configuration,
    ) -> Result<Configuration, ValidationError> {
        let mut values = self.split(anchor).constant;
        values.extend(self.split(donor).variable);
        space.configuration(values)
    }
}
