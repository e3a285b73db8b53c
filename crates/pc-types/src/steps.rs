use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::configuration::HyperparameterKey;
use crate::errors::SpaceError;

/// How a pipeline step takes part in recombination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepRole {
    /// Values are copied from the anchor.
    Constant,
    /// Values are copied from the freshly sampled donor.
    Variable,
    /// Values are dropped.
    Unassigned,
}

/// Two disjoint sets of step names fixed for the lifetime of a selector.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "StepSetFields")]
pub struct PipelineStepSet {
    constant_steps: BTreeSet<String>,
    variable_steps: BTreeSet<String>,
}

#[derive(Deserialize)]
struct StepSetFields {
    constant_steps: BTreeSet<String>,
    variable_steps: BTreeSet<String>,
}

impl TryFrom<StepSetFields> for PipelineStepSet {
    type Error = SpaceError;

    fn try_from(fields: StepSetFields) -> Result<Self, Self::Error> {
        Self::new(fields.constant_steps, fields.variable_steps)
    }
}

impl PipelineStepSet {
    pub fn new<C, V>(constant_steps: C, variable_steps: V) -> Result<Self, SpaceError>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let constant_steps: BTreeSet<String> = constant_steps.into_iter().map(Into::into).collect();
        let variable_steps: BTreeSet<String> = variable_steps.into_iter().map(Into::into).collect();

        if let Some(step) = constant_steps.intersection(&variable_steps).next() {
            return Err(SpaceError::OverlappingSteps { step: step.clone() });
        }

        Ok(Self {
            constant_steps,
            variable_steps,
        })
    }

    pub fn constant_steps(&self) -> &BTreeSet<String> {
        &self.constant_steps
    }

    pub fn variable_steps(&self) -> &BTreeSet<String> {
        &self.variable_steps
    }

    pub fn role_of_step(&self, step: &str) -> StepRole {
        if self.constant_steps.contains(step) {
            StepRole::Constant
        } else if self.variable_steps.contains(step) {
            StepRole::Variable
        } else {
            StepRole::Unassigned
        }
    }

    pub fn role_of(&self, key: &HyperparameterKey) -> StepRole {
        self.role_of_step(key.step())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlapping_steps() {
        let err = PipelineStepSet::new(["imputation", "classifier"], ["classifier"]).unwrap_err();
        assert_eq!(
            err,
            SpaceError::OverlappingSteps {
                step: "classifier".to_string()
            }
        );
    }

    #[test]
    fn deserializing_checks_overlap() {
        let steps: PipelineStepSet =
            serde_json::from_str(r#"{"constant_steps": ["imputation"], "variable_steps": ["classifier"]}"#).unwrap();
        assert_eq!(steps.role_of_step("classifier"), StepRole::Variable);

        let overlapping = serde_json::from_str::<PipelineStepSet>(
            r#"{"constant_steps": ["classifier"], "variable_steps": ["classifier"]}"#,
        );
        let err = overlapping.unwrap_err();
        assert!(err.to_string().contains("both constant and variable"));
    }

    #[test]
    fn roles_follow_step_prefix() {
        let steps = PipelineStepSet::new(["imputation", "feature_preprocessor"], ["classifier"]).unwrap();
        assert_eq!(
            steps.role_of(&HyperparameterKey::parse("feature_preprocessor:nystroem_sampler:gamma")),
            StepRole::Constant
        );
        assert_eq!(
            steps.role_of(&HyperparameterKey::parse("classifier:__choice__")),
            StepRole::Variable
        );
        assert_eq!(steps.role_of_step("rescaling"), StepRole::Unassigned);
    }
}
