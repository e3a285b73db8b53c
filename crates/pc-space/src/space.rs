//! Configuration space: an ordered list of hyperparameters with activation
//! conditions and forbidden clauses.

use pc_types::{
    Configuration, HyperparameterKey, HyperparameterValue, PcResult, SpaceError, ValidationError,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::conditions::Condition;
use crate::forbidden::ForbiddenClause;
use crate::hyperparameter::Hyperparameter;

/// Rejection-sampling cap for a single draw.
pub const MAX_SAMPLING_ATTEMPTS: usize = 1000;

/// The full configuration space.
///
/// Hyperparameters are kept in declaration order; a condition's parent is
/// always declared before its child, so one forward pass decides activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationSpace {
    hyperparameters: Vec<Hyperparameter>,
    conditions: Vec<Condition>,
    forbidden: Vec<ForbiddenClause>,
}

impl ConfigurationSpace {
    pub fn builder() -> ConfigurationSpaceBuilder {
        ConfigurationSpaceBuilder::new()
    }

    /// Deserialize and re-run the structural checks.
    pub fn from_json(json: &str) -> PcResult<Self> {
        let space: Self = serde_json::from_str(json)?;
        space.check()?;
        Ok(space)
    }

    pub fn hyperparameters(&self) -> &[Hyperparameter] {
        &self.hyperparameters
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn forbidden_clauses(&self) -> &[ForbiddenClause] {
        &self.forbidden
    }

    pub fn get(&self, name: &HyperparameterKey) -> Option<&Hyperparameter> {
        self.hyperparameters.iter().find(|hp| &hp.name == name)
    }

    pub fn len(&self) -> usize {
        self.hyperparameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hyperparameters.is_empty()
    }

    /// Whether `name` is active given the values assigned so far.
    pub fn is_active(
        &self,
        name: &HyperparameterKey,
        values: &BTreeMap<HyperparameterKey, HyperparameterValue>,
    ) -> bool {
        self.conditions
            .iter()
            .filter(|c| c.child() == name)
            .all(|c| c.is_satisfied(values.get(c.parent())))
    }

    fn first_forbidden(
        &self,
        values: &BTreeMap<HyperparameterKey, HyperparameterValue>,
    ) -> Option<&ForbiddenClause> {
        self.forbidden.iter().find(|clause| clause.is_forbidden(values))
    }

    /// Draw one valid configuration by rejection sampling.
    pub fn sample_one<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Configuration, ValidationError> {
        for _ in 0..MAX_SAMPLING_ATTEMPTS {
            let mut values = BTreeMap::new();
            for hp in &self.hyperparameters {
                if self.is_active(&hp.name, &values) {
                    values.insert(hp.name.clone(), hp.sample(rng));
                }
            }
            if self.first_forbidden(&values).is_none() {
                return Ok(Configuration::new(values));
            }
        }
        Err(ValidationError::SamplingExhausted {
            attempts: MAX_SAMPLING_ATTEMPTS,
        })
    }

    /// Draw `n` independent valid configurations.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<Configuration>, ValidationError> {
        (0..n).map(|_| self.sample_one(&mut *rng)).collect()
    }

    /// Check a value assignment against activity, legality and forbidden
    /// clauses.
    pub fn validate(
        &self,
        values: &BTreeMap<HyperparameterKey, HyperparameterValue>,
    ) -> Result<(), ValidationError> {
        for name in values.keys() {
            if self.get(name).is_none() {
                return Err(ValidationError::UnknownHyperparameter {
                    name: name.to_string(),
                });
            }
        }

        for hp in &self.hyperparameters {
            let active = self.is_active(&hp.name, values);
            match (active, values.get(&hp.name)) {
                (true, None) => {
                    return Err(ValidationError::MissingValue {
                        name: hp.name.to_string(),
                    })
                }
                (false, Some(_)) => {
                    return Err(ValidationError::InactiveValue {
                        name: hp.name.to_string(),
                    })
                }
                (true, Some(value)) if !hp.is_legal(value) => {
                    return Err(ValidationError::IllegalValue {
                        name: hp.name.to_string(),
                        value: value.to_string(),
                    })
                }
                _ => {}
            }
        }

        if let Some(clause) = self.first_forbidden(values) {
            return Err(ValidationError::Forbidden {
                clause: clause.to_string(),
            });
        }
        Ok(())
    }

    /// Validated constructor for configurations of this space.
    pub fn configuration(
        &self,
        values: BTreeMap<HyperparameterKey, HyperparameterValue>,
    ) -> Result<Configuration, ValidationError> {
        self.validate(&values)?;
        Ok(Configuration::new(values))
    }

    pub fn contains(&self, config: &Configuration) -> bool {
        self.validate(config.values()).is_ok()
    }

    /// Defaults of every hyperparameter that is active under the defaults.
    pub fn default_configuration(&self) -> Result<Configuration, ValidationError> {
        let mut values = BTreeMap::new();
        for hp in &self.hyperparameters {
            if self.is_active(&hp.name, &values) {
                values.insert(hp.name.clone(), hp.default.clone());
            }
        }
        self.configuration(values)
    }

    /// Numeric vector in declaration order; inactive hyperparameters are
    /// imputed with their default.
    pub fn to_vector(&self, config: &Configuration) -> Vec<f64> {
        self.hyperparameters
            .iter()
            .map(|hp| hp.encode(config.get(&hp.name).unwrap_or(&hp.default)))
            .collect()
    }

    fn check(&self) -> Result<(), SpaceError> {
        let mut seen = HashSet::new();
        for hp in &self.hyperparameters {
            if !seen.insert(&hp.name) {
                return Err(SpaceError::DuplicateHyperparameter {
                    name: hp.name.to_string(),
                });
            }
            hp.check()?;
        }

        let position = |name: &HyperparameterKey| self.hyperparameters.iter().position(|hp| &hp.name == name);
        for condition in &self.conditions {
            let child = position(condition.child()).ok_or_else(|| SpaceError::UnknownHyperparameter {
                name: condition.child().to_string(),
            })?;
            let parent = position(condition.parent()).ok_or_else(|| SpaceError::UnknownHyperparameter {
                name: condition.parent().to_string(),
            })?;
            if parent >= child {
                return Err(SpaceError::ParentDeclaredAfterChild {
                    child: condition.child().to_string(),
                    parent: condition.parent().to_string(),
                });
            }
        }

        for clause in &self.forbidden {
            for name in clause.names() {
                if position(name).is_none() {
                    return Err(SpaceError::UnknownHyperparameter {
                        name: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Chained builder; structural checks run in [`ConfigurationSpaceBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct ConfigurationSpaceBuilder {
    hyperparameters: Vec<Hyperparameter>,
    conditions: Vec<Condition>,
    forbidden: Vec<ForbiddenClause>,
}

impl ConfigurationSpaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hyperparameter(mut self, hp: Hyperparameter) -> Self {
        self.hyperparameters.push(hp);
        self
    }

    pub fn add_float(self, name: &str, low: f64, high: f64, default: f64) -> Self {
        self.add_hyperparameter(Hyperparameter::uniform_float(name, low, high, default))
    }

    pub fn add_log_float(self, name: &str, low: f64, high: f64, default: f64) -> Self {
        self.add_hyperparameter(Hyperparameter::log_float(name, low, high, default))
    }

    pub fn add_int(self, name: &str, low: i64, high: i64, default: i64) -> Self {
        self.add_hyperparameter(Hyperparameter::uniform_int(name, low, high, default))
    }

    pub fn add_categorical(self, name: &str, choices: &[&str], default: &str) -> Self {
        self.add_hyperparameter(Hyperparameter::categorical(name, choices, default))
    }

    pub fn add_constant(self, name: &str, value: impl Into<HyperparameterValue>) -> Self {
        self.add_hyperparameter(Hyperparameter::constant(name, value))
    }

    pub fn add_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn add_forbidden(mut self, clause: ForbiddenClause) -> Self {
        self.forbidden.push(clause);
        self
    }

    pub fn build(self) -> Result<ConfigurationSpace, SpaceError> {
        let space = ConfigurationSpace {
            hyperparameters: self.hyperparameters,
            conditions: self.conditions,
            forbidden: self.forbidden,
        };
        space.check()?;
        tracing::debug!(
            "Built configuration space with {} hyperparameters, {} conditions, {} forbidden clauses",
            space.hyperparameters.len(),
            space.conditions.len(),
            space.forbidden.len()
        );
        Ok(space)
    }
}
