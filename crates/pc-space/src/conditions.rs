//! Activation conditions between hyperparameters.

use pc_types::{HyperparameterKey, HyperparameterValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A child hyperparameter is active only while its parent holds one of the
/// listed values. A child with several conditions needs all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Equals {
        child: HyperparameterKey,
        parent: HyperparameterKey,
        value: HyperparameterValue,
    },
    In {
        child: HyperparameterKey,
        parent: HyperparameterKey,
        values: Vec<HyperparameterValue>,
    },
}

impl Condition {
    pub fn equals(child: &str, parent: &str, value: impl Into<HyperparameterValue>) -> Self {
        Self::Equals {
            child: HyperparameterKey::parse(child),
            parent: HyperparameterKey::parse(parent),
            value: value.into(),
        }
    }

    pub fn one_of(child: &str, parent: &str, values: &[&str]) -> Self {
        Self::In {
            child: HyperparameterKey::parse(child),
            parent: HyperparameterKey::parse(parent),
            values: values.iter().map(|v| HyperparameterValue::from(*v)).collect(),
        }
    }

    pub fn child(&self) -> &HyperparameterKey {
        match self {
            Self::Equals { child, .. } | Self::In { child, .. } => child,
        }
    }

    pub fn parent(&self) -> &HyperparameterKey {
        match self {
            Self::Equals { parent, .. } | Self::In { parent, .. } => parent,
        }
    }

    /// An absent parent never satisfies a condition.
    pub fn is_satisfied(&self, parent_value: Option<&HyperparameterValue>) -> bool {
        let Some(actual) = parent_value else {
            return false;
        };
        match self {
            Self::Equals { value, .. } => actual == value,
            Self::In { values, .. } => values.contains(actual),
        }
    }

    /// Same condition with both names moved under `prefix`.
    pub fn prefixed(&self, prefix: &str) -> Self {
        match self {
            Self::Equals { child, parent, value } => Self::Equals {
                child: prefix_key(prefix, child),
                parent: prefix_key(prefix, parent),
                value: value.clone(),
            },
            Self::In { child, parent, values } => Self::In {
                child: prefix_key(prefix, child),
                parent: prefix_key(prefix, parent),
                values: values.clone(),
            },
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { child, parent, value } => write!(f, "{child} | {parent} == {value}"),
            Self::In { child, parent, values } => {
                let listed: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{child} | {parent} in {{{}}}", listed.join(", "))
            }
        }
    }
}

pub(crate) fn prefix_key(prefix: &str, key: &HyperparameterKey) -> HyperparameterKey {
    HyperparameterKey::parse(&format!("{prefix}:{key}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_condition_matches_listed_values() {
        let cond = Condition::one_of("coef0", "kernel", &["poly", "sigmoid"]);
        assert!(cond.is_satisfied(Some(&"poly".into())));
        assert!(!cond.is_satisfied(Some(&"rbf".into())));
        assert!(!cond.is_satisfied(None));
    }

    #[test]
    fn prefixing_moves_both_names() {
        let cond = Condition::equals("degree", "kernel", "poly").prefixed("feature_preprocessor:nystroem_sampler");
        assert_eq!(cond.child().step(), "feature_preprocessor");
        assert_eq!(cond.child().field(), "nystroem_sampler:degree");
        assert_eq!(cond.parent().to_string(), "feature_preprocessor:nystroem_sampler:kernel");
        assert_eq!(
            cond.to_string(),
            "feature_preprocessor:nystroem_sampler:degree | feature_preprocessor:nystroem_sampler:kernel == poly"
        );
    }
}
