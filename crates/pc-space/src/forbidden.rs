//! Forbidden value combinations.

use pc_types::{HyperparameterKey, HyperparameterValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::conditions::prefix_key;

/// A clause that rules out value assignments. Clauses on hyperparameters
/// without a value (inactive) never fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ForbiddenClause {
    Equals {
        name: HyperparameterKey,
        value: HyperparameterValue,
    },
    In {
        name: HyperparameterKey,
        values: Vec<HyperparameterValue>,
    },
    /// Fires when every inner clause fires.
    And(Vec<ForbiddenClause>),
}

impl ForbiddenClause {
    pub fn equals(name: &str, value: impl Into<HyperparameterValue>) -> Self {
        Self::Equals {
            name: HyperparameterKey::parse(name),
            value: value.into(),
        }
    }

    pub fn one_of(name: &str, values: &[&str]) -> Self {
        Self::In {
            name: HyperparameterKey::parse(name),
            values: values.iter().map(|v| HyperparameterValue::from(*v)).collect(),
        }
    }

    pub fn and(clauses: Vec<ForbiddenClause>) -> Self {
        Self::And(clauses)
    }

    pub fn is_forbidden(&self, values: &BTreeMap<HyperparameterKey, HyperparameterValue>) -> bool {
        match self {
            Self::Equals { name, value } => values.get(name) == Some(value),
            Self::In { name, values: listed } => values.get(name).is_some_and(|v| listed.contains(v)),
            Self::And(clauses) => !clauses.is_empty() && clauses.iter().all(|c| c.is_forbidden(values)),
        }
    }

    /// Every hyperparameter this clause reads.
    pub fn names(&self) -> Vec<&HyperparameterKey> {
        match self {
            Self::Equals { name, .. } | Self::In { name, .. } => vec![name],
            Self::And(clauses) => clauses.iter().flat_map(|c| c.names()).collect(),
        }
    }

    pub fn prefixed(&self, prefix: &str) -> Self {
        match self {
            Self::Equals { name, value } => Self::Equals {
                name: prefix_key(prefix, name),
                value: value.clone(),
            },
            Self::In { name, values } => Self::In {
                name: prefix_key(prefix, name),
                values: values.clone(),
            },
            Self::And(clauses) => Self::And(clauses.iter().map(|c| c.prefixed(prefix)).collect()),
        }
    }
}

impl fmt::Display for ForbiddenClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { name, value } => write!(f, "{name} == {value}"),
            Self::In { name, values } => {
                let listed: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{name} in {{{}}}", listed.join(", "))
            }
            Self::And(clauses) => {
                let parts: Vec<String> = clauses.iter().map(|c| format!("({c})")).collect();
                write!(f, "{}", parts.join(" && "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<HyperparameterKey, HyperparameterValue> {
        pairs
            .iter()
            .map(|(k, v)| (HyperparameterKey::parse(k), HyperparameterValue::from(*v)))
            .collect()
    }

    #[test]
    fn conjunction_needs_every_clause() {
        let clause = ForbiddenClause::and(vec![
            ForbiddenClause::equals("penalty", "l1"),
            ForbiddenClause::equals("loss", "hinge"),
        ]);
        assert!(clause.is_forbidden(&values(&[("penalty", "l1"), ("loss", "hinge")])));
        assert!(!clause.is_forbidden(&values(&[("penalty", "l1"), ("loss", "squared_hinge")])));
        assert_eq!(clause.to_string(), "(penalty == l1) && (loss == hinge)");
    }

    #[test]
    fn inactive_hyperparameters_never_fire() {
        let clause = ForbiddenClause::one_of("kernel", &["chi2"]);
        assert!(!clause.is_forbidden(&values(&[("penalty", "l2")])));
        assert!(clause.is_forbidden(&values(&[("kernel", "chi2")])));
        assert!(!ForbiddenClause::and(Vec::new()).is_forbidden(&values(&[])));
    }

    #[test]
    fn prefixed_clause_reads_prefixed_names() {
        let clause = ForbiddenClause::equals("penalty", "l1").prefixed("classifier:liblinear_svc");
        let names = clause.names();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].to_string(), "classifier:liblinear_svc:penalty");
    }
}
