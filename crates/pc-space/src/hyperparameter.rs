//! Hyperparameter dimensions and how they are sampled.

use pc_types::{HyperparameterKey, HyperparameterValue, SpaceError};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Describes how a hyperparameter is sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HyperparameterKind {
    /// Continuous range [low, high], optionally sampled in log-space.
    UniformFloat { low: f64, high: f64, log: bool },
    /// Integer range [low, high] inclusive, optionally sampled in log-space.
    UniformInt { low: i64, high: i64, log: bool },
    /// Categorical choices.
    Categorical { choices: Vec<String> },
    /// A single fixed value.
    Constant { value: HyperparameterValue },
}

/// A single dimension of a configuration space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameter {
    pub name: HyperparameterKey,
    pub kind: HyperparameterKind,
    pub default: HyperparameterValue,
}

impl Hyperparameter {
    pub fn uniform_float(name: &str, low: f64, high: f64, default: f64) -> Self {
        Self {
            name: HyperparameterKey::parse(name),
            kind: HyperparameterKind::UniformFloat { low, high, log: false },
            default: HyperparameterValue::Float(default),
        }
    }

    pub fn log_float(name: &str, low: f64, high: f64, default: f64) -> Self {
        Self {
            name: HyperparameterKey::parse(name),
            kind: HyperparameterKind::UniformFloat { low, high, log: true },
            default: HyperparameterValue::Float(default),
        }
    }

    pub fn uniform_int(name: &str, low: i64, high: i64, default: i64) -> Self {
        Self {
            name: HyperparameterKey::parse(name),
            kind: HyperparameterKind::UniformInt { low, high, log: false },
            default: HyperparameterValue::Int(default),
        }
    }

    pub fn log_int(name: &str, low: i64, high: i64, default: i64) -> Self {
        Self {
            name: HyperparameterKey::parse(name),
            kind: HyperparameterKind::UniformInt { low, high, log: true },
            default: HyperparameterValue::Int(default),
        }
    }

    pub fn categorical(name: &str, choices: &[&str], default: &str) -> Self {
        Self {
            name: HyperparameterKey::parse(name),
            kind: HyperparameterKind::Categorical {
                choices: choices.iter().map(|c| c.to_string()).collect(),
            },
            default: HyperparameterValue::Categorical(default.to_string()),
        }
    }

    pub fn constant(name: &str, value: impl Into<HyperparameterValue>) -> Self {
        let value = value.into();
        Self {
            name: HyperparameterKey::parse(name),
            kind: HyperparameterKind::Constant { value: value.clone() },
            default: value,
        }
    }

    /// Same dimension under a new name.
    pub fn renamed(&self, name: HyperparameterKey) -> Self {
        Self {
            name,
            kind: self.kind.clone(),
            default: self.default.clone(),
        }
    }

    /// Structural checks run when a space is built.
    pub fn check(&self) -> Result<(), SpaceError> {
        let name = self.name.to_string();
        match &self.kind {
            HyperparameterKind::UniformFloat { low, high, log } => {
                let bad_log = *log && *low <= 0.0;
                if !(low.is_finite() && high.is_finite() && low < high) || bad_log {
                    return Err(SpaceError::InvalidRange {
                        name,
                        low: low.to_string(),
                        high: high.to_string(),
                    });
                }
            }
            HyperparameterKind::UniformInt { low, high, log } => {
                if low > high || (*log && *low <= 0) {
                    return Err(SpaceError::InvalidRange {
                        name,
                        low: low.to_string(),
                        high: high.to_string(),
                    });
                }
            }
            HyperparameterKind::Categorical { choices } => {
                if choices.is_empty() {
                    return Err(SpaceError::EmptyChoices { name });
                }
            }
            HyperparameterKind::Constant { .. } => {}
        }

        if !self.is_legal(&self.default) {
            return Err(SpaceError::IllegalDefault { name });
        }
        Ok(())
    }

    pub fn is_legal(&self, value: &HyperparameterValue) -> bool {
        match (&self.kind, value) {
            (HyperparameterKind::UniformFloat { low, high, .. }, HyperparameterValue::Float(v)) => {
                *v >= *low && *v <= *high
            }
            (HyperparameterKind::UniformInt { low, high, .. }, HyperparameterValue::Int(v)) => {
                *v >= *low && *v <= *high
            }
            (HyperparameterKind::Categorical { choices }, HyperparameterValue::Categorical(v)) => {
                choices.iter().any(|c| c == v)
            }
            (HyperparameterKind::Constant { value: fixed }, v) => fixed == v,
            _ => false,
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> HyperparameterValue {
        match &self.kind {
            HyperparameterKind::UniformFloat { low, high, log: false } => {
                HyperparameterValue::Float(rng.random_range(*low..=*high))
            }
            HyperparameterKind::UniformFloat { low, high, log: true } => {
                let log_val: f64 = rng.random_range(low.ln()..=high.ln());
                HyperparameterValue::Float(log_val.exp().clamp(*low, *high))
            }
            HyperparameterKind::UniformInt { low, high, log: false } => {
                HyperparameterValue::Int(rng.random_range(*low..=*high))
            }
            HyperparameterKind::UniformInt { low, high, log: true } => {
                let log_val: f64 = rng.random_range((*low as f64).ln()..=(*high as f64).ln());
                HyperparameterValue::Int((log_val.exp().round() as i64).clamp(*low, *high))
            }
            HyperparameterKind::Categorical { choices } => {
                let idx = rng.random_range(0..choices.len());
                HyperparameterValue::Categorical(choices[idx].clone())
            }
            HyperparameterKind::Constant { value } => value.clone(),
        }
    }

    /// Numeric encoding used for model input: ranges map to [0, 1] (in
    /// log-space where applicable), categoricals to their choice index.
    pub fn encode(&self, value: &HyperparameterValue) -> f64 {
        match (&self.kind, value) {
            (HyperparameterKind::UniformFloat { low, high, log }, HyperparameterValue::Float(v)) => {
                normalize(*v, *low, *high, *log)
            }
            (HyperparameterKind::UniformInt { low, high, log }, HyperparameterValue::Int(v)) => {
                if low == high {
                    0.0
                } else {
                    normalize(*v as f64, *low as f64, *high as f64, *log)
                }
            }
            (HyperparameterKind::Categorical { choices }, HyperparameterValue::Categorical(v)) => choices
                .iter()
                .position(|c| c == v)
                .map(|i| i as f64)
                .unwrap_or(f64::NAN),
            (HyperparameterKind::Constant { .. }, _) => 0.0,
            _ => f64::NAN,
        }
    }
}

fn normalize(v: f64, low: f64, high: f64, log: bool) -> f64 {
    if log {
        (v.ln() - low.ln()) / (high.ln() - low.ln())
    } else {
        (v - low) / (high - low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn log_float_stays_in_bounds() {
        let hp = Hyperparameter::log_float("svc:C", 0.03125, 32768.0, 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let value = hp.sample(&mut rng);
            assert!(hp.is_legal(&value), "C out of bounds: {value}");
        }
    }

    #[test]
    fn log_int_stays_in_bounds() {
        let hp = Hyperparameter::log_int("n_components", 50, 10000, 100);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            match hp.sample(&mut rng) {
                HyperparameterValue::Int(v) => assert!((50..=10000).contains(&v)),
                other => panic!("unexpected n_components value: {other:?}"),
            }
        }
    }

    #[test]
    fn categorical_samples_known_choices() {
        let hp = Hyperparameter::categorical("strategy", &["mean", "median", "most_frequent"], "mean");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..30 {
            let value = hp.sample(&mut rng);
            let s = value.as_str().unwrap();
            assert!(["mean", "median", "most_frequent"].contains(&s));
        }
    }

    #[test]
    fn check_rejects_bad_declarations() {
        assert!(matches!(
            Hyperparameter::uniform_float("x", 1.0, 0.0, 0.5).check(),
            Err(SpaceError::InvalidRange { .. })
        ));
        assert!(matches!(
            Hyperparameter::log_float("x", 0.0, 1.0, 0.5).check(),
            Err(SpaceError::InvalidRange { .. })
        ));
        assert!(matches!(
            Hyperparameter::categorical("x", &[], "a").check(),
            Err(SpaceError::EmptyChoices { .. })
        ));
        assert!(matches!(
            Hyperparameter::uniform_int("x", 1, 5, 9).check(),
            Err(SpaceError::IllegalDefault { .. })
        ));
        assert!(Hyperparameter::constant("dual", "False").check().is_ok());
    }

    #[test]
    fn encoding_is_normalized() {
        let hp = Hyperparameter::uniform_float("max_depth", 0.0, 2.0, 0.5);
        assert_eq!(hp.encode(&HyperparameterValue::Float(1.0)), 0.5);

        let hp = Hyperparameter::log_float("gamma", 0.01, 100.0, 1.0);
        assert!((hp.encode(&HyperparameterValue::Float(1.0)) - 0.5).abs() < 1e-12);

        let hp = Hyperparameter::categorical("kernel", &["poly", "rbf"], "rbf");
        assert_eq!(hp.encode(&"rbf".into()), 1.0);
        assert!(hp.encode(&HyperparameterValue::Int(1)).is_nan());
    }
}
