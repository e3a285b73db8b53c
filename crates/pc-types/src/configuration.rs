use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Structured hyperparameter name.
///
/// Pipeline hyperparameters are named `"<step>:<field>"`, e.g.
/// `"classifier:decision_tree:max_depth"` has step `classifier` and field
/// `decision_tree:max_depth`. A name without `:` is a step with an empty field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct HyperparameterKey {
    step: String,
    field: String,
}

impl HyperparameterKey {
    pub fn new(step: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            field: field.into(),
        }
    }

    /// Split a flat name at its first `:`.
    pub fn parse(name: &str) -> Self {
        match name.split_once(':') {
            Some((step, field)) => Self::new(step, field),
            None => Self::new(name, ""),
        }
    }

    pub fn step(&self) -> &str {
        &self.step
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl fmt::Display for HyperparameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.step)
        } else {
            write!(f, "{}:{}", self.step, self.field)
        }
    }
}

impl From<String> for HyperparameterKey {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<&str> for HyperparameterKey {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<HyperparameterKey> for String {
    fn from(key: HyperparameterKey) -> Self {
        key.to_string()
    }
}

/// A concrete hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HyperparameterValue {
    Int(i64),
    Float(f64),
    Categorical(String),
}

impl HyperparameterValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Categorical(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Categorical(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for HyperparameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Categorical(v) => write!(f, "{v}"),
        }
    }
}

impl From<f64> for HyperparameterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for HyperparameterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for HyperparameterValue {
    fn from(v: &str) -> Self {
        Self::Categorical(v.to_string())
    }
}

impl From<String> for HyperparameterValue {
    fn from(v: String) -> Self {
        Self::Categorical(v)
    }
}

/// Where a configuration came from. Diagnostics only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Origin {
    #[default]
    Unspecified,
    RandomSearch,
    RandomSearchSorted,
    RandomSearchBatch,
    RandomSearchMarginalizedSorted,
    LocalSearch,
    LocalSearchMarginalized,
    /// A batch variant that could not be recombined and is a plain copy of
    /// its anchor.
    AnchorFallback,
}

impl Origin {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unspecified => "Unspecified",
            Self::RandomSearch => "Random Search",
            Self::RandomSearchSorted => "Random Search (Sorted)",
            Self::RandomSearchBatch => "Random Search (Batch)",
            Self::RandomSearchMarginalizedSorted => "Random Search marginalization (Sorted)",
            Self::LocalSearch => "Local Search",
            Self::LocalSearchMarginalized => "Local Search marginalized",
            Self::AnchorFallback => "Anchor Fallback",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Value assignment for the active hyperparameters of a pipeline.
///
/// Equality only looks at the values; the origin tag never takes part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    values: BTreeMap<HyperparameterKey, HyperparameterValue>,
    #[serde(default)]
    origin: Origin,
}

impl Configuration {
    /// Unchecked constructor. Use `ConfigurationSpace::configuration` to get a
    /// validated one.
    pub fn new(values: BTreeMap<HyperparameterKey, HyperparameterValue>) -> Self {
        Self {
            values,
            origin: Origin::Unspecified,
        }
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Origin) {
        self.origin = origin;
    }

    pub fn get(&self, key: &HyperparameterKey) -> Option<&HyperparameterValue> {
        self.values.get(key)
    }

    /// Look up by flat `"step:field"` name.
    pub fn get_by_name(&self, name: &str) -> Option<&HyperparameterValue> {
        self.values.get(&HyperparameterKey::parse(name))
    }

    pub fn values(&self) -> &BTreeMap<HyperparameterKey, HyperparameterValue> {
        &self.values
    }

    pub fn into_values(self) -> BTreeMap<HyperparameterKey, HyperparameterValue> {
        self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HyperparameterKey, &HyperparameterValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration(")?;
        for (i, (key, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        write!(f, ")")
    }
}

/// A configuration paired with its acquisition value.
///
/// Values are only comparable within the scoring call that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredConfiguration {
    pub acquisition_value: f64,
    pub configuration: Configuration,
}

impl ScoredConfiguration {
    pub fn new(acquisition_value: f64, configuration: Configuration) -> Self {
        Self {
            acquisition_value,
            configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, HyperparameterValue)]) -> Configuration {
        Configuration::new(
            pairs
                .iter()
                .map(|(name, value)| (HyperparameterKey::parse(name), value.clone()))
                .collect(),
        )
    }

    #[test]
    fn key_parses_step_and_field() {
        let key = HyperparameterKey::parse("classifier:decision_tree:max_depth");
        assert_eq!(key.step(), "classifier");
        assert_eq!(key.field(), "decision_tree:max_depth");
        assert_eq!(key.to_string(), "classifier:decision_tree:max_depth");

        let bare = HyperparameterKey::parse("seed");
        assert_eq!(bare.step(), "seed");
        assert_eq!(bare.field(), "");
        assert_eq!(bare.to_string(), "seed");
    }

    #[test]
    fn equality_ignores_origin() {
        let a = config(&[("imputation:strategy", "mean".into())]).with_origin(Origin::LocalSearch);
        let b = config(&[("imputation:strategy", "mean".into())]).with_origin(Origin::RandomSearch);
        assert_eq!(a, b);

        let c = config(&[("imputation:strategy", "median".into())]);
        assert_ne!(a, c);
    }

    #[test]
    fn configuration_serializes_with_flat_names() {
        let c = config(&[
            ("classifier:svc:C", HyperparameterValue::Float(1.5)),
            ("classifier:__choice__", "svc".into()),
        ])
        .with_origin(Origin::RandomSearchBatch);

        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["values"]["classifier:svc:C"], serde_json::json!(1.5));
        assert_eq!(json["origin"], serde_json::json!("RandomSearchBatch"));

        let back: Configuration = serde_json::from_value(json).unwrap();
        assert_eq!(back, c);
        assert_eq!(back.origin(), Origin::RandomSearchBatch);
    }

    #[test]
    fn untagged_value_keeps_integer_kind() {
        let v: HyperparameterValue = serde_json::from_str("3").unwrap();
        assert_eq!(v, HyperparameterValue::Int(3));
        let v: HyperparameterValue = serde_json::from_str("0.25").unwrap();
        assert_eq!(v, HyperparameterValue::Float(0.25));
    }

    #[test]
    fn origin_labels() {
        assert_eq!(Origin::RandomSearchSorted.to_string(), "Random Search (Sorted)");
        assert_eq!(Origin::LocalSearchMarginalized.label(), "Local Search marginalized");
    }
}
