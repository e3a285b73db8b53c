use thiserror::Error;

/// Main error type for challenger selection
#[derive(Error, Debug)]
pub enum PcError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Search space error: {0}")]
    Space(#[from] SpaceError),

    #[error("Model error: {message}")]
    Model { message: String },

    #[error("Acquisition error: {message}")]
    Acquisition { message: String },

    #[error("Local search error: {message}")]
    LocalSearch { message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A value assignment that is not a member of the configuration space.
///
/// These are recoverable: recombination retries on them, sampling rejects
/// and redraws.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Unknown hyperparameter: {name}")]
    UnknownHyperparameter { name: String },

    #[error("Hyperparameter {name} has a value but its conditions are not met")]
    InactiveValue { name: String },

    #[error("Active hyperparameter {name} has no value")]
    MissingValue { name: String },

    #[error("Illegal value {value} for hyperparameter {name}")]
    IllegalValue { name: String, value: String },

    #[error("Forbidden clause violated: {clause}")]
    Forbidden { clause: String },

    #[error("No valid configuration found after {attempts} sampling attempts")]
    SamplingExhausted { attempts: usize },
}

/// Structural errors raised while declaring a configuration space.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpaceError {
    #[error("Hyperparameter declared twice: {name}")]
    DuplicateHyperparameter { name: String },

    #[error("Unknown hyperparameter referenced: {name}")]
    UnknownHyperparameter { name: String },

    #[error("Condition parent {parent} must be declared before child {child}")]
    ParentDeclaredAfterChild { child: String, parent: String },

    #[error("Invalid range for {name}: [{low}, {high}]")]
    InvalidRange { name: String, low: String, high: String },

    #[error("Categorical hyperparameter {name} has no choices")]
    EmptyChoices { name: String },

    #[error("Default value is not legal for hyperparameter {name}")]
    IllegalDefault { name: String },

    #[error("Pipeline step {step} is both constant and variable")]
    OverlappingSteps { step: String },
}

/// Result type alias for challenger selection operations
pub type PcResult<T> = Result<T, PcError>;

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::PcError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::PcError::Config(format!($($arg)*))
    };
}
