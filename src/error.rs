//! Error types for the delay pipeline.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, DelayError>;

/// Error type for feature building, fitting, persistence and configuration.
#[derive(Debug, Error)]
pub enum DelayError {
    /// Required input columns are absent. Names are sorted.
    #[error("Missing columns for preprocessing: {missing:?}")]
    Schema { missing: Vec<String> },

    /// A categorical value was never observed in the reference dataset.
    #[error("Invalid {field} value.")]
    InvalidCategoricalValue { field: String },

    /// Mismatched, empty or otherwise unusable arrays passed to the classifier.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Feature layout differs from the one the model was trained on.
    #[error("Feature mismatch: expected {expected:?}, got {got:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },

    /// A timestamp or numeric field could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DelayError {
    /// Builds a [`DelayError::Schema`] with the missing names sorted.
    pub fn schema<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut missing: Vec<String> = missing.into_iter().map(Into::into).collect();
        missing.sort();
        missing.dedup();
        DelayError::Schema { missing }
    }
}

impl From<bincode::Error> for DelayError {
    fn from(err: bincode::Error) -> Self {
        DelayError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for DelayError {
    fn from(err: serde_yaml::Error) -> Self {
        DelayError::Config(err.to_string())
    }
}

impl From<chrono::ParseError> for DelayError {
    fn from(err: chrono::ParseError) -> Self {
        DelayError::Parse(err.to_string())
    }
}
