use std::fmt;

use thiserror::Error;

/// Which of the two validator inputs an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    Schema,
    Document,
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema => f.write_str("schema"),
            Self::Document => f.write_str("document"),
        }
    }
}

/// Failures that prevent a validation outcome from being computed at all.
///
/// A document that merely violates its schema is not an error; it yields an
/// invalid [`ValidationOutcome`](crate::ValidationOutcome).
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The schema is not parseable YAML.
    #[error("parsing the YAML schema failed: {0}")]
    SchemaParseFailed(#[source] serde_yaml::Error),

    /// The document is not parseable YAML.
    #[error("parsing the YAML document failed: {0}")]
    DocumentParseFailed(#[source] serde_yaml::Error),

    /// YAML that has no JSON equivalent (non-string keys, tags, NaN).
    #[error("{input} is not JSON-compatible at {pointer:?}: {reason}")]
    NotJsonCompatible {
        input: Input,
        pointer: String,
        reason: String,
    },

    /// Valid JSON, but not a usable JSON Schema.
    #[error("invalid JSON Schema: {0}")]
    InvalidSchema(String),
}

/// Convenience alias for validator results.
pub type Result<T> = std::result::Result<T, ValidationError>;
