//! Error types for the record codec and document extraction.

use thiserror::Error;

/// Failures turning bytes into a [`Thing`](crate::Thing) or back.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Malformed YAML, or YAML whose shape does not fit a Thing.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A Thing without an identifier was about to be written.
    #[error("thing has no identifier")]
    MissingIdentifier,
}

/// Failures locating the single YAML document inside a record file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// Nothing but blank lines, comments, directives or markers.
    #[error("no YAML document found")]
    Empty,

    /// A second `---` marker was found while reading the first document.
    #[error("a second YAML document starts at line {line}; only one document per file is supported")]
    MultipleDocuments { line: usize },
}

/// Convenience alias for codec results.
pub type Result<T> = std::result::Result<T, CodecError>;
