//! Error types for locator parsing and resolution.

use thiserror::Error;

/// Syntactic failures while parsing a locator string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A `%` was not followed by two hexadecimal digits.
    #[error("invalid percent-encoding at byte {offset}")]
    InvalidPercentEncoding { offset: usize },

    /// Percent-escapes decoded to bytes that are not valid UTF-8.
    #[error("percent-escapes do not decode to UTF-8")]
    InvalidUtf8,

    /// ASCII control characters are never part of a locator.
    #[error("control character at byte {offset}")]
    ControlCharacter { offset: usize },

    /// A scheme-less reference whose first segment contains `:`.
    #[error("first path segment must not contain a colon")]
    ColonInFirstSegment,

    /// The generic URL grammar rejected the input.
    #[error("invalid URI: {0}")]
    Syntax(#[from] url::ParseError),
}

/// A locator that is syntactically valid but fails containment or scheme
/// policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    /// One of the two locators could not be parsed.
    #[error("malformed locator {locator:?}: {source}")]
    Malformed {
        locator: String,
        #[source]
        source: ParseError,
    },

    /// The thing locator carries no path.
    #[error("thing locator {locator:?} has an empty path")]
    EmptyPath { locator: String },

    /// The context path does not start with a path separator.
    #[error("context path {path:?} must be absolute")]
    ContextNotAbsolute { path: String },

    /// The thing would resolve outside the mandatory context.
    #[error("{locator:?} lies outside the context {context:?}: {reason}")]
    OutsideContext {
        locator: String,
        context: String,
        reason: String,
    },

    /// The final scheme is not in the scheme table.
    #[error("unsupported scheme {scheme:?}")]
    UnsupportedScheme { scheme: String },

    /// The location resolved, but it is not a local filesystem path.
    #[error("{location} is not local, scheme must be 'file'")]
    NotLocal { location: String },
}

impl ResolutionError {
    pub(crate) fn outside(
        locator: impl Into<String>,
        context: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::OutsideContext {
            locator: locator.into(),
            context: context.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for parse results.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Convenience alias for resolution results.
pub type Result<T> = std::result::Result<T, ResolutionError>;
