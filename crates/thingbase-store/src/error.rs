use std::io;
use std::path::PathBuf;

use thingbase_locator::ResolutionError;
use thingbase_record::{CodecError, DocumentError};
use thingbase_schema::ValidationError;

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The locator failed parsing, containment or scheme policy.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The file holds zero documents, or more than one.
    #[error("no sensible YAML document in {location}: {source}")]
    NoSensibleDocument {
        location: String,
        #[source]
        source: DocumentError,
    },

    /// A create-style write found something already at the path.
    #[error("{} already exists", path.display())]
    AlreadyExists { path: PathBuf },

    /// The operation needs a local file, but the location is remote.
    #[error("{location} is not local, scheme must be 'file'")]
    NotLocal { location: String },

    /// A parent of the target exists and is not a directory.
    #[error("{} exists and is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    /// The locator names a directory, or the context itself, not a file.
    #[error("{} does not name a file under the context", path.display())]
    NotAFile { path: PathBuf },

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The configured remote source failed to fetch a read-only location.
    #[error("fetching {location} failed: {source}")]
    Remote {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
