//! The Thing record model and its YAML codec.
//!
//! # Modules
//!
//! - [`thing`] -- [`Thing`] and its parts
//! - [`codec`] -- YAML parse/serialize with identifier assignment
//! - [`document`] -- extraction of the single document in a record file
//! - [`error`] -- [`CodecError`] and [`DocumentError`]

pub mod codec;
pub mod document;
pub mod error;
pub mod thing;

pub use codec::{parse, serialize, to_file_bytes, to_yaml};
pub use document::{extract_document, DOCUMENT_START};
pub use error::{CodecError, DocumentError, Result};
pub use thing::{
    Attribution, SchemaRef, Thing, ThingId, ThingLegal, ThingRelation, ThingTarget,
    URN_UUID_PREFIX,
};
