//! YAML encoding of Things.
//!
//! Every path out of this module guarantees an identifier: parsing assigns
//! one to identifier-less content, serializing assigns one before writing.
//! An identifier that is already present is never replaced.

use serde_yaml::Value;
use tracing::debug;

use crate::document::DOCUMENT_START;
use crate::error::{CodecError, Result};
use crate::thing::Thing;

/// Deserialize a Thing, assigning an identifier only if it has none.
///
/// A document that is empty or holds only comments parses to an empty Thing.
pub fn parse(bytes: &[u8]) -> Result<Thing> {
    let value: Value = serde_yaml::from_slice(bytes)?;
    let mut thing = match value {
        Value::Null => Thing::default(),
        value => serde_yaml::from_value(value)?,
    };
    if thing.ensure_id() {
        debug!(id = thing.identifier(), "assigned identifier to parsed thing");
    }
    Ok(thing)
}

/// Assert the identifier (minting one if empty) and serialize.
pub fn serialize(thing: &mut Thing) -> Result<Vec<u8>> {
    if thing.ensure_id() {
        debug!(id = thing.identifier(), "assigned identifier before serializing");
    }
    to_yaml(thing)
}

/// Serialize without touching the Thing. Fails if it has no identifier.
pub fn to_yaml(thing: &Thing) -> Result<Vec<u8>> {
    if !thing.has_identifier() {
        return Err(CodecError::MissingIdentifier);
    }
    Ok(serde_yaml::to_string(thing)?.into_bytes())
}

/// The bytes of a record file: a `---` line followed by the YAML body.
pub fn to_file_bytes(thing: &mut Thing) -> Result<Vec<u8>> {
    let body = serialize(thing)?;
    let mut out = Vec::with_capacity(DOCUMENT_START.len() + 1 + body.len());
    out.extend_from_slice(DOCUMENT_START.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(&body);
    Ok(out)
}
