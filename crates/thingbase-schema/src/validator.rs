use std::fmt;

use serde_json::Value;
use tracing::debug;

use crate::canonical::{yaml_to_json, CanonicalError};
use crate::error::{Input, Result, ValidationError};
use crate::outcome::{ValidationOutcome, Violation};

/// A compiled JSON Schema, reusable across many documents.
pub struct SchemaValidator {
    inner: jsonschema::Validator,
}

impl SchemaValidator {
    /// Compile a schema that is already canonical JSON.
    pub fn from_json(schema: &Value) -> Result<Self> {
        let inner = jsonschema::validator_for(schema)
            .map_err(|e| ValidationError::InvalidSchema(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Canonicalize a YAML schema and compile it.
    pub fn from_yaml(schema_bytes: &[u8]) -> Result<Self> {
        let schema = canonicalize(schema_bytes, Input::Schema)?;
        Self::from_json(&schema)
    }

    /// Check an already-canonical JSON document.
    pub fn validate_value(&self, document: &Value) -> ValidationOutcome {
        let violations: Vec<Violation> = self
            .inner
            .iter_errors(document)
            .map(|err| Violation {
                instance_path: err.instance_path.to_string(),
                message: err.to_string(),
            })
            .collect();
        debug!(violations = violations.len(), "document validated");
        ValidationOutcome::from_violations(violations)
    }

    /// Canonicalize a YAML document and check it.
    pub fn validate_yaml(&self, document_bytes: &[u8]) -> Result<ValidationOutcome> {
        let document = canonicalize(document_bytes, Input::Document)?;
        Ok(self.validate_value(&document))
    }
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator").finish_non_exhaustive()
    }
}

/// Validate a YAML document against a YAML (or JSON) schema.
///
/// Both inputs are canonicalized to JSON first; the schema side is
/// reported separately from the document side.
///
/// ```
/// let schema = br#"{"type": "object", "properties": {"id": {"type": "object"}}}"#;
/// let outcome = thingbase_schema::validate(schema, b"id: {version: '0.1'}").unwrap();
/// assert!(outcome.is_valid());
/// ```
pub fn validate(schema_bytes: &[u8], document_bytes: &[u8]) -> Result<ValidationOutcome> {
    let schema = canonicalize(schema_bytes, Input::Schema)?;
    let document = canonicalize(document_bytes, Input::Document)?;
    Ok(SchemaValidator::from_json(&schema)?.validate_value(&document))
}

fn canonicalize(bytes: &[u8], input: Input) -> Result<Value> {
    yaml_to_json(bytes).map_err(|e| match (e, input) {
        (CanonicalError::Syntax(e), Input::Schema) => ValidationError::SchemaParseFailed(e),
        (CanonicalError::Syntax(e), Input::Document) => ValidationError::DocumentParseFailed(e),
        (CanonicalError::Incompatible { pointer, reason }, input) => {
            ValidationError::NotJsonCompatible {
                input,
                pointer,
                reason,
            }
        }
    })
}
