//! Content validation for thingbase records.
//!
//! Schemas and records are both written as JSON-compatible YAML. Each side is
//! canonicalized to JSON and the document is checked against the schema with
//! the `jsonschema` engine. A document that fails its schema is a normal
//! [`ValidationOutcome`]; only inputs that cannot be read at all become a
//! [`ValidationError`].

pub mod canonical;
pub mod error;
pub mod outcome;
pub mod validator;

pub use canonical::yaml_to_json;
pub use error::{Input, Result, ValidationError};
pub use outcome::{ValidationOutcome, Violation};
pub use validator::{validate, SchemaValidator};
