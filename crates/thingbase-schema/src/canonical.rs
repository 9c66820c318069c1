//! YAML to canonical JSON.
//!
//! Records and schemas are "JSON-compatible YAML": every mapping key is a
//! string, there are no explicit tags, and every number is finite. Anything
//! else is refused rather than coerced, so what gets validated is exactly
//! what a JSON reader of the same data would see.

use serde_json::{Map, Number, Value as Json};
use serde_yaml::Value as Yaml;

/// Why a YAML input could not be canonicalized.
#[derive(Debug)]
pub enum CanonicalError {
    Syntax(serde_yaml::Error),
    Incompatible { pointer: String, reason: String },
}

/// Parse YAML bytes and convert them to a `serde_json::Value`.
///
/// Merge keys (`<<`) are applied first. An empty input is `null`.
pub fn yaml_to_json(bytes: &[u8]) -> Result<Json, CanonicalError> {
    let mut yaml: Yaml = serde_yaml::from_slice(bytes).map_err(CanonicalError::Syntax)?;
    yaml.apply_merge().map_err(CanonicalError::Syntax)?;
    convert(yaml, &mut String::new())
}

fn convert(value: Yaml, pointer: &mut String) -> Result<Json, CanonicalError> {
    match value {
        Yaml::Null => Ok(Json::Null),
        Yaml::Bool(b) => Ok(Json::Bool(b)),
        Yaml::Number(n) => number(&n, pointer).map(Json::Number),
        Yaml::String(s) => Ok(Json::String(s)),
        Yaml::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&i.to_string());
                out.push(convert(item, pointer)?);
                pointer.truncate(len);
            }
            Ok(Json::Array(out))
        }
        Yaml::Mapping(mapping) => {
            let mut out = Map::new();
            for (key, item) in mapping {
                let Yaml::String(key) = key else {
                    return Err(incompatible(
                        pointer,
                        format!("mapping key {key:?} is not a string"),
                    ));
                };
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&key.replace('~', "~0").replace('/', "~1"));
                let item = convert(item, pointer)?;
                pointer.truncate(len);
                out.insert(key, item);
            }
            Ok(Json::Object(out))
        }
        Yaml::Tagged(tagged) => Err(incompatible(
            pointer,
            format!("explicit tag {} is not allowed", tagged.tag),
        )),
    }
}

fn number(n: &serde_yaml::Number, pointer: &str) -> Result<Number, CanonicalError> {
    if let Some(i) = n.as_i64() {
        return Ok(i.into());
    }
    if let Some(u) = n.as_u64() {
        return Ok(u.into());
    }
    n.as_f64()
        .and_then(Number::from_f64)
        .ok_or_else(|| incompatible(pointer, format!("number {n} is not finite")))
}

fn incompatible(pointer: &str, reason: String) -> CanonicalError {
    CanonicalError::Incompatible {
        pointer: pointer.to_string(),
        reason,
    }
}
