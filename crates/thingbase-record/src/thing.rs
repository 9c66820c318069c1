//! The Thing record.
//!
//! Apart from the identifier, the core treats every field as opaque data: it
//! keeps what it reads and writes back what it was given. Empty fields are
//! left out of the YAML and default back in on parse, so a parse of a
//! serialization is equal to the Thing that was serialized.

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::{Mapping, Value};
use uuid::Uuid;

/// Prefix of every Thing identifier.
pub const URN_UUID_PREFIX: &str = "urn:uuid:";

/// A persisted knowledge-base record.
///
/// Serialized as a YAML mapping with the known keys first, in field order,
/// followed by the keys kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Thing {
    pub id: ThingId,
    pub schema: Vec<SchemaRef>,
    /// Usually zero or one target, occasionally more.
    pub target: Vec<ThingTarget>,
    pub relation: Vec<ThingRelation>,
    pub behavior: BTreeMap<String, Value>,
    pub parameter: BTreeMap<String, Value>,
    pub legal: ThingLegal,
    /// Top-level keys this model does not know about, kept verbatim.
    pub extra: BTreeMap<String, Value>,
}

const KNOWN_KEYS: [&str; 7] = [
    "id",
    "schema",
    "target",
    "relation",
    "behavior",
    "parameter",
    "legal",
];

impl Thing {
    /// A new, otherwise empty Thing with a freshly minted identifier.
    pub fn new() -> Self {
        Self {
            id: ThingId {
                uuid: generate_identifier(),
                ..ThingId::default()
            },
            ..Self::default()
        }
    }

    /// The `urn:uuid:` identifier, possibly empty.
    pub fn identifier(&self) -> &str {
        &self.id.uuid
    }

    pub fn has_identifier(&self) -> bool {
        !self.id.uuid.is_empty()
    }

    /// Assign an identifier if, and only if, there is none. Returns whether
    /// one was generated.
    pub fn ensure_id(&mut self) -> bool {
        if self.has_identifier() {
            return false;
        }
        self.id.uuid = generate_identifier();
        true
    }

    /// Drop the identifier so that the next save mints a new one.
    pub fn clear_id(&mut self) {
        self.id.uuid.clear();
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    /// Split a top-level mapping into the known fields and `extra`.
    ///
    /// Works on the mapping directly so that tagged values under unknown keys
    /// survive; a missing or `null` field takes its default.
    pub fn from_mapping(mut mapping: Mapping) -> Result<Self, serde_yaml::Error> {
        let mut thing = Self {
            id: take(&mut mapping, "id")?,
            schema: take(&mut mapping, "schema")?,
            target: take(&mut mapping, "target")?,
            relation: take(&mut mapping, "relation")?,
            behavior: take(&mut mapping, "behavior")?,
            parameter: take(&mut mapping, "parameter")?,
            legal: take(&mut mapping, "legal")?,
            extra: BTreeMap::new(),
        };
        for (key, value) in mapping {
            let Value::String(key) = key else {
                return Err(serde_yaml::Error::custom(format!(
                    "top-level key {key:?} is not a string"
                )));
            };
            thing.extra.insert(key, value);
        }
        Ok(thing)
    }

    /// The mapping [`Thing::from_mapping`] reads back. Empty fields are left
    /// out.
    pub fn to_mapping(&self) -> Result<Mapping, serde_yaml::Error> {
        let mut mapping = Mapping::new();
        mapping.insert(Value::from("id"), serde_yaml::to_value(&self.id)?);
        put(&mut mapping, "schema", &self.schema, self.schema.is_empty())?;
        put(&mut mapping, "target", &self.target, self.target.is_empty())?;
        put(&mut mapping, "relation", &self.relation, self.relation.is_empty())?;
        put(&mut mapping, "behavior", &self.behavior, self.behavior.is_empty())?;
        put(&mut mapping, "parameter", &self.parameter, self.parameter.is_empty())?;
        put(&mut mapping, "legal", &self.legal, self.legal.is_empty())?;
        for (key, value) in &self.extra {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                mapping.insert(Value::from(key.as_str()), value.clone());
            }
        }
        Ok(mapping)
    }
}

impl Serialize for Thing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error as _;
        self.to_mapping()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Thing {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mapping = Mapping::deserialize(deserializer)?;
        Self::from_mapping(mapping).map_err(D::Error::custom)
    }
}

fn take<T>(mapping: &mut Mapping, key: &str) -> Result<T, serde_yaml::Error>
where
    T: DeserializeOwned + Default,
{
    match mapping.remove(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_yaml::from_value(value),
    }
}

fn put<T: Serialize>(
    mapping: &mut Mapping,
    key: &str,
    value: &T,
    empty: bool,
) -> Result<(), serde_yaml::Error> {
    if !empty {
        mapping.insert(Value::from(key), serde_yaml::to_value(value)?);
    }
    Ok(())
}

/// Identity block of a Thing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThingId {
    /// `urn:uuid:<uuid>`.
    pub uuid: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub url: Vec<String>,
}

impl ThingId {
    /// The UUID inside the identifier, if it is a well-formed `urn:uuid:`.
    pub fn parsed_uuid(&self) -> Option<Uuid> {
        self.uuid
            .strip_prefix(URN_UUID_PREFIX)
            .and_then(|u| Uuid::parse_str(u).ok())
    }
}

/// A schema the Thing claims to follow.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaRef {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
}

/// The concrete or abstract thing a record points at.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThingTarget {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub checksum: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub date: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub geotag: String,
}

/// A typed edge to another Thing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThingRelation {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub thing_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub priority: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThingLegal {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub author: Vec<Attribution>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference: Vec<Attribution>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub license: Vec<Attribution>,
}

impl ThingLegal {
    pub fn is_empty(&self) -> bool {
        self.author.is_empty() && self.reference.is_empty() && self.license.is_empty()
    }
}

/// An author, reference or license entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attribution {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub date: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub geotag: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub target: bool,
}

fn generate_identifier() -> String {
    Uuid::new_v4().urn().to_string()
}
