//! Scheme classification.
//!
//! The table is plain configuration data: built once (from defaults or from a
//! config file), wrapped in an `Arc`, and never mutated afterwards.

use std::collections::BTreeSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::LOCAL_SCHEME;

static STANDARD: Lazy<Arc<SchemeTable>> = Lazy::new(|| {
    Arc::new(SchemeTable::new(
        ["http", "https"],
        [LOCAL_SCHEME],
    ))
});

/// What a scheme allows the store to do with a location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchemeClass {
    /// May be read, never written (`http`, `https`).
    ReadOnlyRemote,
    /// May be read and written on the local filesystem (`file`).
    ReadWriteLocal,
    Unsupported,
}

impl SchemeClass {
    pub fn is_readable(self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    pub fn is_writable(self) -> bool {
        matches!(self, Self::ReadWriteLocal)
    }
}

/// Fixed mapping from scheme to [`SchemeClass`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemeTable {
    read_only: BTreeSet<String>,
    read_write: BTreeSet<String>,
}

impl SchemeTable {
    /// Build a table. Schemes are matched case-insensitively.
    pub fn new<R, W>(read_only: R, read_write: W) -> Self
    where
        R: IntoIterator,
        R::Item: AsRef<str>,
        W: IntoIterator,
        W::Item: AsRef<str>,
    {
        Self {
            read_only: read_only
                .into_iter()
                .map(|s| s.as_ref().to_ascii_lowercase())
                .collect(),
            read_write: read_write
                .into_iter()
                .map(|s| s.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// The built-in process-wide table: `http`/`https` read-only, `file`
    /// read-write.
    pub fn standard() -> Arc<Self> {
        Arc::clone(&STANDARD)
    }

    /// Classify a scheme. The empty scheme is the local scheme.
    pub fn classify(&self, scheme: &str) -> SchemeClass {
        let scheme = if scheme.is_empty() { LOCAL_SCHEME } else { scheme };
        let contains =
            |set: &BTreeSet<String>| set.iter().any(|s| s.eq_ignore_ascii_case(scheme));
        if contains(&self.read_write) {
            SchemeClass::ReadWriteLocal
        } else if contains(&self.read_only) {
            SchemeClass::ReadOnlyRemote
        } else {
            SchemeClass::Unsupported
        }
    }

    pub fn read_only(&self) -> impl Iterator<Item = &str> {
        self.read_only.iter().map(String::as_str)
    }

    pub fn read_write(&self) -> impl Iterator<Item = &str> {
        self.read_write.iter().map(String::as_str)
    }
}

impl Default for SchemeTable {
    fn default() -> Self {
        STANDARD.as_ref().clone()
    }
}
