//! Resolution of a thing locator against a context locator.
//!
//! Checks run from the cheapest and most fatal to the most semantic so the
//! reported error is as specific as possible:
//!
//! 1. both locators parse
//! 2. the thing path is non-empty
//! 3. the context path is absolute
//! 4. no `..` segment when the context is mandatory
//! 5. path composition and the prefix check
//! 6. scheme reconciliation
//! 7. scheme classification
//!
//! Whether the result is usable as a local path is a separate question,
//! answered by [`ResolvedThingLocation::local_path`].

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ResolutionError, Result};
use crate::scheme::{SchemeClass, SchemeTable};
use crate::uri::Locator;
use crate::LOCAL_SCHEME;

/// Where a thing lives once its locator has passed every policy check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedThingLocation {
    scheme: String,
    host: Option<String>,
    absolute_path: String,
    context_path: String,
    writable: bool,
}

impl ResolvedThingLocation {
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn absolute_path(&self) -> &str {
        &self.absolute_path
    }

    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    /// True only for schemes in the read-write class.
    pub fn writable(&self) -> bool {
        self.writable
    }

    /// The filesystem path, or [`ResolutionError::NotLocal`] for anything
    /// that is not a read-write local location.
    pub fn local_path(&self) -> Result<PathBuf> {
        if !self.writable {
            return Err(ResolutionError::NotLocal {
                location: self.to_string(),
            });
        }
        Ok(PathBuf::from(&self.absolute_path))
    }
}

impl fmt::Display for ResolvedThingLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}{}",
            self.scheme,
            self.host.as_deref().unwrap_or_default(),
            self.absolute_path
        )
    }
}

/// Resolves thing locators under a shared, immutable scheme table.
#[derive(Clone, Debug)]
pub struct Resolver {
    schemes: Arc<SchemeTable>,
}

impl Resolver {
    pub fn new(schemes: Arc<SchemeTable>) -> Self {
        Self { schemes }
    }

    pub fn schemes(&self) -> &SchemeTable {
        &self.schemes
    }

    /// Resolve `thing` against `context`.
    ///
    /// With `context_required`, the result is guaranteed to lie under the
    /// context path and to share the context's scheme and host.
    ///
    /// ```
    /// use thingbase_locator::Resolver;
    ///
    /// let resolver = Resolver::default();
    /// let loc = resolver.resolve("notes/a.yml", "/home/kb", true).unwrap();
    /// assert_eq!(loc.absolute_path(), "/home/kb/notes/a.yml");
    /// assert!(loc.writable());
    ///
    /// assert!(resolver.resolve("../a.yml", "/home/kb", true).is_err());
    /// ```
    pub fn resolve(
        &self,
        thing: &str,
        context: &str,
        context_required: bool,
    ) -> Result<ResolvedThingLocation> {
        let thing_loc = parse(thing)?;
        let context_loc = parse(context)?;
        for loc in [&thing_loc, &context_loc] {
            if loc.is_opaque() {
                return Err(ResolutionError::UnsupportedScheme {
                    scheme: loc.scheme().to_string(),
                });
            }
        }

        if thing_loc.path().is_empty() {
            return Err(ResolutionError::EmptyPath {
                locator: thing.to_string(),
            });
        }
        if !context_loc.has_absolute_path() {
            return Err(ResolutionError::ContextNotAbsolute {
                path: context_loc.path().to_string(),
            });
        }

        if context_required && thing_loc.has_parent_traversal() {
            return Err(ResolutionError::outside(
                thing,
                context,
                "parent-directory traversal is not permitted",
            ));
        }

        let context_path = context_loc.path();
        let absolute_path = if thing_loc.has_absolute_path() {
            if context_required && !is_within(thing_loc.path(), context_path) {
                return Err(ResolutionError::outside(
                    thing,
                    context,
                    "path is not under the context path",
                ));
            }
            thing_loc.path().to_string()
        } else {
            // Joined on exactly one separator: `/` + `a.yml` is `/a.yml`, and
            // `/kb/` + `a.yml` is `/kb/a.yml`.
            format!("{}/{}", context_path.trim_end_matches('/'), thing_loc.path())
        };

        let (scheme, host) = if thing_loc.scheme().is_empty() {
            if context_loc.scheme().is_empty() {
                (LOCAL_SCHEME, None)
            } else {
                (context_loc.scheme(), context_loc.host())
            }
        } else {
            if context_required {
                if thing_loc.scheme() != context_loc.scheme() {
                    return Err(ResolutionError::outside(
                        thing,
                        context,
                        format!(
                            "scheme {:?} does not match the context scheme {:?}",
                            thing_loc.scheme(),
                            context_loc.scheme()
                        ),
                    ));
                }
                if thing_loc.host() != context_loc.host() {
                    return Err(ResolutionError::outside(
                        thing,
                        context,
                        "host does not match the context host",
                    ));
                }
            }
            (thing_loc.scheme(), thing_loc.host())
        };

        let class = self.schemes.classify(scheme);
        if class == SchemeClass::Unsupported {
            return Err(ResolutionError::UnsupportedScheme {
                scheme: scheme.to_string(),
            });
        }

        debug!(
            thing,
            context,
            context_required,
            scheme,
            path = %absolute_path,
            writable = class.is_writable(),
            "resolved thing locator"
        );

        Ok(ResolvedThingLocation {
            scheme: scheme.to_string(),
            host: host.map(str::to_owned),
            absolute_path,
            context_path: context_path.to_string(),
            writable: class.is_writable(),
        })
    }

    /// Resolve and require a local filesystem path.
    pub fn local_path(
        &self,
        thing: &str,
        context: &str,
        context_required: bool,
    ) -> Result<PathBuf> {
        self.resolve(thing, context, context_required)?.local_path()
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(SchemeTable::standard())
    }
}

/// Resolve with the built-in scheme table.
pub fn resolve(
    thing: &str,
    context: &str,
    context_required: bool,
) -> Result<ResolvedThingLocation> {
    Resolver::default().resolve(thing, context, context_required)
}

fn parse(locator: &str) -> Result<Locator> {
    Locator::parse(locator).map_err(|source| ResolutionError::Malformed {
        locator: locator.to_string(),
        source,
    })
}

/// `path` equals `context` or continues it at a segment boundary.
fn is_within(path: &str, context: &str) -> bool {
    let context = context.trim_end_matches('/');
    if context.is_empty() {
        return true;
    }
    match path.strip_prefix(context) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
