//! Locator parsing and context-contained resolution.
//!
//! A *locator* is any user-supplied string naming a Thing or a schema: a bare
//! relative path, an absolute path, or a `scheme://` URI. A *context* is the
//! base a relative locator resolves against. Resolution turns the pair into a
//! [`ResolvedThingLocation`] or refuses it.
//!
//! # Containment
//!
//! When the context is mandatory, a resolved path is always textually
//! prefixed by the context path. Parent-directory segments are rejected before
//! any prefix check, so `ctx/../../etc/passwd` never slips through by prefix
//! coincidence. A thing that names its own scheme must agree with the
//! context's scheme (and host); disagreement is a containment violation.
//!
//! # Modules
//!
//! - [`uri`] -- [`Locator`], the typed parse of a locator string
//! - [`scheme`] -- [`SchemeTable`] and [`SchemeClass`]
//! - [`resolve`] -- the [`Resolver`] and [`ResolvedThingLocation`]
//! - [`error`] -- [`ParseError`] and [`ResolutionError`]

pub mod error;
pub mod resolve;
pub mod scheme;
pub mod uri;

pub use error::{ParseError, ResolutionError, Result};
pub use resolve::{resolve, ResolvedThingLocation, Resolver};
pub use scheme::{SchemeClass, SchemeTable};
pub use uri::Locator;

/// The scheme of local, writable locations; also the default for scheme-less
/// locators under a scheme-less context.
pub const LOCAL_SCHEME: &str = "file";
