//! Record store for thingbase.
//!
//! [`ThingStore`] ties locator resolution, document extraction, the record
//! codec and schema validation to the filesystem. Writes go through a temp
//! file in the target directory and are renamed into place; create-style
//! writes never replace an existing entry.

pub mod config;
pub mod error;
pub mod remote;
pub mod store;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use remote::RemoteSource;
pub use store::ThingStore;
