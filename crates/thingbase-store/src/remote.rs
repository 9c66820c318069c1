use std::io;

use thingbase_locator::ResolvedThingLocation;

/// Fetches the bytes behind a read-only remote location.
///
/// The store ships without an implementation. Embedders that want `http`,
/// `https` or `ftp` reads plug one in with
/// [`ThingStore::with_remote`](crate::ThingStore::with_remote).
pub trait RemoteSource: Send + Sync {
    fn fetch(&self, location: &ResolvedThingLocation) -> io::Result<Vec<u8>>;
}
