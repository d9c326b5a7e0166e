//! Per-format algorithms that scan a source once and populate a [`CacheStore`].
//!
//! Every strategy implements [`CachingStrategy`] for the reader capabilities it
//! needs. A strategy clears each category immediately before writing it, so
//! running it again over the same source leaves the store in the same state.
//! When the reader fails part way through, the error is returned and whatever
//! was written up to that point stays in the store. Such a store should be
//! discarded along with the file.
use log::trace;
use thiserror::Error;

use crate::cache::{CacheEntry, CacheError, CacheKey, CacheStore, CacheValue};
use crate::io::{ElementKind, IdIndexSource, SourceReadError};

#[cfg(feature = "db")]
pub mod db;
mod mzidentml;
mod mztab;
mod simple;

pub use mzidentml::MzIdentMLCachingStrategy;
pub use mztab::MzTabCachingStrategy;
pub use simple::{
    MzDataCachingStrategy, MzMLCachingStrategy, MzXMLCachingStrategy, NetCdfCachingStrategy,
    PeakListCachingStrategy, PrideXmlCachingStrategy,
};

#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("Failed to read the source: {0}")]
    SourceRead(
        #[from]
        #[source]
        SourceReadError,
    ),
    #[error("Cache misuse: {0}")]
    Cache(
        #[from]
        #[source]
        CacheError,
    ),
    #[cfg(feature = "db")]
    #[error("Database query failed: {0}")]
    Query(
        #[from]
        #[source]
        rusqlite::Error,
    ),
    #[error("The database connection has been closed")]
    ConnectionClosed,
    #[error("Experiment {0} was not found")]
    UnknownExperiment(String),
}

/// A format-specific population algorithm over a reader of type `R`
pub trait CachingStrategy<R: ?Sized> {
    /// Scan `reader` once and write the categories this strategy owns into `store`
    fn populate(&self, reader: &R, store: &CacheStore) -> Result<(), DataAccessError>;
}

/// Clear `entry`, then fill it with `keys`
pub(crate) fn replace_keys<K, I>(store: &CacheStore, entry: CacheEntry, keys: I) -> Result<(), CacheError>
where
    K: Into<CacheKey>,
    I: IntoIterator<Item = K>,
{
    store.clear(entry);
    store.put_all_keys(entry, keys)
}

/// Clear `entry`, then fill it with `entries`
pub(crate) fn replace_entries<K, V, I>(store: &CacheStore, entry: CacheEntry, entries: I) -> Result<(), CacheError>
where
    K: Into<CacheKey>,
    V: Into<CacheValue>,
    I: IntoIterator<Item = (K, V)>,
{
    store.clear(entry);
    store.put_all(entry, entries)
}

/// Copy every id of `kind` into the collection category `entry`
pub(crate) fn cache_element_ids<R: IdIndexSource + ?Sized>(
    reader: &R,
    store: &CacheStore,
    kind: ElementKind,
    entry: CacheEntry,
) -> Result<usize, DataAccessError> {
    let ids = reader.element_ids(kind)?;
    let n = ids.len();
    replace_keys(store, entry, ids)?;
    trace!("Cached {n} {kind} ids in {entry}");
    Ok(n)
}
