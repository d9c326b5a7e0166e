//! Strategies for formats whose native ids are directly usable as cache keys.
//!
//! These read the id listings a reader exposes and store them as flat
//! collections, without any cross referencing.
use log::debug;

use crate::cache::{CacheEntry, CacheStore};
use crate::io::{ElementKind, IdIndexSource, SourceCapabilities};

use super::{cache_element_ids, CachingStrategy, DataAccessError};

macro_rules! flat_id_strategy {
    ($(#[$meta:meta])* $name:ident, $format:literal, [$(($kind:ident, $entry:ident, $capability:expr)),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl<R: IdIndexSource + ?Sized> CachingStrategy<R> for $name {
            fn populate(&self, reader: &R, store: &CacheStore) -> Result<(), DataAccessError> {
                let capabilities = reader.capabilities();
                $(
                    let required: SourceCapabilities = $capability;
                    if capabilities.contains(required) {
                        let n = cache_element_ids(reader, store, ElementKind::$kind, CacheEntry::$entry)?;
                        debug!("{}: cached {} {} ids", $format, n, ElementKind::$kind);
                    } else {
                        store.clear(CacheEntry::$entry);
                    }
                )+
                Ok(())
            }
        }
    };
}

flat_id_strategy!(
    /// Caches spectrum and chromatogram ids of an mzML file
    MzMLCachingStrategy,
    "mzML",
    [
        (Spectrum, SpectrumId, SourceCapabilities::empty()),
        (Chromatogram, ChromatogramId, SourceCapabilities::CHROMATOGRAMS),
    ]
);

flat_id_strategy!(
    MzXMLCachingStrategy,
    "mzXML",
    [(Spectrum, SpectrumId, SourceCapabilities::empty())]
);

flat_id_strategy!(
    MzDataCachingStrategy,
    "mzData",
    [(Spectrum, SpectrumId, SourceCapabilities::empty())]
);

flat_id_strategy!(
    /// Caches the spectrum ids of a peak list file (MGF, DTA, PKL, MS2, APL).
    /// Peak list readers number their spectra from one.
    PeakListCachingStrategy,
    "peak list",
    [(Spectrum, SpectrumId, SourceCapabilities::empty())]
);

flat_id_strategy!(
    NetCdfCachingStrategy,
    "NetCDF",
    [(Spectrum, SpectrumId, SourceCapabilities::empty())]
);

flat_id_strategy!(
    /// Caches spectrum ids and identification (protein) ids of a PRIDE XML file
    PrideXmlCachingStrategy,
    "PRIDE XML",
    [
        (Spectrum, SpectrumId, SourceCapabilities::empty()),
        (Protein, ProteinId, SourceCapabilities::PROTEINS),
    ]
);

#[cfg(test)]
mod test {
    use super::*;
    use crate::cache::CacheKey;
    use crate::io::MemorySource;
    use crate::model::Protein;

    fn keys(ids: &[&str]) -> Vec<CacheKey> {
        ids.iter().map(|s| CacheKey::from(*s)).collect()
    }

    #[test_log::test]
    fn test_mzml_strategy() {
        let mut source = MemorySource::new();
        source
            .add_ids(ElementKind::Spectrum, ["scan=1", "scan=2", "scan=3"])
            .add_ids(ElementKind::Chromatogram, ["TIC"]);
        let store = CacheStore::new();
        MzMLCachingStrategy.populate(&source, &store).unwrap();
        MzMLCachingStrategy.populate(&source, &store).unwrap();

        assert_eq!(
            store.get_collection(CacheEntry::SpectrumId),
            Some(keys(&["scan=1", "scan=2", "scan=3"]))
        );
        assert_eq!(store.get_collection(CacheEntry::ChromatogramId), Some(keys(&["TIC"])));
    }

    #[test_log::test]
    fn test_pride_xml_strategy() {
        let mut source = MemorySource::new();
        source
            .add_ids(ElementKind::Spectrum, ["1", "2"])
            .add_protein(Protein::new("0", "P12345"))
            .add_protein(Protein::new("1", "Q67890"));
        let store = CacheStore::new();
        PrideXmlCachingStrategy.populate(&source, &store).unwrap();

        assert_eq!(store.len(CacheEntry::SpectrumId), 2);
        assert_eq!(store.get_collection(CacheEntry::ProteinId), Some(keys(&["0", "1"])));
    }

    #[test_log::test]
    fn test_missing_capability_leaves_category_absent() {
        let mut source = MemorySource::new();
        source.add_ids(ElementKind::Spectrum, ["1"]);
        let store = CacheStore::new();
        store.put_key(CacheEntry::ChromatogramId, "stale").unwrap();
        MzMLCachingStrategy.populate(&source, &store).unwrap();
        assert!(!store.contains(CacheEntry::ChromatogramId));
        PeakListCachingStrategy.populate(&source, &store).unwrap();
        assert_eq!(store.len(CacheEntry::SpectrumId), 1);
    }

    #[test_log::test]
    fn test_read_failure_propagates() {
        let mut source = MemorySource::new();
        source.add_ids(ElementKind::Spectrum, ["1"]).fail_on(ElementKind::Spectrum);
        let store = CacheStore::new();
        let err = MzXMLCachingStrategy.populate(&source, &store).unwrap_err();
        assert!(matches!(err, DataAccessError::SourceRead(_)));
    }
}
