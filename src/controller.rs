//! The consumer side of the cache: one open source, one populated store.
use std::sync::Arc;

use log::{debug, trace};

use crate::cache::{CacheEntry, CacheKey, CacheStore, CacheValue};
use crate::ident::SpectrumReference;
use crate::io::{ProteinSource, SpectrumSource};
use crate::meta::SpectraData;
use crate::model::{Protein, Spectrum};
use crate::strategy::{CachingStrategy, DataAccessError};

/// Owns a source and the [`CacheStore`] built from it.
///
/// The store is populated exactly once, by [`open`](Self::open). Every query
/// method after that reads only from the store and never re-parses the source.
/// Missing keys yield `None` or an empty `Vec`, never an error.
///
/// ```
/// use mzcache::controller::CachedDataAccessController;
/// use mzcache::io::{ElementKind, MemorySource};
/// use mzcache::strategy::MzMLCachingStrategy;
///
/// let mut source = MemorySource::new();
/// source.add_ids(ElementKind::Spectrum, ["scan=1", "scan=2"]);
/// let controller = CachedDataAccessController::open(source, &MzMLCachingStrategy).unwrap();
/// assert_eq!(controller.spectrum_ids(), vec!["scan=1", "scan=2"]);
/// ```
#[derive(Debug)]
pub struct CachedDataAccessController<R> {
    reader: R,
    store: CacheStore,
}

fn key_strings(keys: Vec<CacheKey>) -> Vec<String> {
    keys.into_iter().map(|k| k.to_string()).collect()
}

impl<R> CachedDataAccessController<R> {
    /// Populate a fresh store from `reader` with `strategy`
    pub fn open<S: CachingStrategy<R> + ?Sized>(reader: R, strategy: &S) -> Result<Self, DataAccessError> {
        Self::open_with_store(reader, strategy, CacheStore::new())
    }

    /// Like [`open`](Self::open), with a store configured by the caller
    pub fn open_with_store<S: CachingStrategy<R> + ?Sized>(
        reader: R,
        strategy: &S,
        store: CacheStore,
    ) -> Result<Self, DataAccessError> {
        strategy.populate(&reader, &store)?;
        debug!("Opened source with {} cached categories", store.entries().len());
        Ok(Self { reader, store })
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Run `strategy` again over the same source. On failure the store
    /// should be considered unreliable.
    pub fn refresh<S: CachingStrategy<R> + ?Sized>(&self, strategy: &S) -> Result<(), DataAccessError> {
        strategy.populate(&self.reader, &self.store)
    }

    pub fn spectrum_ids(&self) -> Vec<String> {
        key_strings(self.store.keys(CacheEntry::SpectrumId))
    }

    pub fn chromatogram_ids(&self) -> Vec<String> {
        key_strings(self.store.keys(CacheEntry::ChromatogramId))
    }

    pub fn protein_ids(&self) -> Vec<String> {
        key_strings(self.store.keys(CacheEntry::ProteinId))
    }

    pub fn protein_group_ids(&self) -> Vec<String> {
        key_strings(self.store.keys(CacheEntry::ProteinGroupId))
    }

    pub fn psm_ids(&self) -> Vec<String> {
        key_strings(self.store.keys(CacheEntry::PsmId))
    }

    /// The identification items (or PSMs) supporting `protein_id`
    pub fn peptide_evidence_ids(&self, protein_id: &str) -> Vec<String> {
        self.store
            .get(CacheEntry::ProteinToPeptideEvidences, protein_id)
            .and_then(CacheValue::into_ids)
            .unwrap_or_default()
    }

    pub fn protein_group_members(&self, group_id: &str) -> Vec<String> {
        self.store
            .get(CacheEntry::ProteinGroupToProteins, group_id)
            .and_then(CacheValue::into_ids)
            .unwrap_or_default()
    }

    /// The spectrum an identification item or PSM was matched against
    pub fn spectrum_reference(&self, item_id: &str) -> Option<SpectrumReference> {
        self.store
            .get(CacheEntry::PeptideToSpectrum, item_id)
            .and_then(CacheValue::into_spectrum_reference)
    }

    /// Every spectrum a PSM was matched against. Sources without chimeric
    /// matches report at most one.
    pub fn spectrum_references(&self, item_id: &str) -> Vec<SpectrumReference> {
        self.store
            .get(CacheEntry::PsmToSpectra, item_id)
            .and_then(CacheValue::into_spectrum_references)
            .or_else(|| self.spectrum_reference(item_id).map(|r| vec![r]))
            .unwrap_or_default()
    }

    /// The canonical spectrum ids identified in one source file or ms-run
    pub fn spectrum_ids_for_source(&self, source_id: &str) -> Vec<String> {
        self.store
            .get(CacheEntry::SpectraDataToSpectrumIds, source_id)
            .and_then(CacheValue::into_ids)
            .unwrap_or_default()
    }

    pub fn psm_ids_for_run(&self, ms_run: &str) -> Vec<String> {
        self.store
            .get(CacheEntry::MsRunToPsmIds, ms_run)
            .and_then(CacheValue::into_ids)
            .unwrap_or_default()
    }

    /// The one based index of the spectrum titled `title` in a title referenced source
    pub fn title_index(&self, title: &str, source_id: &str) -> Option<String> {
        self.store
            .get(CacheEntry::SpectrumTitleToIndex, CacheKey::pair(title, source_id))
            .and_then(CacheValue::into_text)
    }

    pub fn is_title_referenced(&self, source_id: &str) -> bool {
        self.store
            .contains_key(CacheEntry::SpectraDataTitleReferenced, source_id)
    }

    pub fn spectra_data(&self, source_id: &str) -> Option<Arc<SpectraData>> {
        self.store
            .get(CacheEntry::SpectraData, source_id)
            .and_then(CacheValue::into_spectra_data)
    }

    /// Identification items whose spectrum reference could not be resolved
    pub fn unresolved_items(&self) -> Vec<String> {
        key_strings(self.store.keys(CacheEntry::UnresolvedSpectrumReference))
    }

    /// Drop everything cached and hand the source back
    pub fn close(self) -> R {
        self.store.clear_all();
        self.reader
    }
}

impl<R: SpectrumSource> CachedDataAccessController<R> {
    /// Load a spectrum, going through the bounded spectrum cache. An empty id
    /// names no spectrum.
    pub fn spectrum(&self, id: &str) -> Result<Option<Arc<Spectrum>>, DataAccessError> {
        if id.is_empty() {
            return Ok(None);
        }
        if let Some(spectrum) = self
            .store
            .get(CacheEntry::Spectrum, id)
            .and_then(CacheValue::into_spectrum)
        {
            trace!("Spectrum {id} served from cache");
            return Ok(Some(spectrum));
        }
        let Some(spectrum) = self.reader.load_spectrum(id)? else {
            return Ok(None);
        };
        let spectrum = Arc::new(spectrum);
        self.store
            .put(CacheEntry::Spectrum, id, CacheValue::Spectrum(spectrum.clone()))?;
        Ok(Some(spectrum))
    }
}

impl<R: ProteinSource> CachedDataAccessController<R> {
    /// Load a protein, going through the bounded protein cache
    pub fn protein(&self, id: &str) -> Result<Option<Arc<Protein>>, DataAccessError> {
        if id.is_empty() {
            return Ok(None);
        }
        if let Some(protein) = self
            .store
            .get(CacheEntry::Protein, id)
            .and_then(CacheValue::into_protein)
        {
            return Ok(Some(protein));
        }
        let Some(protein) = self.reader.load_protein(id)? else {
            return Ok(None);
        };
        let protein = Arc::new(protein);
        self.store
            .put(CacheEntry::Protein, id, CacheValue::Protein(protein.clone()))?;
        Ok(Some(protein))
    }
}
