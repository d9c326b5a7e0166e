//! Population of an mzIdentML identification index.
//!
//! mzIdentML links its entities through several layers of indirection:
//! a `<SpectrumIdentificationResult>` names a spectrum inside one of the document's
//! `<SpectraData>` files, its `<SpectrumIdentificationItem>`s point at
//! `<PeptideEvidence>` elements, and each evidence points at the `<DBSequence>` it
//! was found in. [`MzIdentMLCachingStrategy`] walks those links once and stores the
//! resulting tables so they never need to be re-derived from the document.
use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace, warn};

use crate::cache::{CacheEntry, CacheKey, CacheStore, CacheValue};
use crate::ident::{
    ResolutionError, ResolvedSpectrum, SpectrumIdResolver, SpectrumReference, SPECTRUM_TITLE_ACCESSION,
};
use crate::io::{ElementKind, MzIdentMLSource, SourceReadError};
use crate::meta::SpectraData;

use super::{replace_entries, replace_keys, CachingStrategy, DataAccessError};

const SPECTRA_DATA_REF: &str = "spectraData_ref";
const SPECTRUM_ID: &str = "spectrumID";
const DB_SEQUENCE_REF: &str = "dBSequence_ref";

/// The steps of one population pass. The protein grouping fork is decided
/// once, when leaving [`Phase::CvLookupCached`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    FragmentationTableCached,
    CvLookupCached,
    ProteinGroupPresent,
    ProteinGroupAbsent,
    SpectraDataCached,
    Done,
}

/// The tables built by the single scan over identification results
#[derive(Debug, Default)]
struct IdentificationIndex {
    /// identification item id → resolved spectrum
    spectrum_references: IndexMap<String, SpectrumReference>,
    /// source file id → canonical spectrum tokens, in first-seen order
    source_spectra: IndexMap<String, IndexSet<String>>,
    /// (title, source file id) → one based spectrum index
    title_index: IndexMap<(String, String), String>,
    /// protein id → identification item ids, only filled when reconstructing
    protein_items: IndexMap<String, Vec<String>>,
    unresolved: IndexSet<String>,
}

impl IdentificationIndex {
    fn record_spectrum(&mut self, resolved: ResolvedSpectrum, items: &[String]) {
        let ResolvedSpectrum {
            reference,
            title_index,
        } = resolved;
        self.source_spectra
            .entry(reference.source_file.clone())
            .or_default()
            .insert(reference.spectrum.clone());
        if let Some(index) = title_index {
            self.title_index.insert(
                (reference.spectrum.clone(), reference.source_file.clone()),
                index,
            );
        }
        for item in items {
            self.spectrum_references.insert(item.clone(), reference.clone());
        }
    }

    fn record_evidence(&mut self, protein_id: String, item_id: &str) {
        let items = self.protein_items.entry(protein_id).or_default();
        if !items.iter().any(|i| i == item_id) {
            items.push(item_id.to_string());
        }
    }
}

/// Builds the identification index of an mzIdentML document.
///
/// When the document declares protein ambiguity groups, the group and protein
/// detection hypothesis ids are cached as given. Otherwise protein to
/// identification item associations are rebuilt bottom-up from the peptide
/// evidence chain. Spectrum references are resolved in either case, each one
/// according to the ID format of its own source file.
///
/// Categories written: [`CacheEntry::FragmentationTable`], [`CacheEntry::CvLookup`],
/// [`CacheEntry::SpectraData`], [`CacheEntry::SpectraDataToSpectrumIds`],
/// [`CacheEntry::PeptideToSpectrum`], [`CacheEntry::SpectrumTitleToIndex`],
/// [`CacheEntry::SpectraDataTitleReferenced`], [`CacheEntry::UnresolvedSpectrumReference`],
/// [`CacheEntry::ProteinId`], and either [`CacheEntry::ProteinGroupId`] with
/// [`CacheEntry::ProteinGroupToProteins`] or [`CacheEntry::ProteinToPeptideEvidences`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MzIdentMLCachingStrategy;

impl MzIdentMLCachingStrategy {
    fn cache_fragmentation_table<R: MzIdentMLSource + ?Sized>(
        &self,
        reader: &R,
        store: &CacheStore,
    ) -> Result<(), DataAccessError> {
        let table = reader.fragmentation_table()?;
        replace_entries(store, CacheEntry::FragmentationTable, table)?;
        Ok(())
    }

    fn cache_cv_lookup<R: MzIdentMLSource + ?Sized>(
        &self,
        reader: &R,
        store: &CacheStore,
    ) -> Result<(), DataAccessError> {
        let cvs = reader.cv_list()?;
        replace_entries(
            store,
            CacheEntry::CvLookup,
            cvs.into_iter().map(|cv| (cv.id.clone(), cv)),
        )?;
        Ok(())
    }

    /// Trust the document's own grouping
    fn cache_declared_groups<R: MzIdentMLSource + ?Sized>(
        &self,
        reader: &R,
        store: &CacheStore,
    ) -> Result<(), DataAccessError> {
        let group_ids = reader.element_ids(ElementKind::ProteinAmbiguityGroup)?;
        let protein_ids = reader.element_ids(ElementKind::ProteinDetectionHypothesis)?;

        let mut members = Vec::with_capacity(group_ids.len());
        for group_id in group_ids.iter() {
            let proteins = reader.protein_group_members(group_id)?;
            if !proteins.is_empty() {
                members.push((group_id.clone(), proteins));
            }
        }
        debug!(
            "Caching {} declared protein groups over {} proteins",
            group_ids.len(),
            protein_ids.len()
        );

        replace_keys(store, CacheEntry::ProteinGroupId, group_ids)?;
        replace_keys(store, CacheEntry::ProteinId, protein_ids)?;
        replace_entries(store, CacheEntry::ProteinGroupToProteins, members)?;
        store.clear(CacheEntry::ProteinToPeptideEvidences);
        Ok(())
    }

    /// Store the protein associations reconstructed from peptide evidences
    fn cache_reconstructed_proteins(
        &self,
        index: &mut IdentificationIndex,
        store: &CacheStore,
    ) -> Result<(), DataAccessError> {
        let protein_items = std::mem::take(&mut index.protein_items);
        debug!(
            "Reconstructed {} proteins from peptide evidences",
            protein_items.len()
        );
        let protein_ids: Vec<String> = protein_items.keys().cloned().collect();
        replace_entries(store, CacheEntry::ProteinToPeptideEvidences, protein_items)?;
        replace_keys(store, CacheEntry::ProteinId, protein_ids)?;
        store.clear(CacheEntry::ProteinGroupId);
        store.clear(CacheEntry::ProteinGroupToProteins);
        Ok(())
    }

    fn cache_spectra(
        &self,
        spectra_data: &[SpectraData],
        resolver: &SpectrumIdResolver,
        index: IdentificationIndex,
        store: &CacheStore,
    ) -> Result<(), DataAccessError> {
        let IdentificationIndex {
            spectrum_references,
            source_spectra,
            title_index,
            unresolved,
            ..
        } = index;

        replace_entries(
            store,
            CacheEntry::SpectraData,
            spectra_data.iter().map(|sd| (sd.id.as_str(), sd.clone())),
        )?;
        replace_entries(
            store,
            CacheEntry::SpectraDataToSpectrumIds,
            source_spectra
                .into_iter()
                .map(|(source, ids)| (source, ids.into_iter().collect::<Vec<_>>())),
        )?;
        replace_entries(store, CacheEntry::PeptideToSpectrum, spectrum_references)?;
        replace_entries(
            store,
            CacheEntry::SpectrumTitleToIndex,
            title_index
                .into_iter()
                .map(|(pair, idx)| (CacheKey::from(pair), CacheValue::Text(idx))),
        )?;
        replace_keys(
            store,
            CacheEntry::SpectraDataTitleReferenced,
            resolver.title_referenced_sources(),
        )?;
        if !unresolved.is_empty() {
            warn!(
                "{} identification items have unresolvable spectrum references",
                unresolved.len()
            );
        }
        replace_keys(store, CacheEntry::UnresolvedSpectrumReference, unresolved)?;
        Ok(())
    }
}

/// Resolve the spectrum reference of one identification result. The outer error
/// is a reader failure, the inner one a reference that could not be resolved.
fn resolve_result<R: MzIdentMLSource + ?Sized>(
    reader: &R,
    resolver: &SpectrumIdResolver,
    result_id: &str,
) -> Result<Result<ResolvedSpectrum, ResolutionError>, SourceReadError> {
    let mut attributes = reader.element_attributes(ElementKind::SpectrumIdentificationResult, result_id)?;
    let missing = |attribute| ResolutionError::MissingAttribute {
        kind: "SpectrumIdentificationResult",
        id: result_id.to_string(),
        attribute,
    };
    let Some(source_id) = attributes.remove(SPECTRA_DATA_REF) else {
        return Ok(Err(missing(SPECTRA_DATA_REF)));
    };
    let Some(raw) = attributes.remove(SPECTRUM_ID) else {
        return Ok(Err(missing(SPECTRUM_ID)));
    };

    let title = if resolver.is_title_referenced(&source_id) {
        reader
            .cv_param(
                ElementKind::SpectrumIdentificationResult,
                result_id,
                SPECTRUM_TITLE_ACCESSION,
            )?
            .map(|param| param.value)
    } else {
        None
    };

    Ok(resolver.resolve(&source_id, &raw, title.as_deref()))
}

/// The single pass over every identification result. Peptide evidences are
/// only followed when `reconstruct_proteins` is set.
fn scan_results<R: MzIdentMLSource + ?Sized>(
    reader: &R,
    resolver: &SpectrumIdResolver,
    reconstruct_proteins: bool,
) -> Result<IdentificationIndex, DataAccessError> {
    let mut index = IdentificationIndex::default();
    let known_proteins: HashSet<String> = if reconstruct_proteins {
        reader
            .element_ids(ElementKind::DbSequence)?
            .into_iter()
            .collect()
    } else {
        HashSet::new()
    };

    let result_ids = reader.element_ids(ElementKind::SpectrumIdentificationResult)?;
    debug!("Scanning {} spectrum identification results", result_ids.len());

    for result_id in result_ids.iter() {
        let items = reader.identification_item_ids(result_id)?;

        match resolve_result(reader, resolver, result_id)? {
            Ok(resolved) => index.record_spectrum(resolved, &items),
            Err(err) => {
                warn!("Skipping the spectrum of {result_id}: {err}");
                index.unresolved.extend(items.iter().cloned());
            }
        }

        if !reconstruct_proteins {
            continue;
        }
        for item_id in items.iter() {
            for evidence_id in reader.peptide_evidence_refs(item_id)? {
                match reader.attribute(ElementKind::PeptideEvidence, &evidence_id, DB_SEQUENCE_REF)? {
                    Some(protein_id) => {
                        if !known_proteins.contains(&protein_id) {
                            debug!("PeptideEvidence {evidence_id} references undeclared protein {protein_id}, indexing it anyway");
                        }
                        trace!("{item_id} supports {protein_id}");
                        index.record_evidence(protein_id, item_id);
                    }
                    None => {
                        warn!("PeptideEvidence {evidence_id} has no {DB_SEQUENCE_REF}, skipping it");
                    }
                }
            }
        }
    }
    Ok(index)
}

impl<R: MzIdentMLSource + ?Sized> CachingStrategy<R> for MzIdentMLCachingStrategy {
    fn populate(&self, reader: &R, store: &CacheStore) -> Result<(), DataAccessError> {
        let spectra_data = reader.spectra_data()?;
        let resolver = SpectrumIdResolver::new(&spectra_data);

        let mut phase = Phase::Start;
        while phase != Phase::Done {
            debug!("mzIdentML population: {phase:?}");
            phase = match phase {
                Phase::Start => {
                    self.cache_fragmentation_table(reader, store)?;
                    Phase::FragmentationTableCached
                }
                Phase::FragmentationTableCached => {
                    self.cache_cv_lookup(reader, store)?;
                    Phase::CvLookupCached
                }
                Phase::CvLookupCached => {
                    if reader.has_protein_ambiguity_groups()? {
                        Phase::ProteinGroupPresent
                    } else {
                        Phase::ProteinGroupAbsent
                    }
                }
                Phase::ProteinGroupPresent => {
                    self.cache_declared_groups(reader, store)?;
                    let index = scan_results(reader, &resolver, false)?;
                    self.cache_spectra(&spectra_data, &resolver, index, store)?;
                    Phase::SpectraDataCached
                }
                Phase::ProteinGroupAbsent => {
                    let mut index = scan_results(reader, &resolver, true)?;
                    self.cache_reconstructed_proteins(&mut index, store)?;
                    self.cache_spectra(&spectra_data, &resolver, index, store)?;
                    Phase::SpectraDataCached
                }
                Phase::SpectraDataCached | Phase::Done => Phase::Done,
            };
        }
        debug!(
            "mzIdentML population finished with {} identification items",
            store.len(CacheEntry::PeptideToSpectrum)
        );
        Ok(())
    }
}
