//! Population of an mzTab identification index.
//!
//! mzTab is flat: each PSM row names its protein accession directly and lists its
//! spectra as `ms_run[N]:reference` pairs. There is no evidence chain to follow,
//! so one pass over the PSM rows is enough to build every table.
use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};

use crate::cache::{CacheEntry, CacheStore, CacheValue};
use crate::ident::{ResolutionError, SourceFileIdFormat, SpectraRef, SpectrumReference};
use crate::io::{ElementKind, MzTabSource, PsmRecord};

use super::{replace_entries, replace_keys, CachingStrategy, DataAccessError};

/// Builds the identification index of an mzTab file.
///
/// Spectrum references are rewritten with the ID format declared by their
/// ms-run. MGF titles are not interpreted for mzTab, a title referenced ms-run
/// keeps its raw references. A PSM referencing several spectra keeps all of
/// them in [`CacheEntry::PsmToSpectra`] and the first in [`CacheEntry::PeptideToSpectrum`].
///
/// Without declared protein groups, proteins are associated with the PSMs that
/// carry their accession. This goes through an accession index built in the same
/// pass, so it costs one lookup per protein rather than a scan of every PSM.
#[derive(Debug, Default, Clone, Copy)]
pub struct MzTabCachingStrategy;

#[derive(Debug, Default)]
struct PsmIndex {
    psm_ids: IndexSet<String>,
    first_reference: IndexMap<String, SpectrumReference>,
    all_references: IndexMap<String, Vec<SpectrumReference>>,
    run_psms: IndexMap<String, IndexSet<String>>,
    run_spectra: IndexMap<String, IndexSet<String>>,
    by_accession: IndexMap<String, Vec<String>>,
    unresolved: IndexSet<String>,
}

fn resolve_spectra_ref(
    formats: &HashMap<String, SourceFileIdFormat>,
    spectra_ref: &SpectraRef,
) -> Result<SpectrumReference, ResolutionError> {
    let format = formats
        .get(&spectra_ref.ms_run)
        .ok_or_else(|| ResolutionError::UnknownSourceFile(spectra_ref.ms_run.clone()))?;
    let spectrum = match format {
        SourceFileIdFormat::MgfTitle => spectra_ref.reference.clone(),
        _ => format.rewrite(&spectra_ref.reference)?,
    };
    Ok(SpectrumReference::new(spectrum, spectra_ref.ms_run.as_str()))
}

impl PsmIndex {
    fn add(&mut self, psm: PsmRecord, formats: &HashMap<String, SourceFileIdFormat>) {
        let PsmRecord {
            id,
            accession,
            spectra_ref,
        } = psm;

        if let Some(accession) = accession.filter(|a| !a.is_empty()) {
            let psms = self.by_accession.entry(accession).or_default();
            if !psms.contains(&id) {
                psms.push(id.clone());
            }
        }

        let mut references: Vec<SpectrumReference> = Vec::new();
        match SpectraRef::parse_list(&spectra_ref) {
            Ok(refs) => {
                for r in refs.iter() {
                    match resolve_spectra_ref(formats, r) {
                        Ok(reference) => references.push(reference),
                        Err(err) => {
                            warn!("Skipping a spectrum of PSM {id}: {err}");
                            self.unresolved.insert(id.clone());
                        }
                    }
                }
            }
            Err(err) => {
                warn!("Skipping the spectra of PSM {id}: {err}");
                self.unresolved.insert(id.clone());
            }
        };

        if references.is_empty() {
            if !spectra_ref.trim().is_empty() && !spectra_ref.trim().eq_ignore_ascii_case("null") {
                self.unresolved.insert(id.clone());
            }
        } else {
            for reference in references.iter() {
                self.run_psms
                    .entry(reference.source_file.clone())
                    .or_default()
                    .insert(id.clone());
                self.run_spectra
                    .entry(reference.source_file.clone())
                    .or_default()
                    .insert(reference.spectrum.clone());
            }
            self.first_reference.insert(id.clone(), references[0].clone());
            self.all_references.insert(id.clone(), references);
        }

        self.psm_ids.insert(id);
    }
}

impl MzTabCachingStrategy {
    fn cache_proteins<R: MzTabSource + ?Sized>(
        &self,
        reader: &R,
        index: &mut PsmIndex,
        store: &CacheStore,
    ) -> Result<(), DataAccessError> {
        if reader.has_protein_groups()? {
            debug!("mzTab declares protein groups, caching them as given");
            replace_keys(
                store,
                CacheEntry::ProteinGroupId,
                reader.element_ids(ElementKind::ProteinAmbiguityGroup)?,
            )?;
            replace_keys(store, CacheEntry::ProteinId, reader.element_ids(ElementKind::Protein)?)?;
            store.clear(CacheEntry::ProteinToPeptideEvidences);
            return Ok(());
        }

        let mut by_accession = std::mem::take(&mut index.by_accession);
        let declared = reader.element_ids(ElementKind::Protein)?;
        let mut protein_psms: IndexMap<String, Vec<String>> = IndexMap::with_capacity(declared.len());
        for accession in declared {
            let psms = by_accession.swap_remove(&accession).unwrap_or_default();
            protein_psms.insert(accession, psms);
        }
        for (accession, psms) in by_accession {
            debug!("Accession {accession} only appears on PSMs, indexing it anyway");
            protein_psms.insert(accession, psms);
        }

        let protein_ids: Vec<String> = protein_psms.keys().cloned().collect();
        replace_keys(store, CacheEntry::ProteinId, protein_ids)?;
        replace_entries(
            store,
            CacheEntry::ProteinToPeptideEvidences,
            protein_psms.into_iter().filter(|(_, psms)| !psms.is_empty()),
        )?;
        store.clear(CacheEntry::ProteinGroupId);
        Ok(())
    }
}

impl<R: MzTabSource + ?Sized> CachingStrategy<R> for MzTabCachingStrategy {
    fn populate(&self, reader: &R, store: &CacheStore) -> Result<(), DataAccessError> {
        let ms_runs = reader.spectra_data()?;
        let formats: HashMap<String, SourceFileIdFormat> = ms_runs
            .iter()
            .map(|run| {
                let format = run
                    .id_format
                    .as_ref()
                    .map(SourceFileIdFormat::from_param)
                    .unwrap_or_default();
                (run.id.clone(), format)
            })
            .collect();
        debug!("mzTab declares {} ms-runs", ms_runs.len());

        replace_keys(
            store,
            CacheEntry::MsRunId,
            ms_runs.iter().map(|run| run.id.as_str()),
        )?;
        replace_entries(
            store,
            CacheEntry::SpectraData,
            ms_runs.into_iter().map(|run| (run.id.clone(), run)),
        )?;

        let mut index = PsmIndex::default();
        for psm in reader.psms()? {
            index.add(psm, &formats);
        }
        debug!("Indexed {} PSMs", index.psm_ids.len());

        self.cache_proteins(reader, &mut index, store)?;

        let PsmIndex {
            psm_ids,
            first_reference,
            all_references,
            run_psms,
            run_spectra,
            unresolved,
            ..
        } = index;

        replace_keys(store, CacheEntry::PsmId, psm_ids)?;
        replace_entries(store, CacheEntry::PeptideToSpectrum, first_reference)?;
        replace_entries(
            store,
            CacheEntry::PsmToSpectra,
            all_references
                .into_iter()
                .map(|(id, refs)| (id, CacheValue::SpectrumReferences(refs))),
        )?;
        replace_entries(
            store,
            CacheEntry::MsRunToPsmIds,
            run_psms
                .into_iter()
                .map(|(run, ids)| (run, ids.into_iter().collect::<Vec<_>>())),
        )?;
        replace_entries(
            store,
            CacheEntry::SpectraDataToSpectrumIds,
            run_spectra
                .into_iter()
                .map(|(run, ids)| (run, ids.into_iter().collect::<Vec<_>>())),
        )?;
        if !unresolved.is_empty() {
            warn!("{} PSMs have unresolvable spectra references", unresolved.len());
        }
        replace_keys(store, CacheEntry::UnresolvedSpectrumReference, unresolved)?;
        Ok(())
    }
}
