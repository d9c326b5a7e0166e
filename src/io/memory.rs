use std::collections::{HashMap, HashSet};

use crate::meta::{CvDescriptor, SpectraData};
use crate::model::{Protein, Spectrum};
use crate::params::{Param, ParamLike};

use super::traits::{
    AttributeSource, Attributes, ElementKind, IdIndexSource, MzIdentMLSource, MzTabSource, ProteinSource,
    PsmRecord, SourceCapabilities, SourceReadError, SpectraDataSource, SpectrumSource,
};

/// A source held entirely in memory, standing in for any of the format readers.
///
/// It implements every capability trait, so it can drive the simple strategies,
/// the mzIdentML strategy and the mzTab strategy alike:
///
/// ```
/// use mzcache::io::{MemorySource, ElementKind, IdIndexSource};
///
/// let mut source = MemorySource::new();
/// source.add_ids(ElementKind::Spectrum, ["scan=1", "scan=2"]);
/// assert_eq!(source.element_ids(ElementKind::Spectrum).unwrap().len(), 2);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    ids: HashMap<ElementKind, Vec<String>>,
    attributes: HashMap<(ElementKind, String), Attributes>,
    params: HashMap<(ElementKind, String), Vec<Param>>,
    spectra_data: Vec<SpectraData>,
    result_items: HashMap<String, Vec<String>>,
    item_evidence: HashMap<String, Vec<String>>,
    group_members: HashMap<String, Vec<String>>,
    fragmentation_table: Vec<(String, Param)>,
    cvs: Vec<CvDescriptor>,
    psms: Vec<PsmRecord>,
    spectra: HashMap<String, Spectrum>,
    proteins: HashMap<String, Protein>,
    failing: HashSet<ElementKind>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_id(&mut self, kind: ElementKind, id: &str) {
        let ids = self.ids.entry(kind).or_default();
        if !ids.iter().any(|i| i == id) {
            ids.push(id.to_string());
        }
    }

    /// Register element ids of a kind
    pub fn add_ids<I: IntoIterator<Item = S>, S: AsRef<str>>(&mut self, kind: ElementKind, ids: I) -> &mut Self {
        for id in ids {
            self.push_id(kind, id.as_ref());
        }
        self
    }

    pub fn set_attribute(&mut self, kind: ElementKind, id: &str, name: &str, value: &str) -> &mut Self {
        self.attributes
            .entry((kind, id.to_string()))
            .or_default()
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn add_param(&mut self, kind: ElementKind, id: &str, param: Param) -> &mut Self {
        self.params.entry((kind, id.to_string())).or_default().push(param);
        self
    }

    pub fn add_spectra_data(&mut self, spectra_data: SpectraData) -> &mut Self {
        self.push_id(ElementKind::SpectraData, &spectra_data.id);
        self.spectra_data.push(spectra_data);
        self
    }

    /// Add a `<SpectrumIdentificationResult>` pointing at `spectrum_id` in `spectra_data_ref`
    pub fn add_result(&mut self, id: &str, spectra_data_ref: &str, spectrum_id: &str) -> &mut Self {
        self.push_id(ElementKind::SpectrumIdentificationResult, id);
        self.set_attribute(ElementKind::SpectrumIdentificationResult, id, "spectraData_ref", spectra_data_ref);
        self.set_attribute(ElementKind::SpectrumIdentificationResult, id, "spectrumID", spectrum_id);
        self.result_items.entry(id.to_string()).or_default();
        self
    }

    /// Add an identification item to a result, referencing peptide evidences
    pub fn add_item(&mut self, result_id: &str, item_id: &str, evidence_refs: &[&str]) -> &mut Self {
        self.push_id(ElementKind::SpectrumIdentificationItem, item_id);
        self.result_items
            .entry(result_id.to_string())
            .or_default()
            .push(item_id.to_string());
        self.item_evidence
            .entry(item_id.to_string())
            .or_default()
            .extend(evidence_refs.iter().map(|s| s.to_string()));
        self
    }

    /// Add a `<PeptideEvidence>` owned by the `<DBSequence>` `db_sequence_ref`
    pub fn add_peptide_evidence(&mut self, id: &str, db_sequence_ref: &str) -> &mut Self {
        self.push_id(ElementKind::PeptideEvidence, id);
        self.set_attribute(ElementKind::PeptideEvidence, id, "dBSequence_ref", db_sequence_ref)
    }

    pub fn add_db_sequence(&mut self, id: &str, accession: &str) -> &mut Self {
        self.push_id(ElementKind::DbSequence, id);
        self.set_attribute(ElementKind::DbSequence, id, "accession", accession)
    }

    pub fn add_protein_group(&mut self, group_id: &str, members: &[&str]) -> &mut Self {
        self.push_id(ElementKind::ProteinAmbiguityGroup, group_id);
        for member in members {
            self.push_id(ElementKind::ProteinDetectionHypothesis, member);
        }
        self.group_members
            .entry(group_id.to_string())
            .or_default()
            .extend(members.iter().map(|s| s.to_string()));
        self
    }

    pub fn add_fragmentation_measure(&mut self, id: &str, measure: Param) -> &mut Self {
        self.fragmentation_table.push((id.to_string(), measure));
        self
    }

    pub fn add_cv(&mut self, cv: CvDescriptor) -> &mut Self {
        self.cvs.push(cv);
        self
    }

    pub fn add_psm(&mut self, psm: PsmRecord) -> &mut Self {
        self.push_id(ElementKind::Psm, &psm.id);
        self.psms.push(psm);
        self
    }

    pub fn add_spectrum(&mut self, spectrum: Spectrum) -> &mut Self {
        self.push_id(ElementKind::Spectrum, &spectrum.id);
        self.spectra.insert(spectrum.id.clone(), spectrum);
        self
    }

    pub fn add_protein(&mut self, protein: Protein) -> &mut Self {
        self.push_id(ElementKind::Protein, &protein.id);
        self.proteins.insert(protein.id.clone(), protein);
        self
    }

    /// Make every enumeration of `kind` fail as if the file were truncated there
    pub fn fail_on(&mut self, kind: ElementKind) -> &mut Self {
        self.failing.insert(kind);
        self
    }

    fn check(&self, kind: ElementKind, id: &str) -> Result<(), SourceReadError> {
        if self.failing.contains(&kind) {
            Err(SourceReadError::Malformed {
                kind,
                id: id.to_string(),
                reason: "unexpected end of document".into(),
            })
        } else {
            Ok(())
        }
    }

    fn has(&self, kind: ElementKind) -> bool {
        self.ids.get(&kind).is_some_and(|ids| !ids.is_empty())
    }
}

impl IdIndexSource for MemorySource {
    fn capabilities(&self) -> SourceCapabilities {
        let mut caps = SourceCapabilities::empty();
        if self.has(ElementKind::Spectrum) {
            caps |= SourceCapabilities::SPECTRA;
        }
        if self.has(ElementKind::Chromatogram) {
            caps |= SourceCapabilities::CHROMATOGRAMS;
        }
        if self.has(ElementKind::Protein)
            || self.has(ElementKind::DbSequence)
            || self.has(ElementKind::ProteinDetectionHypothesis)
        {
            caps |= SourceCapabilities::PROTEINS;
        }
        if self.has(ElementKind::ProteinAmbiguityGroup) {
            caps |= SourceCapabilities::PROTEIN_GROUPS;
        }
        if self.spectra_data.iter().any(|s| s.id_format.is_some()) {
            caps |= SourceCapabilities::SPECTRUM_ID_FORMAT;
        }
        if self.params.values().flatten().any(|p| p.is_term(crate::ident::SPECTRUM_TITLE_ACCESSION)) {
            caps |= SourceCapabilities::SPECTRUM_TITLES;
        }
        if self.has(ElementKind::SpectrumIdentificationResult) || self.has(ElementKind::Psm) {
            caps |= SourceCapabilities::IDENTIFICATIONS;
        }
        caps
    }

    fn element_ids(&self, kind: ElementKind) -> Result<Vec<String>, SourceReadError> {
        self.check(kind, "*")?;
        Ok(self.ids.get(&kind).cloned().unwrap_or_default())
    }
}

impl AttributeSource for MemorySource {
    fn element_attributes(&self, kind: ElementKind, id: &str) -> Result<Attributes, SourceReadError> {
        self.check(kind, id)?;
        Ok(self
            .attributes
            .get(&(kind, id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn cv_param(&self, kind: ElementKind, id: &str, accession: &str) -> Result<Option<Param>, SourceReadError> {
        self.check(kind, id)?;
        Ok(self
            .params
            .get(&(kind, id.to_string()))
            .and_then(|params| params.iter().find(|p| p.is_term(accession)))
            .cloned())
    }
}

impl SpectraDataSource for MemorySource {
    fn spectra_data(&self) -> Result<Vec<SpectraData>, SourceReadError> {
        self.check(ElementKind::SpectraData, "*")?;
        Ok(self.spectra_data.clone())
    }
}

impl MzIdentMLSource for MemorySource {
    fn identification_item_ids(&self, result_id: &str) -> Result<Vec<String>, SourceReadError> {
        self.check(ElementKind::SpectrumIdentificationItem, result_id)?;
        self.result_items
            .get(result_id)
            .cloned()
            .ok_or_else(|| SourceReadError::MissingElement {
                kind: ElementKind::SpectrumIdentificationResult,
                id: result_id.to_string(),
            })
    }

    fn peptide_evidence_refs(&self, item_id: &str) -> Result<Vec<String>, SourceReadError> {
        self.check(ElementKind::PeptideEvidence, item_id)?;
        Ok(self.item_evidence.get(item_id).cloned().unwrap_or_default())
    }

    fn protein_group_members(&self, group_id: &str) -> Result<Vec<String>, SourceReadError> {
        self.check(ElementKind::ProteinAmbiguityGroup, group_id)?;
        Ok(self.group_members.get(group_id).cloned().unwrap_or_default())
    }

    fn fragmentation_table(&self) -> Result<Vec<(String, Param)>, SourceReadError> {
        Ok(self.fragmentation_table.clone())
    }

    fn cv_list(&self) -> Result<Vec<CvDescriptor>, SourceReadError> {
        Ok(self.cvs.clone())
    }
}

impl MzTabSource for MemorySource {
    fn psms(&self) -> Result<Vec<PsmRecord>, SourceReadError> {
        self.check(ElementKind::Psm, "*")?;
        Ok(self.psms.clone())
    }
}

impl SpectrumSource for MemorySource {
    fn load_spectrum(&self, id: &str) -> Result<Option<Spectrum>, SourceReadError> {
        self.check(ElementKind::Spectrum, id)?;
        Ok(self.spectra.get(id).cloned())
    }
}

impl ProteinSource for MemorySource {
    fn load_protein(&self, id: &str) -> Result<Option<Protein>, SourceReadError> {
        self.check(ElementKind::Protein, id)?;
        Ok(self.proteins.get(id).cloned())
    }
}
