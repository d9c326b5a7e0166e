use std::collections::HashMap;
use std::fmt::Display;
use std::io;

use bitflags::bitflags;
use thiserror::Error;

use crate::meta::{CvDescriptor, SpectraData};
use crate::model::{Protein, Spectrum};
use crate::params::Param;

/// The kinds of element a source can enumerate and describe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Spectrum,
    Chromatogram,
    /// A protein hit, a PRIDE XML identification or an mzTab protein row
    Protein,
    /// `<DBSequence>` in mzIdentML
    DbSequence,
    /// `<ProteinDetectionHypothesis>` in mzIdentML
    ProteinDetectionHypothesis,
    ProteinAmbiguityGroup,
    SpectrumIdentificationResult,
    SpectrumIdentificationItem,
    PeptideEvidence,
    Peptide,
    SpectraData,
    MsRun,
    Psm,
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

bitflags! {
    /// What a source can provide. Strategies consult these instead of the
    /// concrete reader type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SourceCapabilities: u32 {
        const SPECTRA = 1;
        const CHROMATOGRAMS = 1 << 1;
        const PROTEINS = 1 << 2;
        const PROTEIN_GROUPS = 1 << 3;
        /// Source files carry a declared spectrum ID format
        const SPECTRUM_ID_FORMAT = 1 << 4;
        /// Identification results may carry MGF titles
        const SPECTRUM_TITLES = 1 << 5;
        const IDENTIFICATIONS = 1 << 6;
    }
}

/// A failure of the underlying reader while a strategy scans it
#[derive(Debug, Error)]
pub enum SourceReadError {
    #[error("Malformed {kind} {id}: {reason}")]
    Malformed {
        kind: ElementKind,
        id: String,
        reason: String,
    },
    #[error("{kind} {id} was not found")]
    MissingElement { kind: ElementKind, id: String },
    #[error("An IO error occurred: {0}")]
    IOError(
        #[from]
        #[source]
        io::Error,
    ),
}

pub type Attributes = HashMap<String, String>;

/// Enumerate the ids of every element of a kind, in document order
pub trait IdIndexSource {
    fn capabilities(&self) -> SourceCapabilities;

    fn element_ids(&self, kind: ElementKind) -> Result<Vec<String>, SourceReadError>;

    fn has_capability(&self, capability: SourceCapabilities) -> bool {
        self.capabilities().contains(capability)
    }
}

/// Read the raw attributes and CV parameters of an element without
/// materializing it
pub trait AttributeSource {
    fn element_attributes(&self, kind: ElementKind, id: &str) -> Result<Attributes, SourceReadError>;

    /// Find a CV parameter by its accession on an element
    fn cv_param(&self, kind: ElementKind, id: &str, accession: &str) -> Result<Option<Param>, SourceReadError>;

    fn attribute(&self, kind: ElementKind, id: &str, name: &str) -> Result<Option<String>, SourceReadError> {
        Ok(self.element_attributes(kind, id)?.remove(name))
    }
}

/// List the source spectrum files, with their declared ID formats
pub trait SpectraDataSource {
    fn spectra_data(&self) -> Result<Vec<SpectraData>, SourceReadError>;
}

/// The reads the mzIdentML strategy needs beyond plain attribute access
pub trait MzIdentMLSource: IdIndexSource + AttributeSource + SpectraDataSource {
    fn has_protein_ambiguity_groups(&self) -> Result<bool, SourceReadError> {
        Ok(!self.element_ids(ElementKind::ProteinAmbiguityGroup)?.is_empty())
    }

    /// The `<SpectrumIdentificationItem>` ids inside a result
    fn identification_item_ids(&self, result_id: &str) -> Result<Vec<String>, SourceReadError>;

    /// The `peptideEvidence_ref` values of an identification item
    fn peptide_evidence_refs(&self, item_id: &str) -> Result<Vec<String>, SourceReadError>;

    /// The protein detection hypothesis ids of a protein ambiguity group
    fn protein_group_members(&self, group_id: &str) -> Result<Vec<String>, SourceReadError>;

    /// `<FragmentationTable>` measure id → measure term
    fn fragmentation_table(&self) -> Result<Vec<(String, Param)>, SourceReadError>;

    fn cv_list(&self) -> Result<Vec<CvDescriptor>, SourceReadError>;
}

/// One PSM row of an mzTab file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PsmRecord {
    pub id: String,
    pub accession: Option<String>,
    /// The raw `spectra_ref` cell
    pub spectra_ref: String,
}

impl PsmRecord {
    pub fn new<I: Into<String>, S: Into<String>>(id: I, accession: Option<&str>, spectra_ref: S) -> Self {
        Self {
            id: id.into(),
            accession: accession.map(String::from),
            spectra_ref: spectra_ref.into(),
        }
    }
}

/// The reads the mzTab strategy needs. Ms-runs are reported through
/// [`SpectraDataSource`], one [`SpectraData`] per `ms_run[N]`.
pub trait MzTabSource: IdIndexSource + SpectraDataSource {
    fn psms(&self) -> Result<Vec<PsmRecord>, SourceReadError>;

    fn has_protein_groups(&self) -> Result<bool, SourceReadError> {
        Ok(!self.element_ids(ElementKind::ProteinAmbiguityGroup)?.is_empty())
    }
}

/// Materialize full spectra on demand
pub trait SpectrumSource {
    fn load_spectrum(&self, id: &str) -> Result<Option<Spectrum>, SourceReadError>;
}

/// Materialize full proteins on demand
pub trait ProteinSource {
    fn load_protein(&self, id: &str) -> Result<Option<Protein>, SourceReadError>;
}
