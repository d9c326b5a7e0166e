//! Heavyweight domain objects held in the bounded cache categories.
//!
//! These are the fully materialized entities a format reader produces on demand.
//! The cache only ever stores them behind an [`Arc`](std::sync::Arc) so that handing
//! a snapshot to a caller does not copy the peak arrays.
use crate::ident::SpectrumReference;
use crate::impl_param_described;
use crate::params::ParamList;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Precursor {
    pub mz: f64,
    pub charge: Option<i32>,
    pub intensity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    pub id: String,
    pub index: usize,
    pub ms_level: u8,
    pub precursors: Vec<Precursor>,
    pub mz_array: Vec<f64>,
    pub intensity_array: Vec<f32>,
    pub params: ParamList,
}

impl Spectrum {
    pub fn new<I: Into<String>>(id: I, index: usize, ms_level: u8) -> Self {
        Self {
            id: id.into(),
            index,
            ms_level,
            ..Default::default()
        }
    }

    /// The first precursor, if this is an MSn spectrum
    pub fn precursor(&self) -> Option<&Precursor> {
        self.precursors.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chromatogram {
    pub id: String,
    pub index: usize,
    pub time_array: Vec<f64>,
    pub intensity_array: Vec<f32>,
    pub params: ParamList,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Protein {
    pub id: String,
    pub accession: String,
    pub accession_version: Option<String>,
    pub search_database: Option<String>,
    pub sequence: Option<String>,
    pub score: Option<f64>,
    pub threshold: Option<f64>,
    /// Identification items or PSMs supporting this protein
    pub peptide_ids: Vec<String>,
    pub params: ParamList,
}

impl Protein {
    pub fn new<I: Into<String>, A: Into<String>>(id: I, accession: A) -> Self {
        Self {
            id: id.into(),
            accession: accession.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProteinGroup {
    pub id: String,
    pub protein_ids: Vec<String>,
    pub params: ParamList,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Modification {
    /// Zero marks the N-terminus, `sequence.len() + 1` the C-terminus
    pub location: i32,
    pub accession: String,
    pub database: Option<String>,
    pub name: Option<String>,
    pub monoisotopic_mass_delta: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Peptide {
    pub id: String,
    pub sequence: String,
    pub start: Option<u32>,
    pub end: Option<u32>,
    pub spectrum: Option<SpectrumReference>,
    pub modifications: Vec<Modification>,
    pub params: ParamList,
}

impl Peptide {
    pub fn new<I: Into<String>, S: Into<String>>(id: I, sequence: S) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
            ..Default::default()
        }
    }
}

impl_param_described!(Spectrum, Chromatogram, Protein, ProteinGroup, Peptide);
