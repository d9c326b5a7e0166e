use std::fmt::Display;
use std::sync::Arc;

use crate::ident::SpectrumReference;
use crate::meta::{CvDescriptor, SpectraData};
use crate::model::{Chromatogram, Modification, Peptide, Protein, ProteinGroup, Spectrum};
use crate::params::{Param, ParamList};

/// A key into a cache category, or an element of a collection category.
///
/// Source formats have no common identifier type: XML formats use string ids,
/// relational sources use integer primary keys and the MGF title lookup is keyed by
/// a `(title, source file)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CacheKey {
    Id(String),
    Number(u64),
    Pair(String, String),
}

impl CacheKey {
    pub fn pair<A: Into<String>, B: Into<String>>(first: A, second: B) -> Self {
        Self::Pair(first.into(), second.into())
    }

    /// The key as a string id, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Id(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// An empty id or pair component cannot address anything
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Id(id) => !id.is_empty(),
            Self::Number(_) => true,
            Self::Pair(a, b) => !a.is_empty() && !b.is_empty(),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => f.write_str(id),
            Self::Number(n) => write!(f, "{n}"),
            Self::Pair(a, b) => write!(f, "({a}, {b})"),
        }
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        Self::Id(value.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        Self::Id(value)
    }
}

impl From<&String> for CacheKey {
    fn from(value: &String) -> Self {
        Self::Id(value.clone())
    }
}

impl From<u64> for CacheKey {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl<A: Into<String>, B: Into<String>> From<(A, B)> for CacheKey {
    fn from((a, b): (A, B)) -> Self {
        Self::pair(a, b)
    }
}

/// A value stored in a map category.
///
/// Lightweight index values are stored inline, heavyweight domain objects are
/// shared through an [`Arc`] so that every read hands out a cheap snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Ids(Vec<String>),
    SpectrumReference(SpectrumReference),
    SpectrumReferences(Vec<SpectrumReference>),
    Param(Param),
    Params(ParamList),
    Modifications(Vec<Modification>),
    Cv(CvDescriptor),
    SpectraData(Arc<SpectraData>),
    Spectrum(Arc<Spectrum>),
    Chromatogram(Arc<Chromatogram>),
    Protein(Arc<Protein>),
    ProteinGroup(Arc<ProteinGroup>),
    Peptide(Arc<Peptide>),
}

macro_rules! value_accessor {
    ($as_fn:ident, $into_fn:ident, $variant:ident, $t:ty) => {
        pub fn $as_fn(&self) -> Option<&$t> {
            match self {
                Self::$variant(v) => Some(v),
                _ => None,
            }
        }

        pub fn $into_fn(self) -> Option<$t> {
            match self {
                Self::$variant(v) => Some(v),
                _ => None,
            }
        }
    };
}

impl CacheValue {
    value_accessor!(as_text, into_text, Text, String);
    value_accessor!(as_ids, into_ids, Ids, Vec<String>);
    value_accessor!(as_spectrum_reference, into_spectrum_reference, SpectrumReference, SpectrumReference);
    value_accessor!(as_spectrum_references, into_spectrum_references, SpectrumReferences, Vec<SpectrumReference>);
    value_accessor!(as_param, into_param, Param, Param);
    value_accessor!(as_params, into_params, Params, ParamList);
    value_accessor!(as_modifications, into_modifications, Modifications, Vec<Modification>);
    value_accessor!(as_cv, into_cv, Cv, CvDescriptor);
    value_accessor!(as_spectra_data, into_spectra_data, SpectraData, Arc<SpectraData>);
    value_accessor!(as_spectrum, into_spectrum, Spectrum, Arc<Spectrum>);
    value_accessor!(as_chromatogram, into_chromatogram, Chromatogram, Arc<Chromatogram>);
    value_accessor!(as_protein, into_protein, Protein, Arc<Protein>);
    value_accessor!(as_protein_group, into_protein_group, ProteinGroup, Arc<ProteinGroup>);
    value_accessor!(as_peptide, into_peptide, Peptide, Arc<Peptide>);

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Read a numeric value, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for CacheValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for CacheValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<String>> for CacheValue {
    fn from(value: Vec<String>) -> Self {
        Self::Ids(value)
    }
}

impl From<SpectrumReference> for CacheValue {
    fn from(value: SpectrumReference) -> Self {
        Self::SpectrumReference(value)
    }
}

impl From<Param> for CacheValue {
    fn from(value: Param) -> Self {
        Self::Param(value)
    }
}

impl From<CvDescriptor> for CacheValue {
    fn from(value: CvDescriptor) -> Self {
        Self::Cv(value)
    }
}

impl From<Spectrum> for CacheValue {
    fn from(value: Spectrum) -> Self {
        Self::Spectrum(Arc::new(value))
    }
}

impl From<Chromatogram> for CacheValue {
    fn from(value: Chromatogram) -> Self {
        Self::Chromatogram(Arc::new(value))
    }
}

impl From<Protein> for CacheValue {
    fn from(value: Protein) -> Self {
        Self::Protein(Arc::new(value))
    }
}

impl From<ProteinGroup> for CacheValue {
    fn from(value: ProteinGroup) -> Self {
        Self::ProteinGroup(Arc::new(value))
    }
}

impl From<Peptide> for CacheValue {
    fn from(value: Peptide) -> Self {
        Self::Peptide(Arc::new(value))
    }
}

impl From<SpectraData> for CacheValue {
    fn from(value: SpectraData) -> Self {
        Self::SpectraData(Arc::new(value))
    }
}
