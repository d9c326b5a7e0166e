//! Descriptions of the files and vocabularies a result file refers to.
use crate::impl_param_described;
use crate::params::{Param, ParamList};

/// A source spectrum file referenced by an identification file, an mzIdentML
/// `<SpectraData>` element or an mzTab `ms_run`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectraData {
    pub id: String,
    pub name: String,
    pub location: String,
    pub file_format: Option<Param>,
    /// The declared spectrum ID format term, which decides how spectrum
    /// references into this file are rewritten
    pub id_format: Option<Param>,
    pub params: ParamList,
}

impl SpectraData {
    pub fn new<I: Into<String>, L: Into<String>>(id: I, location: L) -> Self {
        Self {
            id: id.into(),
            location: location.into(),
            ..Default::default()
        }
    }

    pub fn with_id_format(mut self, id_format: Param) -> Self {
        self.id_format = Some(id_format);
        self
    }

    pub fn with_file_format(mut self, file_format: Param) -> Self {
        self.file_format = Some(file_format);
        self
    }
}

impl_param_described!(SpectraData);

/// An entry of a document's controlled vocabulary list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CvDescriptor {
    pub id: String,
    pub full_name: String,
    pub uri: String,
    pub version: Option<String>,
}

impl CvDescriptor {
    pub fn new<I: Into<String>, N: Into<String>, U: Into<String>>(id: I, full_name: N, uri: U) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            uri: uri.into(),
            version: None,
        }
    }
}
