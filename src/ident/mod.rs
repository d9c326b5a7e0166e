//! Identifier resolution across the spectrum reference schemes of result files.
//!
//! An identification file points at spectra in its source files with raw strings
//! whose meaning depends on the source file's declared ID format: `query=41` in a
//! Mascot search is the 42nd spectrum, `index=0` in a peak list is the first, and
//! some search engines reference MGF spectra by their `TITLE`. Everything here turns
//! those strings into a [`SpectrumReference`], a canonical `(spectrum, source file)`
//! pair usable as a cache key.
use std::fmt::Display;

use thiserror::Error;

mod id_format;
mod resolver;
mod spectra_ref;

pub use id_format::SourceFileIdFormat;
pub use resolver::{ResolutionMode, ResolvedSpectrum, SpectrumIdResolver};
pub use spectra_ref::SpectraRef;

/// The CV term carrying an MGF title on an identification result
pub const SPECTRUM_TITLE_ACCESSION: &str = "MS:1000796";

/// A spectrum reference that could not be resolved. These are recorded per
/// identification item and never abort a population pass.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("{kind} {id} is missing the {attribute} attribute")]
    MissingAttribute {
        kind: &'static str,
        id: String,
        attribute: &'static str,
    },
    #[error("Spectrum reference points to undeclared source file {0}")]
    UnknownSourceFile(String),
    #[error("Expected a numeric spectrum reference for {1}, got {0:?}")]
    NotNumeric(String, SourceFileIdFormat),
    #[error("Source file is referenced by title but no title was found for {0:?}")]
    MissingTitle(String),
    #[error("Malformed spectra_ref entry {0:?}")]
    MalformedSpectraRef(String),
}

/// A resolved reference to a spectrum inside a specific source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpectrumReference {
    /// The canonical spectrum token, an index, native ID or MGF title
    pub spectrum: String,
    /// The id of the source file (`SpectraData` or `ms_run`) it belongs to
    pub source_file: String,
}

impl SpectrumReference {
    pub fn new<S: Into<String>, F: Into<String>>(spectrum: S, source_file: F) -> Self {
        Self {
            spectrum: spectrum.into(),
            source_file: source_file.into(),
        }
    }
}

impl Display for SpectrumReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.spectrum, self.source_file)
    }
}
