use std::fmt::Display;

use crate::params::{Param, ParamLike};

use super::ResolutionError;

/// How a source file encodes the spectrum references an identification file
/// points into it with, taken from the file's declared spectrum ID format term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SourceFileIdFormat {
    /// `query=N`, zero based
    MascotQueryNumber,
    /// `index=N`, zero based
    MultiPeakListNativeId,
    /// `file=NAME`
    SinglePeakListNativeId,
    /// `scan=N`
    ScanNumberNativeId,
    /// `mzMLid=ID`
    MzmlId,
    /// `spectrum=N`
    MzdataId,
    WiffNativeId,
    /// Any other vendor native ID, used verbatim
    SpectrumNativeId,
    /// Spectra are referenced by their MGF `TITLE`
    MgfTitle,
    #[default]
    Unknown,
}

impl SourceFileIdFormat {
    pub fn from_curie(curie: &str) -> Self {
        match curie {
            "MS:1001528" => Self::MascotQueryNumber,
            "MS:1000774" => Self::MultiPeakListNativeId,
            "MS:1000775" => Self::SinglePeakListNativeId,
            "MS:1000776" => Self::ScanNumberNativeId,
            "MS:1001530" => Self::MzmlId,
            "MS:1000777" => Self::MzdataId,
            "MS:1000770" => Self::WiffNativeId,
            // Thermo, Waters, Bruker/Agilent YEP, Bruker BAF, Bruker FID, Bruker U2
            "MS:1000768" | "MS:1000769" | "MS:1000771" | "MS:1000772" | "MS:1000773"
            | "MS:1000823" => Self::SpectrumNativeId,
            "MS:1000796" => Self::MgfTitle,
            _ => Self::Unknown,
        }
    }

    /// Classify a declared ID format term. Uncontrolled terms are [`SourceFileIdFormat::Unknown`].
    pub fn from_param(param: &Param) -> Self {
        param
            .curie()
            .map(|curie| Self::from_curie(&curie))
            .unwrap_or_default()
    }

    pub const fn curie(&self) -> Option<&'static str> {
        match self {
            Self::MascotQueryNumber => Some("MS:1001528"),
            Self::MultiPeakListNativeId => Some("MS:1000774"),
            Self::SinglePeakListNativeId => Some("MS:1000775"),
            Self::ScanNumberNativeId => Some("MS:1000776"),
            Self::MzmlId => Some("MS:1001530"),
            Self::MzdataId => Some("MS:1000777"),
            Self::WiffNativeId => Some("MS:1000770"),
            Self::SpectrumNativeId => Some("MS:1000768"),
            Self::MgfTitle => Some("MS:1000796"),
            Self::Unknown => None,
        }
    }

    /// The token stripped from the front of a raw reference
    pub const fn prefix(&self) -> Option<&'static str> {
        match self {
            Self::MascotQueryNumber => Some("query="),
            Self::MultiPeakListNativeId => Some("index="),
            Self::SinglePeakListNativeId => Some("file="),
            Self::ScanNumberNativeId => Some("scan="),
            Self::MzmlId => Some("mzMLid="),
            Self::MzdataId => Some("spectrum="),
            _ => None,
        }
    }

    /// Whether the numeric remainder is zero based and must be shifted to be one based
    pub const fn is_zero_based(&self) -> bool {
        matches!(self, Self::MascotQueryNumber | Self::MultiPeakListNativeId)
    }

    /// Guess the format from the shape of a raw reference, used when the
    /// declared format says nothing about the raw token
    pub fn infer_from_token(raw: &str) -> Self {
        const CANDIDATES: [SourceFileIdFormat; 6] = [
            SourceFileIdFormat::MascotQueryNumber,
            SourceFileIdFormat::MultiPeakListNativeId,
            SourceFileIdFormat::SinglePeakListNativeId,
            SourceFileIdFormat::ScanNumberNativeId,
            SourceFileIdFormat::MzmlId,
            SourceFileIdFormat::MzdataId,
        ];
        let raw = raw.trim_start();
        CANDIDATES
            .into_iter()
            .find(|f| f.prefix().is_some_and(|p| raw.starts_with(p)))
            .unwrap_or_default()
    }

    /// Rewrite a raw spectrum reference into its canonical spectrum token.
    ///
    /// The format's prefix is stripped if present, and zero based formats have
    /// their numeric remainder incremented by one. Formats without a prefix
    /// return the input unchanged.
    ///
    /// ```
    /// use mzcache::ident::SourceFileIdFormat;
    ///
    /// assert_eq!(SourceFileIdFormat::MascotQueryNumber.rewrite("query=41").unwrap(), "42");
    /// assert_eq!(SourceFileIdFormat::ScanNumberNativeId.rewrite("scan=100").unwrap(), "100");
    /// ```
    ///
    /// # Errors
    /// [`ResolutionError::NotNumeric`] if a zero based format's remainder is not an integer,
    /// or is too large to be incremented.
    pub fn rewrite(&self, raw: &str) -> Result<String, ResolutionError> {
        let Some(prefix) = self.prefix() else {
            return Ok(raw.to_string());
        };
        let trimmed = raw.trim();
        let remainder = trimmed.strip_prefix(prefix).unwrap_or(trimmed);
        if self.is_zero_based() {
            let index: u64 = remainder
                .parse()
                .map_err(|_| ResolutionError::NotNumeric(raw.to_string(), *self))?;
            let index = index
                .checked_add(1)
                .ok_or_else(|| ResolutionError::NotNumeric(raw.to_string(), *self))?;
            Ok(index.to_string())
        } else {
            Ok(remainder.to_string())
        }
    }
}

impl Display for SourceFileIdFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
