use std::collections::HashMap;

use log::{debug, trace};

use crate::meta::SpectraData;

use super::{ResolutionError, SourceFileIdFormat, SpectrumReference};

/// How references into one source file are turned into canonical spectrum tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionMode {
    /// The MGF title carried on the identification result is the token
    Title,
    /// The raw reference is rewritten according to the declared ID format
    Positional(SourceFileIdFormat),
}

/// The result of resolving one identification result's spectrum reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpectrum {
    pub reference: SpectrumReference,
    /// For title referenced spectra, the one based index the raw reference
    /// resolves to, since a title cannot be used to seek into the peak file
    pub title_index: Option<String>,
}

/// Resolves `(source file, raw spectrum reference)` pairs to [`SpectrumReference`]s.
///
/// The resolution mode is decided once per source file from its declared ID
/// format. A document may mix modes across its source files, so every lookup
/// goes through the mode of the reference's own source file.
#[derive(Debug, Clone, Default)]
pub struct SpectrumIdResolver {
    modes: HashMap<String, ResolutionMode>,
}

impl SpectrumIdResolver {
    pub fn new<'a, I: IntoIterator<Item = &'a SpectraData>>(spectra_data: I) -> Self {
        let mut modes = HashMap::new();
        for source in spectra_data {
            let format = source
                .id_format
                .as_ref()
                .map(SourceFileIdFormat::from_param)
                .unwrap_or_default();
            let mode = if format == SourceFileIdFormat::MgfTitle {
                ResolutionMode::Title
            } else {
                ResolutionMode::Positional(format)
            };
            debug!("Source file {} resolves spectra by {mode:?}", source.id);
            modes.insert(source.id.clone(), mode);
        }
        Self { modes }
    }

    pub fn mode(&self, source_id: &str) -> Option<ResolutionMode> {
        self.modes.get(source_id).copied()
    }

    pub fn is_title_referenced(&self, source_id: &str) -> bool {
        matches!(self.mode(source_id), Some(ResolutionMode::Title))
    }

    /// Source files whose spectra are referenced by title, sorted
    pub fn title_referenced_sources(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .modes
            .iter()
            .filter(|(_, mode)| **mode == ResolutionMode::Title)
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn has_title_references(&self) -> bool {
        self.modes.values().any(|m| *m == ResolutionMode::Title)
    }

    /// Resolve a raw reference against `source_id`.
    ///
    /// `title` is only consulted when the source file is title referenced.
    ///
    /// # Errors
    /// - [`ResolutionError::UnknownSourceFile`] if `source_id` was never declared
    /// - [`ResolutionError::MissingTitle`] if the source is title referenced and no title was given
    /// - [`ResolutionError::NotNumeric`] if a zero based reference is not an integer
    pub fn resolve(
        &self,
        source_id: &str,
        raw: &str,
        title: Option<&str>,
    ) -> Result<ResolvedSpectrum, ResolutionError> {
        let mode = self
            .mode(source_id)
            .ok_or_else(|| ResolutionError::UnknownSourceFile(source_id.to_string()))?;
        let resolved = match mode {
            ResolutionMode::Title => {
                let title = title
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| ResolutionError::MissingTitle(raw.to_string()))?;
                let index = SourceFileIdFormat::infer_from_token(raw)
                    .rewrite(raw)
                    .unwrap_or_else(|_| raw.to_string());
                ResolvedSpectrum {
                    reference: SpectrumReference::new(title, source_id),
                    title_index: Some(index),
                }
            }
            ResolutionMode::Positional(format) => ResolvedSpectrum {
                reference: SpectrumReference::new(format.rewrite(raw)?, source_id),
                title_index: None,
            },
        };
        trace!("Resolved {raw} in {source_id} to {}", resolved.reference);
        Ok(resolved)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::Param;

    fn sources() -> Vec<SpectraData> {
        vec![
            SpectraData::new("SD_1", "run1.mgf")
                .with_id_format(Param::from_curie("MS:1000796", "spectrum title")),
            SpectraData::new("SD_2", "run2.mgf").with_id_format(Param::from_curie(
                "MS:1000774",
                "multiple peak list nativeID format",
            )),
            SpectraData::new("SD_3", "run3.raw"),
        ]
    }

    #[test]
    fn test_per_source_mode() {
        let resolver = SpectrumIdResolver::new(&sources());
        assert_eq!(resolver.mode("SD_1"), Some(ResolutionMode::Title));
        assert_eq!(
            resolver.mode("SD_2"),
            Some(ResolutionMode::Positional(SourceFileIdFormat::MultiPeakListNativeId))
        );
        assert_eq!(
            resolver.mode("SD_3"),
            Some(ResolutionMode::Positional(SourceFileIdFormat::Unknown))
        );
        assert_eq!(resolver.title_referenced_sources(), vec!["SD_1"]);
    }

    #[test]
    fn test_resolve_mixed() {
        let resolver = SpectrumIdResolver::new(&sources());
        let titled = resolver.resolve("SD_1", "index=4", Some("scan 5 title")).unwrap();
        assert_eq!(titled.reference, SpectrumReference::new("scan 5 title", "SD_1"));
        assert_eq!(titled.title_index.as_deref(), Some("5"));

        let positional = resolver.resolve("SD_2", "index=4", Some("ignored")).unwrap();
        assert_eq!(positional.reference, SpectrumReference::new("5", "SD_2"));
        assert_eq!(positional.title_index, None);

        let passthrough = resolver.resolve("SD_3", "scan=9", None).unwrap();
        assert_eq!(passthrough.reference.spectrum, "scan=9");
    }

    #[test]
    fn test_resolve_failures() {
        let resolver = SpectrumIdResolver::new(&sources());
        assert!(matches!(
            resolver.resolve("SD_9", "index=1", None),
            Err(ResolutionError::UnknownSourceFile(_))
        ));
        assert!(matches!(
            resolver.resolve("SD_1", "index=1", None),
            Err(ResolutionError::MissingTitle(_))
        ));
        assert!(matches!(
            resolver.resolve("SD_2", "index=x", None),
            Err(ResolutionError::NotNumeric(..))
        ));
    }
}
