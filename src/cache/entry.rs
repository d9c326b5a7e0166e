use std::fmt::Display;
use std::num::NonZeroUsize;

/// The shape of the container backing a [`CacheEntry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// An access-ordered map holding at most `capacity` entries
    BoundedMap(NonZeroUsize),
    UnboundedMap,
    List,
    Set,
}

impl ContainerKind {
    pub const fn is_map(&self) -> bool {
        matches!(self, Self::BoundedMap(_) | Self::UnboundedMap)
    }

    pub const fn is_collection(&self) -> bool {
        !self.is_map()
    }

    pub const fn capacity(&self) -> Option<NonZeroUsize> {
        match self {
            Self::BoundedMap(capacity) => Some(*capacity),
            _ => None,
        }
    }
}

impl Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BoundedMap(capacity) => write!(f, "bounded map ({capacity})"),
            Self::UnboundedMap => f.write_str("map"),
            Self::List => f.write_str("list"),
            Self::Set => f.write_str("set"),
        }
    }
}

const fn bounded(capacity: usize) -> ContainerKind {
    match NonZeroUsize::new(capacity) {
        Some(capacity) => ContainerKind::BoundedMap(capacity),
        None => ContainerKind::UnboundedMap,
    }
}

macro_rules! cache_entries {
    ($($(#[$meta:meta])* $variant:ident => $kind:expr),+ $(,)?) => {
        /// The closed set of things a [`CacheStore`](crate::cache::CacheStore) can hold.
        ///
        /// Each category has a fixed [`ContainerKind`], available through
        /// [`CacheEntry::container_kind`]. The table is static, so there is no way
        /// to ask for a category the catalog does not know about.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum CacheEntry {
            $($(#[$meta])* $variant,)+
        }

        impl CacheEntry {
            /// Every category, in declaration order
            pub const ALL: &'static [CacheEntry] = &[$(CacheEntry::$variant,)+];

            /// Look up the container shape this category is stored in
            pub const fn container_kind(&self) -> ContainerKind {
                match self {
                    $(CacheEntry::$variant => $kind,)+
                }
            }

            pub const fn name(&self) -> &'static str {
                match self {
                    $(CacheEntry::$variant => stringify!($variant),)+
                }
            }
        }
    };
}

cache_entries! {
    /// spectrum id → [`Spectrum`](crate::model::Spectrum)
    Spectrum => bounded(200),
    /// chromatogram id → [`Chromatogram`](crate::model::Chromatogram)
    Chromatogram => bounded(20),
    /// protein id → [`Protein`](crate::model::Protein)
    Protein => bounded(200),
    /// protein group id → [`ProteinGroup`](crate::model::ProteinGroup)
    ProteinGroup => bounded(200),
    /// identification item id → [`Peptide`](crate::model::Peptide)
    Peptide => bounded(500),

    SpectrumId => ContainerKind::Set,
    ChromatogramId => ContainerKind::List,
    ProteinId => ContainerKind::List,
    ProteinGroupId => ContainerKind::List,
    PsmId => ContainerKind::List,
    MsRunId => ContainerKind::List,
    /// Source files whose spectra are referenced by MGF title
    SpectraDataTitleReferenced => ContainerKind::Set,
    /// Identification items whose spectrum reference could not be resolved
    UnresolvedSpectrumReference => ContainerKind::Set,

    SpectrumLevel => ContainerKind::UnboundedMap,
    PrecursorCharge => ContainerKind::UnboundedMap,
    PrecursorMz => ContainerKind::UnboundedMap,
    PrecursorIntensity => ContainerKind::UnboundedMap,

    ProteinAccession => ContainerKind::UnboundedMap,
    ProteinAccessionVersion => ContainerKind::UnboundedMap,
    ProteinSearchDatabase => ContainerKind::UnboundedMap,
    ProteinScore => ContainerKind::UnboundedMap,
    ProteinThreshold => ContainerKind::UnboundedMap,
    /// protein id → identification item / PSM ids
    ProteinToPeptideEvidences => ContainerKind::UnboundedMap,
    /// protein id → peptide ids
    ProteinToPeptide => ContainerKind::UnboundedMap,
    ProteinGroupToProteins => ContainerKind::UnboundedMap,

    /// identification item / PSM id → [`SpectrumReference`](crate::ident::SpectrumReference)
    PeptideToSpectrum => ContainerKind::UnboundedMap,
    /// PSM id → every spectrum reference of the PSM
    PsmToSpectra => ContainerKind::UnboundedMap,
    PeptideStart => ContainerKind::UnboundedMap,
    PeptideEnd => ContainerKind::UnboundedMap,
    PeptideSequence => ContainerKind::UnboundedMap,
    PeptideToModification => ContainerKind::UnboundedMap,
    NumberOfFragmentIons => ContainerKind::UnboundedMap,

    /// source file / ms-run id → spectrum ids
    SpectraDataToSpectrumIds => ContainerKind::UnboundedMap,
    MsRunToPsmIds => ContainerKind::UnboundedMap,
    /// (title, source file id) → canonical spectrum index
    SpectrumTitleToIndex => ContainerKind::UnboundedMap,
    SpectraData => ContainerKind::UnboundedMap,
    FragmentationTable => ContainerKind::UnboundedMap,
    CvLookup => ContainerKind::UnboundedMap,

    ExperimentParam => ContainerKind::UnboundedMap,
    SpectrumToParam => ContainerKind::UnboundedMap,
    ProteinToParam => ContainerKind::UnboundedMap,
    PeptideToParam => ContainerKind::UnboundedMap,
}

impl Display for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_catalog_shapes() {
        assert_eq!(CacheEntry::SpectrumId.container_kind(), ContainerKind::Set);
        assert_eq!(CacheEntry::ProteinId.container_kind(), ContainerKind::List);
        assert_eq!(
            CacheEntry::Spectrum.container_kind().capacity().map(|c| c.get()),
            Some(200)
        );
        assert!(CacheEntry::PeptideToSpectrum.container_kind().is_map());
        assert!(CacheEntry::UnresolvedSpectrumReference
            .container_kind()
            .is_collection());
    }

    #[test]
    fn test_catalog_is_closed() {
        let bounded = CacheEntry::ALL
            .iter()
            .filter(|e| e.container_kind().capacity().is_some())
            .count();
        assert_eq!(bounded, 5);
        assert_eq!(CacheEntry::ALL[0], CacheEntry::Spectrum);
        assert_eq!(CacheEntry::CvLookup.to_string(), "CvLookup");
    }
}
