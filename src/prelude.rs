pub use crate::cache::{CacheEntry, CacheKey, CacheStore, CacheValue};
pub use crate::controller::CachedDataAccessController;
pub use crate::ident::SpectrumReference;
pub use crate::io::{
    AttributeSource, IdIndexSource, MzIdentMLSource, MzTabSource, ProteinSource, SpectraDataSource,
    SpectrumSource,
};
pub use crate::params::{ParamDescribed, ParamLike};
pub use crate::strategy::{
    CachingStrategy, MzDataCachingStrategy, MzIdentMLCachingStrategy, MzMLCachingStrategy,
    MzTabCachingStrategy, MzXMLCachingStrategy, NetCdfCachingStrategy, PeakListCachingStrategy,
    PrideXmlCachingStrategy,
};
