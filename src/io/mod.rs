//! The narrow read interfaces caching strategies consume from format readers.
//!
//! Parsing mzML, mzIdentML, mzTab or PRIDE XML byte streams is the job of the
//! reader implementations. A strategy only ever sees a reader through the
//! capability traits defined here, so it depends on what a reader can do, not on
//! which concrete reader it is.
//!
//! [`MemorySource`] implements every one of them over in-memory tables.
mod memory;
mod traits;

pub use memory::MemorySource;
pub use traits::{
    AttributeSource, Attributes, ElementKind, IdIndexSource, MzIdentMLSource, MzTabSource, ProteinSource,
    PsmRecord, SourceCapabilities, SourceReadError, SpectraDataSource, SpectrumSource,
};
