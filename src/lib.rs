//! `mzcache` builds in-memory identifier indices over mass spectrometry proteomics
//! result files, so that questions like "which identification items support
//! protein X" or "which spectrum does this PSM point at" are answered from a
//! cache instead of by re-parsing the file.
//!
//! The pieces fit together like this:
//!
//! - [`cache`] holds the [`CacheStore`], a set of typed containers keyed by
//!   [`CacheEntry`] categories, each with a fixed container shape.
//! - [`io`] declares the narrow read interfaces a format reader exposes.
//! - [`strategy`] holds one [`CachingStrategy`] per format, each scanning a reader
//!   once and filling the store.
//! - [`ident`] resolves the many spectrum reference schemes of mzIdentML and mzTab
//!   into canonical [`SpectrumReference`]s.
//! - [`controller`] ties a reader and its populated store together.
//!
//! ```
//! use mzcache::prelude::*;
//! use mzcache::io::{ElementKind, MemorySource};
//! use mzcache::meta::SpectraData;
//! use mzcache::params::Param;
//!
//! let mut source = MemorySource::new();
//! source
//!     .add_spectra_data(SpectraData::new("SD_1", "run.mgf").with_id_format(
//!         Param::from_curie("MS:1000774", "multiple peak list nativeID format"),
//!     ))
//!     .add_db_sequence("DBSeq_1", "P02768")
//!     .add_peptide_evidence("PE_1", "DBSeq_1")
//!     .add_result("SIR_1", "SD_1", "index=0")
//!     .add_item("SIR_1", "SII_1", &["PE_1"]);
//!
//! let controller = CachedDataAccessController::open(source, &MzIdentMLCachingStrategy).unwrap();
//! assert_eq!(controller.protein_ids(), vec!["DBSeq_1"]);
//! assert_eq!(controller.peptide_evidence_ids("DBSeq_1"), vec!["SII_1"]);
//! assert_eq!(
//!     controller.spectrum_reference("SII_1"),
//!     Some(SpectrumReference::new("1", "SD_1"))
//! );
//! ```
pub mod cache;
pub mod controller;
pub mod ident;
pub mod io;
pub mod meta;
pub mod model;
pub mod params;
pub mod prelude;
pub mod strategy;

pub use crate::cache::{CacheEntry, CacheError, CacheKey, CacheStore, CacheValue, ContainerKind};
pub use crate::controller::CachedDataAccessController;
pub use crate::ident::{SourceFileIdFormat, SpectrumReference};
pub use crate::strategy::{CachingStrategy, DataAccessError};
