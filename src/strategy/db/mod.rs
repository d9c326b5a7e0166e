//! Population from a relational store holding many experiments.
//!
//! [`DbCachingStrategy`] runs a fixed sequence of queries for one experiment
//! accession. Every query writes into a staging [`CacheStore`] first, and the
//! staged categories are committed to the live store only once the whole
//! sequence has succeeded. A failing query leaves the live store untouched.
//!
//! The queries expect this SQLite schema:
//!
//! ```sql
//! CREATE TABLE experiment (accession TEXT PRIMARY KEY);
//! CREATE TABLE spectrum (id INTEGER PRIMARY KEY, experiment TEXT, spectrum_ref TEXT, ms_level INTEGER);
//! CREATE TABLE precursor (spectrum_id INTEGER, charge INTEGER, mz REAL, intensity REAL);
//! CREATE TABLE identification (id INTEGER PRIMARY KEY, experiment TEXT, accession TEXT,
//!                              accession_version TEXT, search_database TEXT, score REAL, threshold REAL);
//! CREATE TABLE peptide (id INTEGER PRIMARY KEY, identification_id INTEGER, sequence TEXT,
//!                       start INTEGER, end INTEGER, spectrum_ref TEXT);
//! CREATE TABLE modification (peptide_id INTEGER, location INTEGER, accession TEXT, database TEXT,
//!                            name TEXT, mono_delta REAL);
//! CREATE TABLE fragment_ion (peptide_id INTEGER, mz REAL, intensity REAL, ion_type TEXT);
//! CREATE TABLE param (experiment TEXT, parent_kind TEXT, parent_id TEXT, accession TEXT,
//!                     name TEXT, value TEXT);
//! ```
//!
//! `param.parent_kind` is one of `experiment`, `spectrum`, `protein` or `peptide`.
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;

use identity_hash::BuildIdentityHasher;
use indexmap::IndexMap;
use log::{debug, warn};
use parking_lot::ReentrantMutex;
use rusqlite::Connection;

use crate::cache::{CacheEntry, CacheStore, CacheValue};
use crate::ident::SpectrumReference;
use crate::model::Modification;
use crate::params::ParamList;

use super::{CachingStrategy, DataAccessError};

mod sql;

pub use sql::{
    FromSQL, ParamParent, SQLExperiment, SQLFragmentIonCount, SQLIdentification, SQLModification,
    SQLParam, SQLPeptide, SQLPrecursor, SQLSpectrum,
};

/// The categories a DB population pass owns
pub const DB_CATEGORIES: &[CacheEntry] = &[
    CacheEntry::SpectrumId,
    CacheEntry::SpectrumLevel,
    CacheEntry::PrecursorCharge,
    CacheEntry::PrecursorMz,
    CacheEntry::PrecursorIntensity,
    CacheEntry::ProteinId,
    CacheEntry::ProteinAccession,
    CacheEntry::ProteinAccessionVersion,
    CacheEntry::ProteinSearchDatabase,
    CacheEntry::ProteinScore,
    CacheEntry::ProteinThreshold,
    CacheEntry::ProteinToPeptide,
    CacheEntry::PeptideStart,
    CacheEntry::PeptideEnd,
    CacheEntry::PeptideSequence,
    CacheEntry::PeptideToSpectrum,
    CacheEntry::PeptideToModification,
    CacheEntry::NumberOfFragmentIons,
    CacheEntry::UnresolvedSpectrumReference,
    CacheEntry::ExperimentParam,
    CacheEntry::SpectrumToParam,
    CacheEntry::ProteinToParam,
    CacheEntry::PeptideToParam,
];

/// Hands out a database connection for the duration of a closure
pub trait ConnectionProvider {
    fn with_connection<T, F>(&self, f: F) -> Result<T, DataAccessError>
    where
        F: FnOnce(&Connection) -> Result<T, DataAccessError>;
}

impl<P: ConnectionProvider> ConnectionProvider for &P {
    fn with_connection<T, F>(&self, f: F) -> Result<T, DataAccessError>
    where
        F: FnOnce(&Connection) -> Result<T, DataAccessError>,
    {
        (*self).with_connection(f)
    }
}

/// A single SQLite connection with an explicit lifecycle. Once [`close`](Self::close)d,
/// every use fails with [`DataAccessError::ConnectionClosed`].
#[derive(Debug)]
pub struct SqliteConnectionProvider {
    connection: ReentrantMutex<RefCell<Option<Connection>>>,
}

impl SqliteConnectionProvider {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DataAccessError> {
        debug!("Opening {}", path.as_ref().display());
        Ok(Self::from_connection(Connection::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, DataAccessError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection: ReentrantMutex::new(RefCell::new(Some(connection))),
        }
    }

    pub fn is_open(&self) -> bool {
        self.connection.lock().borrow().is_some()
    }

    /// Close the connection. Closing twice is a no-op. Must not be called from
    /// inside [`ConnectionProvider::with_connection`].
    pub fn close(&self) -> Result<(), DataAccessError> {
        let guard = self.connection.lock();
        let taken = guard.borrow_mut().take();
        if let Some(connection) = taken {
            connection.close().map_err(|(_, err)| err)?;
            debug!("Closed database connection");
        }
        Ok(())
    }
}

impl ConnectionProvider for SqliteConnectionProvider {
    fn with_connection<T, F>(&self, f: F) -> Result<T, DataAccessError>
    where
        F: FnOnce(&Connection) -> Result<T, DataAccessError>,
    {
        let guard = self.connection.lock();
        let slot = guard.borrow();
        match slot.as_ref() {
            Some(connection) => f(connection),
            None => Err(DataAccessError::ConnectionClosed),
        }
    }
}

/// The accession of the experiment to load, the "reader" of a [`DbCachingStrategy`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExperimentAccession(pub String);

impl ExperimentAccession {
    pub fn new<S: Into<String>>(accession: S) -> Self {
        Self(accession.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ExperimentAccession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExperimentAccession {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

type SpectrumRefTable = HashMap<String, i64>;

/// Loads one experiment from the database behind `P`, all or nothing
#[derive(Debug)]
pub struct DbCachingStrategy<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> DbCachingStrategy<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn into_provider(self) -> P {
        self.provider
    }

    fn cache_spectra(
        &self,
        connection: &Connection,
        accession: &str,
        staging: &CacheStore,
    ) -> Result<SpectrumRefTable, DataAccessError> {
        let spectra = SQLSpectrum::read_from(connection, [accession])?;
        debug!("{accession}: {} spectra", spectra.len());
        let mut refs = SpectrumRefTable::with_capacity(spectra.len());
        staging.put_all_keys(CacheEntry::SpectrumId, spectra.iter().map(|s| s.id.to_string()))?;
        staging.put_all(
            CacheEntry::SpectrumLevel,
            spectra.iter().map(|s| (s.id.to_string(), s.ms_level)),
        )?;
        for spectrum in spectra {
            if !spectrum.spectrum_ref.is_empty() {
                refs.insert(spectrum.spectrum_ref, spectrum.id);
            }
        }

        let precursors = SQLPrecursor::read_from(connection, [accession])?;
        for precursor in precursors {
            let key = precursor.spectrum_id.to_string();
            if let Some(charge) = precursor.charge {
                staging.put(CacheEntry::PrecursorCharge, key.as_str(), charge)?;
            }
            if let Some(mz) = precursor.mz {
                staging.put(CacheEntry::PrecursorMz, key.as_str(), mz)?;
            }
            if let Some(intensity) = precursor.intensity {
                staging.put(CacheEntry::PrecursorIntensity, key, intensity)?;
            }
        }
        Ok(refs)
    }

    fn cache_identifications(
        &self,
        connection: &Connection,
        accession: &str,
        staging: &CacheStore,
    ) -> Result<(), DataAccessError> {
        let identifications = SQLIdentification::read_from(connection, [accession])?;
        debug!("{accession}: {} identifications", identifications.len());
        staging.put_all_keys(
            CacheEntry::ProteinId,
            identifications.iter().map(|i| i.id.to_string()),
        )?;
        for ident in identifications {
            let key = ident.id.to_string();
            staging.put(CacheEntry::ProteinAccession, key.as_str(), ident.accession)?;
            if let Some(version) = ident.accession_version {
                staging.put(CacheEntry::ProteinAccessionVersion, key.as_str(), version)?;
            }
            if let Some(database) = ident.search_database {
                staging.put(CacheEntry::ProteinSearchDatabase, key.as_str(), database)?;
            }
            if let Some(score) = ident.score {
                staging.put(CacheEntry::ProteinScore, key.as_str(), score)?;
            }
            if let Some(threshold) = ident.threshold {
                staging.put(CacheEntry::ProteinThreshold, key, threshold)?;
            }
        }
        Ok(())
    }

    fn cache_peptides(
        &self,
        connection: &Connection,
        accession: &str,
        spectrum_refs: &SpectrumRefTable,
        staging: &CacheStore,
    ) -> Result<(), DataAccessError> {
        let peptides = SQLPeptide::read_from(connection, [accession])?;
        debug!("{accession}: {} peptides", peptides.len());

        let mut protein_peptides: HashMap<i64, Vec<String>, BuildIdentityHasher<i64>> = HashMap::default();
        let mut unresolved = Vec::new();
        for peptide in peptides {
            let key = peptide.id.to_string();
            protein_peptides
                .entry(peptide.identification_id)
                .or_default()
                .push(key.clone());
            staging.put(CacheEntry::PeptideSequence, key.as_str(), peptide.sequence)?;
            if let Some(start) = peptide.start {
                staging.put(CacheEntry::PeptideStart, key.as_str(), start)?;
            }
            if let Some(end) = peptide.end {
                staging.put(CacheEntry::PeptideEnd, key.as_str(), end)?;
            }
            if let Some(spectrum_ref) = peptide.spectrum_ref.filter(|r| !r.is_empty()) {
                match spectrum_refs.get(&spectrum_ref) {
                    Some(spectrum_id) => staging.put(
                        CacheEntry::PeptideToSpectrum,
                        key,
                        SpectrumReference::new(spectrum_id.to_string(), accession),
                    )?,
                    None => {
                        warn!("Peptide {key} references unknown spectrum {spectrum_ref}");
                        unresolved.push(key);
                    }
                }
            }
        }
        staging.put_all(
            CacheEntry::ProteinToPeptide,
            protein_peptides
                .into_iter()
                .map(|(protein, peptides)| (protein.to_string(), peptides)),
        )?;
        staging.put_all_keys(CacheEntry::UnresolvedSpectrumReference, unresolved)?;
        Ok(())
    }

    fn cache_modifications(
        &self,
        connection: &Connection,
        accession: &str,
        staging: &CacheStore,
    ) -> Result<(), DataAccessError> {
        let mut modifications: IndexMap<String, Vec<Modification>> = IndexMap::new();
        for row in SQLModification::read_from(connection, [accession])? {
            modifications
                .entry(row.peptide_id.to_string())
                .or_default()
                .push(row.into());
        }
        staging.put_all(
            CacheEntry::PeptideToModification,
            modifications
                .into_iter()
                .map(|(peptide, mods)| (peptide, CacheValue::Modifications(mods))),
        )?;

        let counts = SQLFragmentIonCount::read_from(connection, [accession])?;
        staging.put_all(
            CacheEntry::NumberOfFragmentIons,
            counts.into_iter().map(|c| (c.peptide_id.to_string(), c.count)),
        )?;
        Ok(())
    }

    fn cache_params(
        &self,
        connection: &Connection,
        accession: &str,
        staging: &CacheStore,
    ) -> Result<(), DataAccessError> {
        let mut groups: IndexMap<(ParamParent, String), ParamList> = IndexMap::new();
        for row in SQLParam::read_from(connection, [accession])? {
            let Some(parent) = row.parent else {
                warn!("Skipping parameter {} of unknown parent kind", row.name);
                continue;
            };
            let parent_id = match parent {
                ParamParent::Experiment => accession.to_string(),
                _ => row.parent_id.clone(),
            };
            groups.entry((parent, parent_id)).or_default().push(row.to_param());
        }
        for ((parent, id), params) in groups {
            let entry = match parent {
                ParamParent::Experiment => CacheEntry::ExperimentParam,
                ParamParent::Spectrum => CacheEntry::SpectrumToParam,
                ParamParent::Protein => CacheEntry::ProteinToParam,
                ParamParent::Peptide => CacheEntry::PeptideToParam,
            };
            staging.put(entry, id, CacheValue::Params(params))?;
        }
        Ok(())
    }

    fn populate_staging(
        &self,
        connection: &Connection,
        accession: &str,
        staging: &CacheStore,
    ) -> Result<(), DataAccessError> {
        if SQLExperiment::read_from(connection, [accession])?.is_empty() {
            return Err(DataAccessError::UnknownExperiment(accession.to_string()));
        }
        let mut spectrum_refs = self.cache_spectra(connection, accession, staging)?;
        self.cache_identifications(connection, accession, staging)?;
        self.cache_peptides(connection, accession, &spectrum_refs, staging)?;
        spectrum_refs.clear();
        self.cache_modifications(connection, accession, staging)?;
        self.cache_params(connection, accession, staging)?;
        Ok(())
    }
}

impl<P: ConnectionProvider> CachingStrategy<ExperimentAccession> for DbCachingStrategy<P> {
    fn populate(&self, experiment: &ExperimentAccession, store: &CacheStore) -> Result<(), DataAccessError> {
        let staging = CacheStore::new();
        self.provider
            .with_connection(|connection| self.populate_staging(connection, experiment.as_str(), &staging))?;

        debug!("{experiment}: committing {} categories", staging.entries().len());
        for entry in DB_CATEGORIES {
            store.clear(*entry);
        }
        store.replace_from(staging);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cache::CacheKey;

    const SCHEMA: &str = "
        CREATE TABLE experiment (accession TEXT PRIMARY KEY);
        CREATE TABLE spectrum (id INTEGER PRIMARY KEY, experiment TEXT, spectrum_ref TEXT, ms_level INTEGER);
        CREATE TABLE precursor (spectrum_id INTEGER, charge INTEGER, mz REAL, intensity REAL);
        CREATE TABLE identification (id INTEGER PRIMARY KEY, experiment TEXT, accession TEXT,
                                     accession_version TEXT, search_database TEXT, score REAL, threshold REAL);
        CREATE TABLE peptide (id INTEGER PRIMARY KEY, identification_id INTEGER, sequence TEXT,
                              start INTEGER, end INTEGER, spectrum_ref TEXT);
        CREATE TABLE modification (peptide_id INTEGER, location INTEGER, accession TEXT, database TEXT,
                                   name TEXT, mono_delta REAL);
        CREATE TABLE fragment_ion (peptide_id INTEGER, mz REAL, intensity REAL, ion_type TEXT);
        CREATE TABLE param (experiment TEXT, parent_kind TEXT, parent_id TEXT, accession TEXT,
                            name TEXT, value TEXT);
    ";

    const DATA: &str = "
        INSERT INTO experiment VALUES ('EXP1'), ('EXP2');
        INSERT INTO spectrum VALUES (1, 'EXP1', 'spec_a', 1), (2, 'EXP1', 'spec_b', 2), (3, 'EXP2', 'spec_c', 2);
        INSERT INTO precursor VALUES (2, 2, 523.77, 1200.5);
        INSERT INTO identification VALUES (10, 'EXP1', 'P02768', 'P02768.2', 'UniProt', 87.5, 20.0),
                                          (11, 'EXP2', 'Q00000', NULL, NULL, NULL, NULL);
        INSERT INTO peptide VALUES (100, 10, 'PEPTIDEK', 5, 12, 'spec_b'), (101, 10, 'LVNELTEFAK', 66, 75, 'spec_z');
        INSERT INTO modification VALUES (100, 3, 'UNIMOD:35', 'UNIMOD', 'Oxidation', 15.9949);
        INSERT INTO fragment_ion VALUES (100, 175.1, 10.0, 'y'), (100, 276.2, 20.0, 'y'), (101, 147.1, 5.0, 'y');
        INSERT INTO param VALUES ('EXP1', 'experiment', '', 'MS:1000031', 'instrument model', 'LTQ'),
                                 ('EXP1', 'peptide', '100', NULL, 'note', 'checked');
    ";

    fn provider() -> SqliteConnectionProvider {
        let provider = SqliteConnectionProvider::open_in_memory().unwrap();
        provider
            .with_connection(|conn| {
                conn.execute_batch(SCHEMA)?;
                conn.execute_batch(DATA)?;
                Ok(())
            })
            .unwrap();
        provider
    }

    #[test_log::test]
    fn test_populate_experiment() {
        let strategy = DbCachingStrategy::new(provider());
        let store = CacheStore::new();
        strategy.populate(&ExperimentAccession::new("EXP1"), &store).unwrap();

        assert_eq!(
            store.get_collection(CacheEntry::SpectrumId),
            Some(vec![CacheKey::from("1"), CacheKey::from("2")])
        );
        assert_eq!(
            store.get(CacheEntry::SpectrumLevel, "2").and_then(|v| v.as_integer()),
            Some(2)
        );
        assert_eq!(
            store.get(CacheEntry::PrecursorCharge, "2").and_then(|v| v.as_integer()),
            Some(2)
        );
        assert_eq!(
            store.get(CacheEntry::ProteinAccession, "10").and_then(CacheValue::into_text),
            Some("P02768".to_string())
        );
        assert_eq!(
            store.get(CacheEntry::ProteinScore, "10").and_then(|v| v.as_float()),
            Some(87.5)
        );
        assert_eq!(
            store.get(CacheEntry::ProteinToPeptide, "10").and_then(CacheValue::into_ids),
            Some(vec!["100".to_string(), "101".to_string()])
        );
        assert_eq!(
            store
                .get(CacheEntry::PeptideToSpectrum, "100")
                .and_then(CacheValue::into_spectrum_reference),
            Some(SpectrumReference::new("2", "EXP1"))
        );
        assert_eq!(
            store.get_collection(CacheEntry::UnresolvedSpectrumReference),
            Some(vec![CacheKey::from("101")])
        );
        let mods = store
            .get(CacheEntry::PeptideToModification, "100")
            .and_then(CacheValue::into_modifications)
            .unwrap();
        assert_eq!(mods[0].location, 3);
        assert_eq!(mods[0].name.as_deref(), Some("Oxidation"));
        assert_eq!(
            store.get(CacheEntry::NumberOfFragmentIons, "100").and_then(|v| v.as_integer()),
            Some(2)
        );
        let params = store
            .get(CacheEntry::ExperimentParam, "EXP1")
            .and_then(CacheValue::into_params)
            .unwrap();
        assert_eq!(params[0].value, "LTQ");
        assert!(store.contains_key(CacheEntry::PeptideToParam, "100"));
    }

    #[test_log::test]
    fn test_failed_query_commits_nothing() {
        let provider = provider();
        provider
            .with_connection(|conn| {
                conn.execute_batch("DROP TABLE modification")?;
                Ok(())
            })
            .unwrap();
        let strategy = DbCachingStrategy::new(&provider);
        let store = CacheStore::new();
        store.put_key(CacheEntry::SpectrumId, "previous").unwrap();

        let err = strategy
            .populate(&ExperimentAccession::new("EXP1"), &store)
            .unwrap_err();
        assert!(matches!(err, DataAccessError::Query(_)));
        assert_eq!(
            store.get_collection(CacheEntry::SpectrumId),
            Some(vec![CacheKey::from("previous")])
        );
        assert!(!store.contains(CacheEntry::ProteinId));
    }

    #[test_log::test]
    fn test_unknown_experiment() {
        let strategy = DbCachingStrategy::new(provider());
        let store = CacheStore::new();
        let err = strategy.populate(&ExperimentAccession::from("EXP9"), &store).unwrap_err();
        assert!(matches!(err, DataAccessError::UnknownExperiment(_)));
        assert!(store.entries().is_empty());
    }

    #[test_log::test]
    fn test_repopulate_replaces_previous_experiment() {
        let strategy = DbCachingStrategy::new(provider());
        let store = CacheStore::new();
        strategy.populate(&ExperimentAccession::new("EXP1"), &store).unwrap();
        strategy.populate(&ExperimentAccession::new("EXP2"), &store).unwrap();

        assert_eq!(
            store.get_collection(CacheEntry::SpectrumId),
            Some(vec![CacheKey::from("3")])
        );
        assert!(!store.contains(CacheEntry::PeptideToSpectrum));
        assert!(!store.contains(CacheEntry::ExperimentParam));
    }

    #[test_log::test]
    fn test_closed_connection() {
        let provider = provider();
        provider.close().unwrap();
        assert!(!provider.is_open());
        provider.close().unwrap();
        let strategy = DbCachingStrategy::new(provider);
        let err = strategy
            .populate(&ExperimentAccession::new("EXP1"), &CacheStore::new())
            .unwrap_err();
        assert!(matches!(err, DataAccessError::ConnectionClosed));
    }

    #[test_log::test]
    fn test_on_disk_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiments.sqlite");
        {
            let provider = SqliteConnectionProvider::open(&path).unwrap();
            provider
                .with_connection(|conn| {
                    conn.execute_batch(SCHEMA)?;
                    conn.execute_batch(DATA)?;
                    Ok(())
                })
                .unwrap();
            provider.close().unwrap();
        }
        let strategy = DbCachingStrategy::new(SqliteConnectionProvider::open(&path).unwrap());
        let store = CacheStore::new();
        strategy.populate(&ExperimentAccession::new("EXP2"), &store).unwrap();
        assert_eq!(
            store.get_collection(CacheEntry::ProteinId),
            Some(vec![CacheKey::from("11")])
        );
    }
}
