use rusqlite::{Connection, Error, Params, Row};

use crate::model::Modification;
use crate::params::Param;

/// A row type decoded from one fixed query. Every query is scoped to a single
/// experiment, bound as `?1`.
pub trait FromSQL: Sized {
    fn from_row(row: &Row<'_>) -> Result<Self, Error>;

    fn get_sql() -> String;

    fn read_from<I: Params>(connection: &Connection, params: I) -> Result<Vec<Self>, Error> {
        let sql = Self::get_sql();
        let mut stmt = connection.prepare(&sql)?;
        let out: Result<Vec<Self>, Error> = stmt
            .query_map(params, |row: &Row<'_>| Self::from_row(row))?
            .collect();
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SQLExperiment {
    pub accession: String,
}

impl FromSQL for SQLExperiment {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            accession: row.get(0)?,
        })
    }

    fn get_sql() -> String {
        "SELECT accession FROM experiment WHERE accession = ?1".into()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SQLSpectrum {
    pub id: i64,
    /// The spectrum reference peptides use to point at this spectrum
    pub spectrum_ref: String,
    pub ms_level: i64,
}

impl FromSQL for SQLSpectrum {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            id: row.get(0)?,
            spectrum_ref: row.get(1).unwrap_or_default(),
            ms_level: row.get(2).unwrap_or_default(),
        })
    }

    fn get_sql() -> String {
        "SELECT id, spectrum_ref, ms_level FROM spectrum WHERE experiment = ?1 ORDER BY id".into()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SQLPrecursor {
    pub spectrum_id: i64,
    pub charge: Option<i64>,
    pub mz: Option<f64>,
    pub intensity: Option<f64>,
}

impl FromSQL for SQLPrecursor {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            spectrum_id: row.get(0)?,
            charge: row.get(1)?,
            mz: row.get(2)?,
            intensity: row.get(3)?,
        })
    }

    fn get_sql() -> String {
        "SELECT p.spectrum_id, p.charge, p.mz, p.intensity FROM precursor p \
         JOIN spectrum s ON s.id = p.spectrum_id WHERE s.experiment = ?1"
            .into()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SQLIdentification {
    pub id: i64,
    pub accession: String,
    pub accession_version: Option<String>,
    pub search_database: Option<String>,
    pub score: Option<f64>,
    pub threshold: Option<f64>,
}

impl FromSQL for SQLIdentification {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            id: row.get(0)?,
            accession: row.get(1)?,
            accession_version: row.get(2)?,
            search_database: row.get(3)?,
            score: row.get(4)?,
            threshold: row.get(5)?,
        })
    }

    fn get_sql() -> String {
        "SELECT id, accession, accession_version, search_database, score, threshold \
         FROM identification WHERE experiment = ?1 ORDER BY id"
            .into()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SQLPeptide {
    pub id: i64,
    pub identification_id: i64,
    pub sequence: String,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub spectrum_ref: Option<String>,
}

impl FromSQL for SQLPeptide {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            id: row.get(0)?,
            identification_id: row.get(1)?,
            sequence: row.get(2)?,
            start: row.get(3)?,
            end: row.get(4)?,
            spectrum_ref: row.get(5)?,
        })
    }

    fn get_sql() -> String {
        "SELECT p.id, p.identification_id, p.sequence, p.start, p.end, p.spectrum_ref FROM peptide p \
         JOIN identification i ON i.id = p.identification_id WHERE i.experiment = ?1 ORDER BY p.id"
            .into()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SQLModification {
    pub peptide_id: i64,
    pub location: i32,
    pub accession: String,
    pub database: Option<String>,
    pub name: Option<String>,
    pub monoisotopic_mass_delta: Option<f64>,
}

impl FromSQL for SQLModification {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            peptide_id: row.get(0)?,
            location: row.get(1)?,
            accession: row.get(2)?,
            database: row.get(3)?,
            name: row.get(4)?,
            monoisotopic_mass_delta: row.get(5)?,
        })
    }

    fn get_sql() -> String {
        "SELECT m.peptide_id, m.location, m.accession, m.database, m.name, m.mono_delta FROM modification m \
         JOIN peptide p ON p.id = m.peptide_id \
         JOIN identification i ON i.id = p.identification_id \
         WHERE i.experiment = ?1 ORDER BY m.peptide_id, m.location"
            .into()
    }
}

impl From<SQLModification> for Modification {
    fn from(value: SQLModification) -> Self {
        Self {
            location: value.location,
            accession: value.accession,
            database: value.database,
            name: value.name,
            monoisotopic_mass_delta: value.monoisotopic_mass_delta,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SQLFragmentIonCount {
    pub peptide_id: i64,
    pub count: i64,
}

impl FromSQL for SQLFragmentIonCount {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        Ok(Self {
            peptide_id: row.get(0)?,
            count: row.get(1)?,
        })
    }

    fn get_sql() -> String {
        "SELECT f.peptide_id, COUNT(*) FROM fragment_ion f \
         JOIN peptide p ON p.id = f.peptide_id \
         JOIN identification i ON i.id = p.identification_id \
         WHERE i.experiment = ?1 GROUP BY f.peptide_id"
            .into()
    }
}

/// Which entity a [`SQLParam`] row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamParent {
    Experiment,
    Spectrum,
    Protein,
    Peptide,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SQLParam {
    pub parent: Option<ParamParent>,
    pub parent_id: String,
    pub accession: Option<String>,
    pub name: String,
    pub value: Option<String>,
}

impl SQLParam {
    pub fn to_param(&self) -> Param {
        let param = match self.accession.as_deref() {
            Some(curie) if !curie.is_empty() => Param::from_curie(curie, self.name.as_str()),
            _ => Param::new_key_value(self.name.as_str(), ""),
        };
        match self.value.as_deref() {
            Some(value) => param.with_value(value),
            None => param,
        }
    }
}

impl FromSQL for SQLParam {
    fn from_row(row: &Row<'_>) -> Result<Self, Error> {
        let kind: String = row.get(0)?;
        let parent = match kind.as_str() {
            "experiment" => Some(ParamParent::Experiment),
            "spectrum" => Some(ParamParent::Spectrum),
            "protein" | "identification" => Some(ParamParent::Protein),
            "peptide" => Some(ParamParent::Peptide),
            _ => None,
        };
        Ok(Self {
            parent,
            parent_id: row.get(1)?,
            accession: row.get(2)?,
            name: row.get(3)?,
            value: row.get(4)?,
        })
    }

    fn get_sql() -> String {
        "SELECT parent_kind, parent_id, accession, name, value FROM param WHERE experiment = ?1 ORDER BY rowid".into()
    }
}
