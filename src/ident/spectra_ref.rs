use std::sync::LazyLock;

use regex::Regex;

use super::ResolutionError;

static SPECTRA_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(ms_run\[\d+\]):(\S.*?)\s*$").unwrap());

/// One entry of an mzTab `spectra_ref` column, `ms_run[N]:reference`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpectraRef {
    pub ms_run: String,
    pub reference: String,
}

impl SpectraRef {
    pub fn new<M: Into<String>, R: Into<String>>(ms_run: M, reference: R) -> Self {
        Self {
            ms_run: ms_run.into(),
            reference: reference.into(),
        }
    }

    /// Parse a `|` separated `spectra_ref` cell. A PSM matched to a chimeric or
    /// shared spectrum lists more than one reference. `null` and empty cells
    /// yield no references.
    ///
    /// # Errors
    /// [`ResolutionError::MalformedSpectraRef`] on the first entry that does not
    /// have the `ms_run[N]:reference` shape.
    pub fn parse_list(cell: &str) -> Result<Vec<SpectraRef>, ResolutionError> {
        let cell = cell.trim();
        if cell.is_empty() || cell.eq_ignore_ascii_case("null") {
            return Ok(Vec::new());
        }
        cell.split('|')
            .map(|part| {
                SPECTRA_REF
                    .captures(part)
                    .map(|caps| SpectraRef::new(&caps[1], &caps[2]))
                    .ok_or_else(|| ResolutionError::MalformedSpectraRef(part.to_string()))
            })
            .collect()
    }
}
