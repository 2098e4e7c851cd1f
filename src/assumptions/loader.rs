//! CSV and JSON loaders for mortality tables and projection assumptions
//!
//! Mortality tables live in a data directory as
//! `mortality_table_{label}.csv` with columns
//! `Age, MaleMortality_qx, FemaleMortality_qx`.

use super::{MortalityRow, MortalityTable, ProjectionAssumptions};
use crate::error::{ProjectionError, Result};
use csv::{ReaderBuilder, Trim};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default path to the data directory
pub const DEFAULT_DATA_PATH: &str = "data";

const TABLE: &str = "mortality";

const AGE_COLUMN: &str = "Age";
const MALE_COLUMN: &str = "MaleMortality_qx";
const FEMALE_COLUMN: &str = "FemaleMortality_qx";

/// Named mortality tables shipped alongside the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MortalityTableId {
    /// South African annuitant tables (SAIFL98 female / SAIML98 male)
    #[serde(rename = "SAIFL98_SAIML98")]
    Saifl98Saiml98,
    /// User-supplied rates
    #[serde(rename = "CUSTOM")]
    Custom,
    /// SA 85-90 light (lower mortality)
    #[serde(rename = "SA8590_light")]
    Sa8590Light,
    /// SA 85-90 heavy (higher mortality)
    #[serde(rename = "SA8590_heavy")]
    Sa8590Heavy,
}

impl MortalityTableId {
    pub const ALL: [MortalityTableId; 4] = [
        MortalityTableId::Saifl98Saiml98,
        MortalityTableId::Custom,
        MortalityTableId::Sa8590Light,
        MortalityTableId::Sa8590Heavy,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MortalityTableId::Saifl98Saiml98 => "SAIFL98_SAIML98",
            MortalityTableId::Custom => "CUSTOM",
            MortalityTableId::Sa8590Light => "SA8590_light",
            MortalityTableId::Sa8590Heavy => "SA8590_heavy",
        }
    }

    pub fn file_name(&self) -> String {
        format!("mortality_table_{}.csv", self.label())
    }

    /// Location of this table inside a data directory
    pub fn path_in(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.file_name())
    }
}

impl Default for MortalityTableId {
    fn default() -> Self {
        MortalityTableId::Saifl98Saiml98
    }
}

impl FromStr for MortalityTableId {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self> {
        MortalityTableId::ALL
            .into_iter()
            .find(|id| id.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProjectionError::invalid(format!("unknown mortality table {:?}", s)))
    }
}

impl fmt::Display for MortalityTableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Load a mortality table from a CSV file
pub fn load_mortality_table<P: AsRef<Path>>(path: P) -> Result<MortalityTable> {
    let file = File::open(path.as_ref())?;
    let table = load_mortality_table_from_reader(file)?;
    info!(
        "Loaded mortality table {} ({} rows, ages {}-{})",
        path.as_ref().display(),
        table.rows().len(),
        table.min_age(),
        table.max_age()
    );
    Ok(table)
}

/// Load a named mortality table from a data directory
pub fn load_named_mortality_table(data_dir: &Path, id: MortalityTableId) -> Result<MortalityTable> {
    load_mortality_table(id.path_in(data_dir))
}

/// Load a mortality table from any reader
///
/// Columns are located by header name, so extra columns and any column
/// order are accepted.
pub fn load_mortality_table_from_reader<R: std::io::Read>(reader: R) -> Result<MortalityTable> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ProjectionError::shape(TABLE, format!("missing column {}", name)))
    };
    let age_idx = column(AGE_COLUMN)?;
    let male_idx = column(MALE_COLUMN)?;
    let female_idx = column(FEMALE_COLUMN)?;

    let mut rows = Vec::new();
    for (idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| ProjectionError::shape(TABLE, e.to_string()))?;
        let line = idx + 2;
        let cell = |i: usize| record.get(i).unwrap_or("");

        let age = parse_age(cell(age_idx), line)?;
        let male_rate = parse_rate(cell(male_idx), line, MALE_COLUMN)?;
        let female_rate = parse_rate(cell(female_idx), line, FEMALE_COLUMN)?;
        rows.push(MortalityRow::new(age, male_rate, female_rate));
    }

    MortalityTable::from_rows(rows)
}

fn parse_age(cell: &str, line: usize) -> Result<u32> {
    if let Ok(age) = cell.parse::<u32>() {
        return Ok(age);
    }
    match cell.parse::<f64>() {
        Ok(age) if age >= 0.0 && age.fract() == 0.0 && age <= u32::MAX as f64 => Ok(age as u32),
        _ => Err(ProjectionError::shape(TABLE, format!("row {}: invalid Age {:?}", line, cell))),
    }
}

fn parse_rate(cell: &str, line: usize, column: &str) -> Result<f64> {
    cell.parse::<f64>()
        .map_err(|_| ProjectionError::shape(TABLE, format!("row {}: invalid {} {:?}", line, column, cell)))
}

/// Load projection assumptions from a JSON file
///
/// Missing fields take their defaults; the result is validated.
pub fn load_assumptions<P: AsRef<Path>>(path: P) -> Result<ProjectionAssumptions> {
    let file = File::open(path.as_ref())?;
    let assumptions: ProjectionAssumptions = serde_json::from_reader(file)?;
    assumptions.validate()?;
    info!("Loaded assumptions from {}", path.as_ref().display());
    Ok(assumptions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::Gender;

    #[test]
    fn test_load_mortality_table() {
        let csv = "\
Age,MaleMortality_qx,FemaleMortality_qx
70,0.02,0.01
71,0.025,0.012
72,1.0,1.0
";
        let table = load_mortality_table_from_reader(csv.as_bytes()).expect("Failed to load table");
        assert_eq!(table.rows().len(), 3);
        assert_eq!(table.min_age(), 70);
        assert_eq!(table.max_age(), 72);
        assert_eq!(table.rows()[1].rate(Gender::Male), 0.025);
        assert_eq!(table.rows()[1].rate(Gender::Female), 0.012);
    }

    #[test]
    fn test_columns_located_by_name() {
        let csv = "FemaleMortality_qx,Notes,Age,MaleMortality_qx\n0.01,x,60,0.02\n";
        let table = load_mortality_table_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.rows()[0], MortalityRow::new(60, 0.02, 0.01));
    }

    #[test]
    fn test_missing_column() {
        let csv = "Age,MaleMortality_qx\n60,0.02\n";
        let err = load_mortality_table_from_reader(csv.as_bytes()).unwrap_err();
        match err {
            ProjectionError::DataShape { reason, .. } => assert!(reason.contains(FEMALE_COLUMN)),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_monotonic_ages() {
        let csv = "Age,MaleMortality_qx,FemaleMortality_qx\n61,0.02,0.01\n60,0.02,0.01\n";
        let err = load_mortality_table_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ProjectionError::DataShape { .. }));
    }

    #[test]
    fn test_ragged_row() {
        let csv = "Age,MaleMortality_qx,FemaleMortality_qx\n60,0.02,0.01\n61,0.03\n";
        let err = load_mortality_table_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ProjectionError::DataShape { table: "mortality", .. }));
    }

    #[test]
    fn test_unparsable_rate() {
        let csv = "Age,MaleMortality_qx,FemaleMortality_qx\n60,abc,0.01\n";
        let err = load_mortality_table_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ProjectionError::DataShape { .. }));
    }

    #[test]
    fn test_table_ids() {
        assert_eq!("sa8590_LIGHT".parse::<MortalityTableId>().unwrap(), MortalityTableId::Sa8590Light);
        assert_eq!(MortalityTableId::Custom.file_name(), "mortality_table_CUSTOM.csv");
        assert_eq!(
            MortalityTableId::default().path_in(Path::new("data")),
            Path::new("data").join("mortality_table_SAIFL98_SAIML98.csv")
        );
        assert!("IAM2012".parse::<MortalityTableId>().is_err());
    }
}
