//! Load resident units from a portfolio CSV
//!
//! Expected columns: `ID, Main Member Age, Main Member Gender, Spouse Age,
//! Spouse Gender`. Spouse cells may be blank or `NA` for single residents.

use super::{Gender, Unit};
use crate::error::{ProjectionError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::info;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

const TABLE: &str = "portfolio";

const REQUIRED_COLUMNS: [&str; 5] = [
    "ID",
    "Main Member Age",
    "Main Member Gender",
    "Spouse Age",
    "Spouse Gender",
];

/// Raw CSV row matching the portfolio columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Main Member Age")]
    main_age: String,
    #[serde(rename = "Main Member Gender")]
    main_gender: String,
    #[serde(rename = "Spouse Age", default)]
    spouse_age: Option<String>,
    #[serde(rename = "Spouse Gender", default)]
    spouse_gender: Option<String>,
}

impl CsvRow {
    fn to_unit(self, line: usize) -> Result<Unit> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(ProjectionError::shape(TABLE, format!("row {}: empty ID", line)));
        }

        let main_age = parse_age(&self.main_age, line, "Main Member Age")?
            .ok_or_else(|| ProjectionError::shape(TABLE, format!("row {}: missing Main Member Age", line)))?;
        let main_gender: Gender = self.main_gender.parse()?;

        let spouse_age = match self.spouse_age.as_deref() {
            Some(cell) => parse_age(cell, line, "Spouse Age")?,
            None => None,
        };
        let spouse_gender = match self.spouse_gender.as_deref().map(str::trim) {
            Some(cell) if !is_blank(cell) => Some(cell.parse()?),
            _ => None,
        };

        Ok(Unit {
            id,
            main_age,
            main_gender,
            spouse_age,
            spouse_gender,
        })
    }
}

fn is_blank(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell.eq_ignore_ascii_case("NA") || cell.eq_ignore_ascii_case("NaN")
}

/// Ages exported from spreadsheets often arrive as `72.0`
fn parse_age(cell: &str, line: usize, column: &str) -> Result<Option<u32>> {
    if is_blank(cell) {
        return Ok(None);
    }
    let cell = cell.trim();
    if let Ok(age) = cell.parse::<u32>() {
        return Ok(Some(age));
    }
    match cell.parse::<f64>() {
        Ok(age) if age >= 0.0 && age.fract() == 0.0 && age <= u32::MAX as f64 => Ok(Some(age as u32)),
        _ => Err(ProjectionError::shape(
            TABLE,
            format!("row {}: {} {:?} is not a whole non-negative age", line, column, cell),
        )),
    }
}

fn check_headers(headers: &StringRecord) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ProjectionError::shape(TABLE, format!("missing columns: {}", missing.join(", "))))
    }
}

/// Load all units from a portfolio CSV file
pub fn load_units<P: AsRef<Path>>(path: P) -> Result<Vec<Unit>> {
    let file = File::open(path.as_ref())?;
    let units = load_units_from_reader(file)?;
    info!("Loaded {} units from {}", units.len(), path.as_ref().display());
    Ok(units)
}

/// Load units from any reader (e.g., string buffer, uploaded file)
pub fn load_units_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<Unit>> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    check_headers(csv_reader.headers()?)?;

    let mut units = Vec::new();
    let mut seen = HashSet::new();

    for (idx, result) in csv_reader.deserialize().enumerate() {
        // header is line 1
        let line = idx + 2;
        let row: CsvRow = result.map_err(|e| ProjectionError::shape(TABLE, e.to_string()))?;
        let unit = row.to_unit(line)?;

        if !seen.insert(unit.id.clone()) {
            return Err(ProjectionError::shape(TABLE, format!("duplicate ID {:?}", unit.id)));
        }
        units.push(unit);
    }

    Ok(units)
}
