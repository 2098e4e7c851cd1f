//! Export of projection results as named tables
//!
//! A [`Workbook`] holds one sheet per table: model points, life
//! expectancies, the per-unit summary, and one sheet of monthly workings
//! per unit. Sheets are written as CSV files into a directory; the whole
//! result set can also be written as a single JSON document.

use crate::error::Result;
use crate::portfolio::Unit;
use crate::projection::{PortfolioResults, UnitWorkings};
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const MODEL_POINTS_SHEET: &str = "Model Points";
pub const LIFE_EXPECTANCIES_SHEET: &str = "Life Expectancies";
pub const CASHFLOWS_SHEET: &str = "Cashflows";

/// A named table of string cells
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    fn new(name: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            name: name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Cell by row index and header name
    pub fn cell(&self, row: usize, header: &str) -> Option<&str> {
        let col = self.headers.iter().position(|h| h == header)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

/// The exported document: sheets in display order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Assemble every table for a portfolio and its results
    pub fn build(units: &[Unit], results: &PortfolioResults) -> Self {
        let mut sheets = vec![
            model_points_sheet(units),
            life_expectancies_sheet(results),
            cashflows_sheet(results),
        ];
        sheets.extend(results.all_workings().iter().map(workings_sheet));
        Self { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Write each sheet as `<name>.csv` into a directory
    pub fn write_csv_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;

        let mut written = Vec::with_capacity(self.sheets.len());
        for sheet in &self.sheets {
            let path = dir.join(format!("{}.csv", file_stem(&sheet.name)));
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(&sheet.headers)?;
            for row in &sheet.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
            written.push(path);
        }

        info!("Wrote {} sheets to {}", written.len(), dir.display());
        Ok(written)
    }
}

/// Replace characters that are unsafe in file names
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_') { c } else { '_' })
        .collect()
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn model_points_sheet(units: &[Unit]) -> Sheet {
    let mut sheet = Sheet::new(
        MODEL_POINTS_SHEET,
        &["ID", "Main Member Age", "Main Member Gender", "Spouse Age", "Spouse Gender"],
    );
    for unit in units {
        sheet.rows.push(vec![
            unit.id.clone(),
            unit.main_age.to_string(),
            unit.main_gender.to_string(),
            opt(unit.spouse_age),
            opt(unit.spouse_gender),
        ]);
    }
    sheet
}

fn life_expectancies_sheet(results: &PortfolioResults) -> Sheet {
    let mut sheet = Sheet::new(LIFE_EXPECTANCIES_SHEET, &["Age", "Male", "Female"]);
    for row in &results.life_expectancies {
        sheet.rows.push(vec![row.age.to_string(), row.male_display(), row.female_display()]);
    }
    sheet
}

fn cashflows_sheet(results: &PortfolioResults) -> Sheet {
    let mut sheet = Sheet::new(
        CASHFLOWS_SHEET,
        &[
            "ID",
            "Last Life Expectancy",
            "NPV",
            "Purchase NPV",
            "Refund NPV",
            "Fee NPV",
            "Expense NPV",
            "Main Member Age",
            "Main Member Gender",
            "Spouse Age",
            "Spouse Gender",
            "Main Life Expectancy",
            "Spouse Life Expectancy",
        ],
    );
    for row in &results.summary {
        sheet.rows.push(vec![
            row.unit_id.clone(),
            row.last_life_expectancy.clone(),
            row.npv.total.to_string(),
            row.npv.sale.to_string(),
            row.npv.refund.to_string(),
            row.npv.fee.to_string(),
            row.npv.expense.to_string(),
            row.main_age.to_string(),
            row.main_gender.to_string(),
            opt(row.spouse_age),
            opt(row.spouse_gender),
            row.main_life_expectancy.clone(),
            row.spouse_life_expectancy.clone().unwrap_or_default(),
        ]);
    }
    sheet
}

/// Monthly workings; the NPV columns are filled on the month-0 row only
fn workings_sheet(workings: &UnitWorkings) -> Sheet {
    let mut sheet = Sheet::new(
        workings.unit_id.clone(),
        &[
            "Month",
            "Investment Return Factors",
            "Discount Factors",
            "Count",
            "Expected Sale Cashflows",
            "Expected Fee Cashflows",
            "Expected Expense Cashflows",
            "Expected Refund Cashflows",
            "All Expected Cashflows",
            "Discounted Sale Cashflows",
            "Discounted Fee Cashflows",
            "Discounted Expense Cashflows",
            "Discounted Refund Cashflows",
            "All Discounted Cashflows",
            "Sale NPV",
            "Fee NPV",
            "Expense NPV",
            "Refund NPV",
            "NPV",
        ],
    );

    for row in workings.rows() {
        let npv = if row.month == 0 {
            let n = &workings.npv;
            [n.sale, n.fee, n.expense, n.refund, n.total].map(|v| v.to_string())
        } else {
            Default::default()
        };

        let mut cells = vec![
            row.month.to_string(),
            row.investment_return_factor.to_string(),
            row.discount_factor.to_string(),
            opt(row.cycle_count),
            row.sale.to_string(),
            row.fee.to_string(),
            row.expense.to_string(),
            row.refund.to_string(),
            row.total.to_string(),
            row.discounted_sale.to_string(),
            row.discounted_fee.to_string(),
            row.discounted_expense.to_string(),
            row.discounted_refund.to_string(),
            row.discounted_total.to_string(),
        ];
        cells.extend(npv);
        sheet.rows.push(cells);
    }
    sheet
}

/// JSON export envelope
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub generated_at: DateTime<Utc>,
    pub model_points: &'a [Unit],
    pub results: &'a PortfolioResults,
}

/// Write the model points and full results as one JSON document
pub fn write_json(path: &Path, units: &[Unit], results: &PortfolioResults) -> Result<()> {
    let document = ExportDocument {
        generated_at: Utc::now(),
        model_points: units,
        results,
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &document)?;
    info!("Wrote JSON results to {}", path.display());
    Ok(())
}
