//! Portfolio-level projection results

use super::cashflows::{NpvBreakdown, UnitWorkings};
use super::discount::MonthlyFactors;
use crate::assumptions::{MortalityTable, ProjectionAssumptions};
use crate::error::Result;
use crate::portfolio::{Gender, Unit};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Ages shown in the life expectancy table
pub const LIFE_TABLE_AGES: [u32; 7] = [60, 65, 70, 75, 80, 85, 90];

/// Format a duration in months as `"{years} years {months} months"`
pub fn format_years_months(months: u32) -> String {
    format!("{} years {} months", months / 12, months % 12)
}

/// One row of the life expectancy table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifeExpectancyRow {
    pub age: u32,
    pub male_months: u32,
    pub female_months: u32,
}

impl LifeExpectancyRow {
    pub fn male_display(&self) -> String {
        format_years_months(self.male_months)
    }

    pub fn female_display(&self) -> String {
        format_years_months(self.female_months)
    }
}

/// Remaining life expectancy for both genders at the standard ages
pub fn life_expectancy_table(mortality: &MortalityTable, loading_pct: f64) -> Result<Vec<LifeExpectancyRow>> {
    LIFE_TABLE_AGES
        .iter()
        .map(|&age| -> Result<LifeExpectancyRow> {
            Ok(LifeExpectancyRow {
                age,
                male_months: mortality.life_expectancy_months(age, Gender::Male, loading_pct)?,
                female_months: mortality.life_expectancy_months(age, Gender::Female, loading_pct)?,
            })
        })
        .collect()
}

/// Summary of one unit's projection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub unit_id: String,
    pub main_age: u32,
    pub main_gender: Gender,
    /// As recorded on the unit, whether or not the run is double occupancy
    pub spouse_age: Option<u32>,
    pub spouse_gender: Option<Gender>,
    pub main_life_expectancy_months: u32,
    pub spouse_life_expectancy_months: Option<u32>,
    pub last_life_expectancy_months: u32,
    pub main_life_expectancy: String,
    pub spouse_life_expectancy: Option<String>,
    pub last_life_expectancy: String,
    pub npv: NpvBreakdown,
}

impl SummaryRow {
    pub fn new(unit: &Unit, workings: &UnitWorkings) -> Self {
        Self {
            unit_id: unit.id.clone(),
            main_age: unit.main_age,
            main_gender: unit.main_gender,
            spouse_age: unit.spouse_age,
            spouse_gender: unit.spouse_gender,
            main_life_expectancy_months: workings.main_life_expectancy,
            spouse_life_expectancy_months: workings.spouse_life_expectancy,
            last_life_expectancy_months: workings.last_life_expectancy,
            main_life_expectancy: format_years_months(workings.main_life_expectancy),
            spouse_life_expectancy: workings.spouse_life_expectancy.map(format_years_months),
            last_life_expectancy: format_years_months(workings.last_life_expectancy),
            npv: workings.npv,
        }
    }
}

/// Everything produced by one projection run
///
/// Summary rows and workings are in portfolio input order.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioResults {
    pub assumptions: ProjectionAssumptions,
    pub factors: Arc<MonthlyFactors>,
    pub life_expectancies: Vec<LifeExpectancyRow>,
    pub summary: Vec<SummaryRow>,
    workings: Vec<UnitWorkings>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl PortfolioResults {
    pub(crate) fn new(
        assumptions: ProjectionAssumptions,
        factors: Arc<MonthlyFactors>,
        life_expectancies: Vec<LifeExpectancyRow>,
        summary: Vec<SummaryRow>,
        workings: Vec<UnitWorkings>,
    ) -> Self {
        let index = workings
            .iter()
            .enumerate()
            .map(|(i, w)| (w.unit_id.clone(), i))
            .collect();
        Self {
            assumptions,
            factors,
            life_expectancies,
            summary,
            workings,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.summary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
    }

    /// Workings for a unit id
    pub fn workings(&self, unit_id: &str) -> Option<&UnitWorkings> {
        self.index.get(unit_id).map(|&i| &self.workings[i])
    }

    /// All unit workings in input order
    pub fn all_workings(&self) -> &[UnitWorkings] {
        &self.workings
    }

    /// Summary row for a unit id
    pub fn summary_for(&self, unit_id: &str) -> Option<&SummaryRow> {
        self.index.get(unit_id).map(|&i| &self.summary[i])
    }

    /// Portfolio NPV by component
    pub fn totals(&self) -> NpvBreakdown {
        let mut totals = NpvBreakdown::default();
        for row in &self.summary {
            totals += row.npv;
        }
        totals
    }
}
