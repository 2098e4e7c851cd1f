//! Mortality tables and curtate life expectancy
//!
//! A table holds one row per integer age with separate male and female
//! annual mortality rates (q_x). Life expectancy is the curtate
//! approximation: the sum of cumulative survival probabilities over the
//! table rows at or above the query age, scaled by a flat longevity loading
//! and expressed in whole months.

use crate::error::{ProjectionError, Result};
use crate::portfolio::Gender;
use serde::{Deserialize, Serialize};

const TABLE: &str = "mortality";

/// One age row of a mortality table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MortalityRow {
    pub age: u32,
    pub male_rate: f64,
    pub female_rate: f64,
}

impl MortalityRow {
    pub fn new(age: u32, male_rate: f64, female_rate: f64) -> Self {
        Self { age, male_rate, female_rate }
    }

    /// Annual mortality rate for the given gender
    pub fn rate(&self, gender: Gender) -> f64 {
        match gender {
            Gender::Male => self.male_rate,
            Gender::Female => self.female_rate,
        }
    }
}

/// Age-indexed mortality rates by gender
///
/// Ages are strictly increasing; gaps are allowed. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MortalityTable {
    rows: Vec<MortalityRow>,
}

impl MortalityTable {
    /// Build a table, rejecting non-monotonic ages and rates outside [0, 1]
    pub fn from_rows(rows: Vec<MortalityRow>) -> Result<Self> {
        if rows.is_empty() {
            return Err(ProjectionError::shape(TABLE, "table has no rows"));
        }

        for pair in rows.windows(2) {
            if pair[1].age <= pair[0].age {
                return Err(ProjectionError::shape(
                    TABLE,
                    format!("ages must be strictly increasing, found {} after {}", pair[1].age, pair[0].age),
                ));
            }
        }

        for row in &rows {
            for (label, q) in [("male", row.male_rate), ("female", row.female_rate)] {
                if !(0.0..=1.0).contains(&q) {
                    return Err(ProjectionError::shape(
                        TABLE,
                        format!("{} rate {} at age {} is outside [0, 1]", label, q, row.age),
                    ));
                }
            }
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[MortalityRow] {
        &self.rows
    }

    pub fn min_age(&self) -> u32 {
        self.rows[0].age
    }

    pub fn max_age(&self) -> u32 {
        self.rows[self.rows.len() - 1].age
    }

    /// Rows at or above the given age, in ascending age order
    fn rows_from(&self, age: u32) -> &[MortalityRow] {
        let start = self.rows.partition_point(|row| row.age < age);
        &self.rows[start..]
    }

    /// Unloaded curtate life expectancy in years
    ///
    /// Row k contributes the probability of surviving every row 0..=k, so the
    /// first row already carries its own survival probability.
    pub fn curtate_expectancy_years(&self, age: u32, gender: Gender) -> f64 {
        let mut survival = 1.0;
        let mut total = 0.0;
        for row in self.rows_from(age) {
            survival *= 1.0 - row.rate(gender);
            total += survival;
        }
        total
    }

    /// Life expectancy in whole months with a longevity loading applied
    ///
    /// # Arguments
    /// * `age` - Attained age of the resident
    /// * `gender` - Selects the mortality column
    /// * `loading_pct` - Longevity loading in percent, within [0, 100]
    ///
    /// The loaded expectancy in years is multiplied by 12 and truncated.
    pub fn life_expectancy_months(&self, age: u32, gender: Gender, loading_pct: f64) -> Result<u32> {
        if !(0.0..=100.0).contains(&loading_pct) {
            return Err(ProjectionError::invalid(format!(
                "longevity loading must be within [0, 100], got {}",
                loading_pct
            )));
        }

        let years = self.curtate_expectancy_years(age, gender) * (1.0 + loading_pct / 100.0);
        Ok((years * 12.0) as u32)
    }
}

/// Convenience wrapper over [`MortalityTable::life_expectancy_months`]
pub fn calculate_life_expectancy(
    table: &MortalityTable,
    age: u32,
    gender: Gender,
    loading_pct: f64,
) -> Result<u32> {
    table.life_expectancy_months(age, gender, loading_pct)
}
