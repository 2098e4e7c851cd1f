//! Projection assumptions: mortality, economic rates, and contract terms

mod mortality;
pub mod loader;

pub use mortality::{calculate_life_expectancy, MortalityRow, MortalityTable};
pub use loader::{load_assumptions, load_mortality_table, load_mortality_table_from_reader, MortalityTableId};

use crate::error::{ProjectionError, Result};
use serde::{Deserialize, Serialize};

/// Longest projection horizon accepted, in years
pub const MAX_PROJECTION_YEARS: u32 = 40;

/// Whether the unit is occupied by one resident or a couple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Occupancy {
    Single,
    Double,
}

/// Commercial package sold to residents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageType {
    /// Upfront purchase price for occupancy until the last member exits
    #[serde(rename = "Life Rights", alias = "LifeRights")]
    LifeRights,
    /// Recurring fee and expense only
    Rental,
}

/// Snapshot of every assumption driving one projection run
///
/// Percentages are expressed in percent (10.0 = 10%), money in currency
/// units. Fields missing from a JSON config take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionAssumptions {
    /// Prudence margin inflating life expectancy, [0, 100]
    pub longevity_loading_pct: f64,

    /// Annual discount rate, compounded monthly
    pub discount_rate_annual_pct: f64,

    /// Annual property investment return, compounded monthly
    pub investment_return_annual_pct: f64,

    /// Projection horizon in years, at most [`MAX_PROJECTION_YEARS`]
    pub projection_years: u32,

    pub occupancy: Occupancy,

    pub package_type: PackageType,

    /// Price paid at the start of each Life Rights occupancy cycle
    pub purchase_price: f64,

    /// Fee received from the resident each occupied month
    pub monthly_fee: f64,

    /// Cost of running the unit each occupied month
    pub monthly_expense: f64,

    /// Resell the unit to a same-profile resident after each exit
    pub replacement_enabled: bool,

    /// Refund part of the price when the contract ends early
    pub refund_on_early_exit: bool,

    /// Refund as a percentage of the cycle's purchase price, [0, 100]
    pub refund_pct: f64,

    /// Exits within this many years of the cycle start are refunded
    pub refund_duration_years: u32,
}

impl Default for ProjectionAssumptions {
    fn default() -> Self {
        Self {
            longevity_loading_pct: 10.0,
            discount_rate_annual_pct: 10.0,
            investment_return_annual_pct: 0.0,
            projection_years: MAX_PROJECTION_YEARS,
            occupancy: Occupancy::Single,
            package_type: PackageType::LifeRights,
            purchase_price: 125_000.0,
            monthly_fee: 1_000.0,
            monthly_expense: 1_000.0,
            replacement_enabled: false,
            refund_on_early_exit: false,
            refund_pct: 0.0,
            refund_duration_years: 0,
        }
    }
}

impl ProjectionAssumptions {
    /// Number of monthly steps in the projection
    pub fn horizon_months(&self) -> usize {
        self.projection_years as usize * 12
    }

    /// Check every field is inside its permitted range
    pub fn validate(&self) -> Result<()> {
        check_pct("longevity_loading_pct", self.longevity_loading_pct)?;
        check_pct("refund_pct", self.refund_pct)?;
        check_non_negative("purchase_price", self.purchase_price)?;
        check_non_negative("monthly_fee", self.monthly_fee)?;
        check_non_negative("monthly_expense", self.monthly_expense)?;
        check_monthly_rate("discount_rate_annual_pct", self.discount_rate_annual_pct)?;
        check_monthly_rate("investment_return_annual_pct", self.investment_return_annual_pct)?;

        if self.projection_years > MAX_PROJECTION_YEARS {
            return Err(ProjectionError::invalid(format!(
                "projection_years must be at most {}, got {}",
                MAX_PROJECTION_YEARS, self.projection_years
            )));
        }

        Ok(())
    }
}

fn check_pct(name: &str, value: f64) -> Result<()> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ProjectionError::invalid(format!("{} must be within [0, 100], got {}", name, value)))
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ProjectionError::invalid(format!("{} must be a non-negative amount, got {}", name, value)))
    }
}

/// The monthly growth base `1 + r/1200` must stay positive
fn check_monthly_rate(name: &str, annual_pct: f64) -> Result<()> {
    if annual_pct.is_finite() && 1.0 + annual_pct / 1200.0 > 0.0 {
        Ok(())
    } else {
        Err(ProjectionError::invalid(format!("{} of {} is not a usable annual rate", name, annual_pct)))
    }
}
