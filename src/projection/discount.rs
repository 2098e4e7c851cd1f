//! Monthly discount and investment-return factors, and present values
//!
//! Both factor series are monthly-compounded nominal annual rates:
//! - discount factor for month i: `1 / (1 + d/1200)^i`
//! - investment return factor for month i: `(1 + r/1200)^i`
//!
//! They are built once per run and shared read-only by every unit.

use crate::assumptions::ProjectionAssumptions;
use crate::error::{ProjectionError, Result};
use serde::{Deserialize, Serialize};

/// Precomputed discount and investment-return factors for one horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFactors {
    /// Annual discount rate in percent
    pub discount_rate_annual_pct: f64,

    /// Annual investment return in percent
    pub investment_return_annual_pct: f64,

    discount: Vec<f64>,
    investment_return: Vec<f64>,
}

impl MonthlyFactors {
    /// Build factors for `months` months starting at month 0
    pub fn new(discount_rate_annual_pct: f64, investment_return_annual_pct: f64, months: usize) -> Self {
        let v = 1.0 / (1.0 + discount_rate_annual_pct / 1200.0);
        let g = 1.0 + investment_return_annual_pct / 1200.0;

        Self {
            discount_rate_annual_pct,
            investment_return_annual_pct,
            discount: (0..months).map(|m| v.powi(m as i32)).collect(),
            investment_return: (0..months).map(|m| g.powi(m as i32)).collect(),
        }
    }

    pub fn from_assumptions(assumptions: &ProjectionAssumptions) -> Self {
        Self::new(
            assumptions.discount_rate_annual_pct,
            assumptions.investment_return_annual_pct,
            assumptions.horizon_months(),
        )
    }

    /// Number of months covered
    pub fn len(&self) -> usize {
        self.discount.len()
    }

    pub fn is_empty(&self) -> bool {
        self.discount.is_empty()
    }

    pub fn discount_factors(&self) -> &[f64] {
        &self.discount
    }

    pub fn return_factors(&self) -> &[f64] {
        &self.investment_return
    }

    /// Cumulative investment-return factor at a month
    pub fn investment_return(&self, month: usize) -> f64 {
        self.investment_return[month]
    }

    /// Discount a cashflow series against these factors
    pub fn discount(&self, cashflows: &[f64]) -> Result<Discounted> {
        discount(cashflows, &self.discount)
    }
}

/// A discounted cashflow series and its present value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discounted {
    pub series: Vec<f64>,
    pub present_value: f64,
}

/// Multiply each cashflow by its month's discount factor
///
/// The present value is the sum of the discounted series. Series of
/// different lengths indicate a broken invariant and are rejected.
pub fn discount(cashflows: &[f64], discount_factors: &[f64]) -> Result<Discounted> {
    if cashflows.len() != discount_factors.len() {
        return Err(ProjectionError::LengthMismatch {
            cashflows: cashflows.len(),
            factors: discount_factors.len(),
        });
    }

    let series: Vec<f64> = cashflows
        .iter()
        .zip(discount_factors)
        .map(|(cf, v)| cf * v)
        .collect();
    let present_value = series.iter().sum();

    Ok(Discounted { series, present_value })
}
