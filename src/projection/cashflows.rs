//! Per-unit cashflow output structures

use super::discount::MonthlyFactors;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Monthly sale, fee, expense and refund cashflows with their total
///
/// Sign convention: sales and fees are inflows (positive), expenses and
/// refunds are outflows (negative).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CashflowSeries {
    pub sale: Vec<f64>,
    pub fee: Vec<f64>,
    pub expense: Vec<f64>,
    pub refund: Vec<f64>,
    pub total: Vec<f64>,
}

impl CashflowSeries {
    /// Combine the component series, filling in the monthly total
    pub fn from_components(sale: Vec<f64>, fee: Vec<f64>, expense: Vec<f64>, refund: Vec<f64>) -> Self {
        let total = (0..sale.len())
            .map(|i| sale[i] + fee[i] + expense[i] + refund[i])
            .collect();
        Self { sale, fee, expense, refund, total }
    }

    pub fn len(&self) -> usize {
        self.total.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_empty()
    }
}

/// Present values of each cashflow component
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NpvBreakdown {
    pub sale: f64,
    pub fee: f64,
    pub expense: f64,
    pub refund: f64,
    /// Sum of the discounted total series
    pub total: f64,
}

impl std::ops::AddAssign for NpvBreakdown {
    fn add_assign(&mut self, other: Self) {
        self.sale += other.sale;
        self.fee += other.fee;
        self.expense += other.expense;
        self.refund += other.refund;
        self.total += other.total;
    }
}

/// One month of a unit's workings, as shown in the detailed tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingsRow {
    pub month: u32,
    pub investment_return_factor: f64,
    pub discount_factor: f64,
    /// Occupancy cycles started so far; `None` after the unit stops
    pub cycle_count: Option<u32>,
    pub sale: f64,
    pub fee: f64,
    pub expense: f64,
    pub refund: f64,
    pub total: f64,
    pub discounted_sale: f64,
    pub discounted_fee: f64,
    pub discounted_expense: f64,
    pub discounted_refund: f64,
    pub discounted_total: f64,
}

/// Full monthly workings for one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitWorkings {
    pub unit_id: String,

    /// Main member life expectancy in months
    pub main_life_expectancy: u32,

    /// Spouse life expectancy in months, for double occupancy only
    pub spouse_life_expectancy: Option<u32>,

    /// Governing (last survivor) life expectancy in months
    pub last_life_expectancy: u32,

    /// Factors shared by every unit in the run
    pub factors: Arc<MonthlyFactors>,

    pub cycle_counts: Vec<Option<u32>>,

    pub nominal: CashflowSeries,

    pub discounted: CashflowSeries,

    pub npv: NpvBreakdown,
}

impl UnitWorkings {
    /// Discount nominal cashflows and package them with the unit's details
    pub(crate) fn assemble(
        unit_id: String,
        life_expectancies: (u32, Option<u32>, u32),
        factors: Arc<MonthlyFactors>,
        cycle_counts: Vec<Option<u32>>,
        nominal: CashflowSeries,
    ) -> Result<Self> {
        let sale = factors.discount(&nominal.sale)?;
        let fee = factors.discount(&nominal.fee)?;
        let expense = factors.discount(&nominal.expense)?;
        let refund = factors.discount(&nominal.refund)?;
        let total = factors.discount(&nominal.total)?;

        let npv = NpvBreakdown {
            sale: sale.present_value,
            fee: fee.present_value,
            expense: expense.present_value,
            refund: refund.present_value,
            total: total.present_value,
        };

        let discounted = CashflowSeries {
            sale: sale.series,
            fee: fee.series,
            expense: expense.series,
            refund: refund.series,
            total: total.series,
        };

        let (main_life_expectancy, spouse_life_expectancy, last_life_expectancy) = life_expectancies;

        Ok(Self {
            unit_id,
            main_life_expectancy,
            spouse_life_expectancy,
            last_life_expectancy,
            factors,
            cycle_counts,
            nominal,
            discounted,
            npv,
        })
    }

    /// Number of projected months
    pub fn months(&self) -> usize {
        self.nominal.len()
    }

    /// Month-by-month rows for tabular display
    pub fn rows(&self) -> impl Iterator<Item = WorkingsRow> + '_ {
        (0..self.months()).map(move |i| WorkingsRow {
            month: i as u32,
            investment_return_factor: self.factors.return_factors()[i],
            discount_factor: self.factors.discount_factors()[i],
            cycle_count: self.cycle_counts[i],
            sale: self.nominal.sale[i],
            fee: self.nominal.fee[i],
            expense: self.nominal.expense[i],
            refund: self.nominal.refund[i],
            total: self.nominal.total[i],
            discounted_sale: self.discounted.sale[i],
            discounted_fee: self.discounted.fee[i],
            discounted_expense: self.discounted.expense[i],
            discounted_refund: self.discounted.refund[i],
            discounted_total: self.discounted.total[i],
        })
    }

    /// Discounted total cashflow per complete projection year
    pub fn yearly_discounted_totals(&self) -> Vec<f64> {
        yearly_totals(&self.discounted.total)
    }
}

/// Sum a monthly series into complete-year totals
///
/// A trailing partial year is dropped.
pub fn yearly_totals(monthly: &[f64]) -> Vec<f64> {
    monthly.chunks_exact(12).map(|year| year.iter().sum()).collect()
}
