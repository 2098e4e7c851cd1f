//! Projection engine for unit and portfolio cashflow projections

mod cashflows;
mod discount;
mod engine;
mod results;
mod runner;

pub use cashflows::{yearly_totals, CashflowSeries, NpvBreakdown, UnitWorkings, WorkingsRow};
pub use discount::{discount, Discounted, MonthlyFactors};
pub use engine::{project_cashflows, simulate_unit, unit_life_expectancies, LifeExpectancies, ProjectionEngine};
pub use results::{
    format_years_months, life_expectancy_table, LifeExpectancyRow, PortfolioResults, SummaryRow, LIFE_TABLE_AGES,
};
pub use runner::run_projection;
