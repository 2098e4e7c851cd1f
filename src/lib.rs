//! Village Projection - Actuarial cashflow engine for retirement-village contracts
//!
//! This library provides:
//! - Curtate life expectancy from select mortality tables with longevity loading
//! - Monthly unit projections for Life Rights and Rental packages
//! - Sale, fee, expense, and refund cashflows with unit replacement
//! - Discounting and NPV by cashflow component
//! - Parallel portfolio runs with CSV and JSON export

pub mod error;
pub mod portfolio;
pub mod assumptions;
pub mod projection;
pub mod export;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types
pub use error::{ProjectionError, Result};
pub use portfolio::{load_units, Gender, Unit};
pub use assumptions::{
    calculate_life_expectancy, MortalityTable, MortalityTableId, Occupancy, PackageType, ProjectionAssumptions,
};
pub use projection::{run_projection, NpvBreakdown, PortfolioResults, ProjectionEngine, SummaryRow, UnitWorkings};
pub use export::Workbook;
