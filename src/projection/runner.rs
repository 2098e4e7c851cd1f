//! Portfolio runner: projects every unit and assembles the results
//!
//! Units are independent, so they are projected in parallel over the
//! engine's shared read-only factors. Output order follows input order.

use super::engine::ProjectionEngine;
use super::results::{life_expectancy_table, PortfolioResults, SummaryRow};
use crate::assumptions::{MortalityTable, ProjectionAssumptions};
use crate::error::Result;
use crate::portfolio::Unit;
use log::info;
use rayon::prelude::*;
use std::time::Instant;

/// Run a projection for a whole portfolio
///
/// Fails on the first invalid unit; no partial results are returned.
pub fn run_projection(
    units: &[Unit],
    assumptions: &ProjectionAssumptions,
    mortality: &MortalityTable,
) -> Result<PortfolioResults> {
    let engine = ProjectionEngine::new(assumptions.clone(), mortality.clone())?;
    engine.run_portfolio(units)
}

impl ProjectionEngine {
    /// Project every unit with this engine's assumptions
    pub fn run_portfolio(&self, units: &[Unit]) -> Result<PortfolioResults> {
        let start = Instant::now();
        info!(
            "Projecting {} units over {} months ({:?}, {:?})",
            units.len(),
            self.factors().len(),
            self.assumptions().package_type,
            self.assumptions().occupancy
        );

        let life_expectancies =
            life_expectancy_table(self.mortality(), self.assumptions().longevity_loading_pct)?;

        let workings = units
            .par_iter()
            .map(|unit| self.project_unit(unit))
            .collect::<Result<Vec<_>>>()?;

        let summary = units
            .iter()
            .zip(&workings)
            .map(|(unit, w)| SummaryRow::new(unit, w))
            .collect();

        let results = PortfolioResults::new(
            self.assumptions().clone(),
            self.factors().clone(),
            life_expectancies,
            summary,
            workings,
        );

        info!(
            "Projection complete in {:?}: portfolio NPV {:.2}",
            start.elapsed(),
            results.totals().total
        );

        Ok(results)
    }
}
