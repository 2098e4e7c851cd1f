//! Core projection engine for monthly unit cashflow projections
//!
//! For each unit the engine:
//! 1. Derives the governing (last survivor) life expectancy
//! 2. Walks the horizon month by month, raising sale, fee, expense and
//!    refund cashflows and restarting the occupancy cycle on replacement
//! 3. Discounts every series with the run's shared factors

use super::cashflows::{CashflowSeries, UnitWorkings};
use super::discount::MonthlyFactors;
use crate::assumptions::{MortalityTable, Occupancy, PackageType, ProjectionAssumptions};
use crate::error::{ProjectionError, Result};
use crate::portfolio::Unit;
use log::debug;
use std::sync::Arc;

/// Life expectancies of a unit's members, in months
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifeExpectancies {
    pub main: u32,
    /// Only evaluated for double occupancy
    pub spouse: Option<u32>,
}

impl LifeExpectancies {
    /// The contract runs until both members are expected to have exited
    pub fn last(&self) -> u32 {
        self.spouse.map_or(self.main, |spouse| self.main.max(spouse))
    }
}

/// Evaluate the life expectancies governing one unit's contract
pub fn unit_life_expectancies(
    unit: &Unit,
    assumptions: &ProjectionAssumptions,
    mortality: &MortalityTable,
) -> Result<LifeExpectancies> {
    let loading = assumptions.longevity_loading_pct;
    let main = mortality.life_expectancy_months(unit.main_age, unit.main_gender, loading)?;

    let spouse = match assumptions.occupancy {
        Occupancy::Single => None,
        Occupancy::Double => {
            let (age, gender) = unit.spouse().ok_or_else(|| {
                ProjectionError::invalid(format!(
                    "unit {} has no spouse age and gender for double occupancy",
                    unit.id
                ))
            })?;
            Some(mortality.life_expectancy_months(age, gender, loading)?)
        }
    };

    Ok(LifeExpectancies { main, spouse })
}

/// Nominal cashflows for one unit and its occupancy-cycle counts
///
/// Each Life Rights cycle sells the unit in its first month and collects
/// fees for `last_life_expectancy` occupied months. The month after those
/// is the contract-end month: an early-exit refund may be paid, the price
/// is reset to the original price grown by the investment return, and
/// either the unit stops or a new cycle begins the following month.
/// Rental units accrue fees and expenses over the whole horizon.
pub fn project_cashflows(
    last_life_expectancy: u32,
    assumptions: &ProjectionAssumptions,
    factors: &MonthlyFactors,
) -> (CashflowSeries, Vec<Option<u32>>) {
    let horizon = factors.len();
    let life_rights = assumptions.package_type == PackageType::LifeRights;
    let occupied_months = last_life_expectancy as usize;
    let refund_window = assumptions.refund_duration_years as usize * 12;

    let mut sale = vec![0.0; horizon];
    let mut fee = vec![0.0; horizon];
    let mut expense = vec![0.0; horizon];
    let mut refund = vec![0.0; horizon];
    let mut cycle_counts = vec![None; horizon];

    let mut purchase_price = assumptions.purchase_price;
    let mut cycle_start = 0usize;
    let mut cycles = 0u32;

    for month in 0..horizon {
        let contract_end = life_rights && month == cycle_start + occupied_months;

        if life_rights && month == cycle_start {
            sale[month] = purchase_price;
            cycles += 1;
        }

        // The vacated month carries no fee or expense
        if month >= cycle_start && !contract_end {
            fee[month] += assumptions.monthly_fee;
            expense[month] -= assumptions.monthly_expense;
        }

        cycle_counts[month] = Some(cycles);

        if contract_end {
            if assumptions.refund_on_early_exit && month < cycle_start + refund_window {
                refund[month] -= purchase_price * assumptions.refund_pct / 100.0;
            }

            purchase_price = assumptions.purchase_price * factors.investment_return(month);

            if !assumptions.replacement_enabled {
                break;
            }
            cycle_start = month + 1;
        }
    }

    (CashflowSeries::from_components(sale, fee, expense, refund), cycle_counts)
}

/// Simulate and discount one unit's cashflows
pub fn simulate_unit(
    unit: &Unit,
    assumptions: &ProjectionAssumptions,
    mortality: &MortalityTable,
    factors: &Arc<MonthlyFactors>,
) -> Result<UnitWorkings> {
    assumptions.validate()?;
    if factors.len() != assumptions.horizon_months() {
        return Err(ProjectionError::LengthMismatch {
            cashflows: assumptions.horizon_months(),
            factors: factors.len(),
        });
    }

    let lives = unit_life_expectancies(unit, assumptions, mortality)?;
    let last = lives.last();
    let (nominal, cycle_counts) = project_cashflows(last, assumptions, factors);

    let workings = UnitWorkings::assemble(
        unit.id.clone(),
        (lives.main, lives.spouse, last),
        Arc::clone(factors),
        cycle_counts,
        nominal,
    )?;

    debug!(
        "Unit {}: last life expectancy {} months, NPV {:.2}",
        unit.id, last, workings.npv.total
    );

    Ok(workings)
}

/// Projection engine bound to one assumption set and mortality table
#[derive(Debug, Clone)]
pub struct ProjectionEngine {
    assumptions: ProjectionAssumptions,
    mortality: MortalityTable,
    factors: Arc<MonthlyFactors>,
}

impl ProjectionEngine {
    /// Validate the assumptions and precompute the factor series
    pub fn new(assumptions: ProjectionAssumptions, mortality: MortalityTable) -> Result<Self> {
        assumptions.validate()?;
        let factors = Arc::new(MonthlyFactors::from_assumptions(&assumptions));
        Ok(Self {
            assumptions,
            mortality,
            factors,
        })
    }

    pub fn assumptions(&self) -> &ProjectionAssumptions {
        &self.assumptions
    }

    pub fn mortality(&self) -> &MortalityTable {
        &self.mortality
    }

    pub fn factors(&self) -> &Arc<MonthlyFactors> {
        &self.factors
    }

    /// Life expectancies for a unit under this engine's assumptions
    pub fn life_expectancies(&self, unit: &Unit) -> Result<LifeExpectancies> {
        unit_life_expectancies(unit, &self.assumptions, &self.mortality)
    }

    /// Run projection for a single unit
    pub fn project_unit(&self, unit: &Unit) -> Result<UnitWorkings> {
        simulate_unit(unit, &self.assumptions, &self.mortality, &self.factors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{gompertz_table, ten_year_table};
    use crate::portfolio::Gender;
    use approx::assert_relative_eq;

    /// Zero rates, 15 years, Life Rights at 100k with 1000 fee and 500 expense
    fn flat_life_rights() -> ProjectionAssumptions {
        ProjectionAssumptions {
            longevity_loading_pct: 0.0,
            discount_rate_annual_pct: 0.0,
            investment_return_annual_pct: 0.0,
            projection_years: 15,
            occupancy: Occupancy::Single,
            package_type: PackageType::LifeRights,
            purchase_price: 100_000.0,
            monthly_fee: 1_000.0,
            monthly_expense: 500.0,
            replacement_enabled: false,
            refund_on_early_exit: false,
            refund_pct: 0.0,
            refund_duration_years: 0,
        }
    }

    fn run(unit: &Unit, assumptions: ProjectionAssumptions, table: MortalityTable) -> UnitWorkings {
        ProjectionEngine::new(assumptions, table)
            .unwrap()
            .project_unit(unit)
            .unwrap()
    }

    #[test]
    fn test_life_rights_single_exit_scenario() {
        let unit = Unit::single("U1", 70, Gender::Male);
        let workings = run(&unit, flat_life_rights(), ten_year_table());

        assert_eq!(workings.main_life_expectancy, 120);
        assert_eq!(workings.last_life_expectancy, 120);
        assert_eq!(workings.months(), 180);

        let cf = &workings.nominal;
        assert_eq!(cf.sale[0], 100_000.0);
        assert!(cf.sale[1..].iter().all(|&s| s == 0.0));

        for i in 0..180 {
            let (fee, expense) = if i < 120 { (1_000.0, -500.0) } else { (0.0, 0.0) };
            assert_eq!(cf.fee[i], fee, "fee at month {}", i);
            assert_eq!(cf.expense[i], expense, "expense at month {}", i);
        }
        assert!(cf.refund.iter().all(|&r| r == 0.0));

        assert_relative_eq!(workings.npv.total, 160_000.0, epsilon = 1e-6);
        assert_relative_eq!(workings.npv.sale, 100_000.0);
        assert_relative_eq!(workings.npv.fee, 120_000.0);
        assert_relative_eq!(workings.npv.expense, -60_000.0);
    }

    #[test]
    fn test_cycle_counts_stop_with_unit() {
        let unit = Unit::single("U1", 70, Gender::Male);
        let workings = run(&unit, flat_life_rights(), ten_year_table());

        assert_eq!(workings.cycle_counts[0], Some(1));
        assert_eq!(workings.cycle_counts[120], Some(1));
        assert_eq!(workings.cycle_counts[121], None);
        assert_eq!(workings.cycle_counts[179], None);
    }

    #[test]
    fn test_rental_accrues_every_month() {
        let unit = Unit::single("U1", 70, Gender::Male);
        let assumptions = ProjectionAssumptions {
            package_type: PackageType::Rental,
            refund_on_early_exit: true,
            refund_pct: 80.0,
            refund_duration_years: 20,
            ..flat_life_rights()
        };
        let workings = run(&unit, assumptions, ten_year_table());
        let cf = &workings.nominal;

        assert!(cf.sale.iter().all(|&s| s == 0.0));
        assert!(cf.refund.iter().all(|&r| r == 0.0));
        assert!(cf.fee.iter().all(|&f| f == 1_000.0));
        assert!(cf.expense.iter().all(|&e| e == -500.0));
        assert!(workings.cycle_counts.iter().all(|&c| c == Some(0)));
        assert_relative_eq!(workings.npv.total, 180.0 * 500.0, epsilon = 1e-6);
    }

    #[test]
    fn test_refund_within_early_exit_window() {
        let unit = Unit::single("U1", 70, Gender::Male);
        let assumptions = ProjectionAssumptions {
            refund_on_early_exit: true,
            refund_pct: 80.0,
            refund_duration_years: 11,
            ..flat_life_rights()
        };
        let workings = run(&unit, assumptions, ten_year_table());
        let refund = &workings.nominal.refund;

        assert_eq!(refund[120], -80_000.0);
        assert_eq!(refund.iter().filter(|&&r| r != 0.0).count(), 1);
        assert_relative_eq!(workings.npv.total, 80_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_no_refund_after_early_exit_window() {
        let unit = Unit::single("U1", 70, Gender::Male);
        // Exit at month 120 is not before the 10-year window closes
        let assumptions = ProjectionAssumptions {
            refund_on_early_exit: true,
            refund_pct: 80.0,
            refund_duration_years: 10,
            ..flat_life_rights()
        };
        let workings = run(&unit, assumptions, ten_year_table());
        assert!(workings.nominal.refund.iter().all(|&r| r == 0.0));
    }

    #[test]
    fn test_refund_disabled_ignores_pct() {
        let unit = Unit::single("U1", 70, Gender::Male);
        let assumptions = ProjectionAssumptions {
            refund_on_early_exit: false,
            refund_pct: 80.0,
            refund_duration_years: 20,
            ..flat_life_rights()
        };
        let workings = run(&unit, assumptions, ten_year_table());
        assert!(workings.nominal.refund.iter().all(|&r| r == 0.0));
    }

    #[test]
    fn test_replacement_reprices_from_original_price() {
        // 75-year-old: 60 months occupied, exit at month 60, resale at 61
        let unit = Unit::single("U1", 75, Gender::Female);
        let assumptions = ProjectionAssumptions {
            investment_return_annual_pct: 6.0,
            replacement_enabled: true,
            ..flat_life_rights()
        };
        let engine = ProjectionEngine::new(assumptions, ten_year_table()).unwrap();
        let workings = engine.project_unit(&unit).unwrap();
        let sale = &workings.nominal.sale;
        let growth = engine.factors().return_factors();

        assert_eq!(workings.last_life_expectancy, 60);
        assert_eq!(sale[0], 100_000.0);
        assert_relative_eq!(sale[61], 100_000.0 * growth[60]);
        assert_relative_eq!(sale[122], 100_000.0 * growth[121]);

        let sale_months: Vec<usize> = (0..sale.len()).filter(|&i| sale[i] != 0.0).collect();
        assert_eq!(sale_months, vec![0, 61, 122]);

        // Exit months are vacant; every other month is occupied
        assert_eq!(workings.nominal.fee[60], 0.0);
        assert_eq!(workings.nominal.fee[61], 1_000.0);
        assert_eq!(workings.nominal.fee[121], 0.0);
        assert_eq!(workings.nominal.fee[179], 1_000.0);

        assert_eq!(workings.cycle_counts[60], Some(1));
        assert_eq!(workings.cycle_counts[61], Some(2));
        assert_eq!(workings.cycle_counts[179], Some(3));
    }

    #[test]
    fn test_refund_uses_cycle_price_before_repricing() {
        let unit = Unit::single("U1", 75, Gender::Female);
        let assumptions = ProjectionAssumptions {
            investment_return_annual_pct: 6.0,
            replacement_enabled: true,
            refund_on_early_exit: true,
            refund_pct: 50.0,
            refund_duration_years: 10,
            ..flat_life_rights()
        };
        let engine = ProjectionEngine::new(assumptions, ten_year_table()).unwrap();
        let workings = engine.project_unit(&unit).unwrap();
        let growth = engine.factors().return_factors();

        // First cycle sold at the original price
        assert_relative_eq!(workings.nominal.refund[60], -50_000.0);
        // Second cycle sold at the month-60 repriced value
        assert_relative_eq!(workings.nominal.refund[121], -50_000.0 * growth[60], epsilon = 1e-6);
    }

    #[test]
    fn test_zero_life_expectancy_same_month_events() {
        // Beyond the table: no expected lifetime at all
        let unit = Unit::single("U1", 95, Gender::Male);
        let assumptions = ProjectionAssumptions {
            projection_years: 1,
            replacement_enabled: true,
            refund_on_early_exit: true,
            refund_pct: 100.0,
            refund_duration_years: 1,
            ..flat_life_rights()
        };
        let workings = run(&unit, assumptions, ten_year_table());
        let cf = &workings.nominal;

        assert_eq!(workings.last_life_expectancy, 0);
        for i in 0..12 {
            assert_eq!(cf.sale[i], 100_000.0);
            assert_eq!(cf.refund[i], -100_000.0);
            assert_eq!(cf.fee[i], 0.0);
            assert_eq!(workings.cycle_counts[i], Some(i as u32 + 1));
        }
        assert_relative_eq!(workings.npv.total, 0.0);
    }

    #[test]
    fn test_contract_end_beyond_horizon() {
        let unit = Unit::single("U1", 70, Gender::Male);
        let assumptions = ProjectionAssumptions {
            projection_years: 5,
            refund_on_early_exit: true,
            refund_pct: 80.0,
            refund_duration_years: 20,
            ..flat_life_rights()
        };
        let workings = run(&unit, assumptions, ten_year_table());

        assert_eq!(workings.months(), 60);
        assert!(workings.nominal.fee.iter().all(|&f| f == 1_000.0));
        assert!(workings.nominal.refund.iter().all(|&r| r == 0.0));
        assert!(workings.cycle_counts.iter().all(|&c| c == Some(1)));
    }

    #[test]
    fn test_double_occupancy_uses_last_survivor() {
        let unit = Unit::couple("U1", 75, Gender::Male, 70, Gender::Female);
        let assumptions = ProjectionAssumptions {
            occupancy: Occupancy::Double,
            ..flat_life_rights()
        };
        let workings = run(&unit, assumptions, ten_year_table());

        assert_eq!(workings.main_life_expectancy, 60);
        assert_eq!(workings.spouse_life_expectancy, Some(120));
        assert_eq!(workings.last_life_expectancy, 120);
    }

    #[test]
    fn test_single_occupancy_ignores_spouse() {
        let unit = Unit::couple("U1", 75, Gender::Male, 70, Gender::Female);
        let workings = run(&unit, flat_life_rights(), ten_year_table());

        assert_eq!(workings.spouse_life_expectancy, None);
        assert_eq!(workings.last_life_expectancy, 60);
    }

    #[test]
    fn test_double_occupancy_requires_spouse() {
        let unit = Unit::single("U1", 75, Gender::Male);
        let assumptions = ProjectionAssumptions {
            occupancy: Occupancy::Double,
            ..flat_life_rights()
        };
        let engine = ProjectionEngine::new(assumptions, ten_year_table()).unwrap();
        let err = engine.project_unit(&unit).unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidArgument(_)));
    }

    #[test]
    fn test_engine_rejects_invalid_assumptions() {
        let assumptions = ProjectionAssumptions {
            monthly_fee: -1.0,
            ..flat_life_rights()
        };
        let err = ProjectionEngine::new(assumptions, ten_year_table()).unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidArgument(_)));
    }

    #[test]
    fn test_factor_length_checked() {
        let unit = Unit::single("U1", 70, Gender::Male);
        let factors = Arc::new(MonthlyFactors::new(0.0, 0.0, 12));
        let err = simulate_unit(&unit, &flat_life_rights(), &ten_year_table(), &factors).unwrap_err();
        assert!(matches!(err, ProjectionError::LengthMismatch { .. }));
    }

    #[test]
    fn test_simulate_unit_validates_assumptions() {
        let unit = Unit::single("U1", 70, Gender::Male);
        let factors = Arc::new(MonthlyFactors::new(0.0, 0.0, 180));

        let negative_fee = ProjectionAssumptions {
            monthly_fee: -1.0,
            ..flat_life_rights()
        };
        let err = simulate_unit(&unit, &negative_fee, &ten_year_table(), &factors).unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidArgument(_)));

        let large_refund = ProjectionAssumptions {
            refund_pct: 150.0,
            ..flat_life_rights()
        };
        let err = simulate_unit(&unit, &large_refund, &ten_year_table(), &factors).unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidArgument(_)));

        assert!(simulate_unit(&unit, &flat_life_rights(), &ten_year_table(), &factors).is_ok());
    }

    #[test]
    fn test_discounted_total_matches_npv() {
        let unit = Unit::couple("U1", 68, Gender::Male, 66, Gender::Female);
        let assumptions = ProjectionAssumptions {
            occupancy: Occupancy::Double,
            replacement_enabled: true,
            refund_on_early_exit: true,
            refund_pct: 80.0,
            refund_duration_years: 10,
            investment_return_annual_pct: 4.0,
            ..ProjectionAssumptions::default()
        };
        let workings = run(&unit, assumptions, gompertz_table());

        let series_sum: f64 = workings.discounted.total.iter().sum();
        assert_relative_eq!(series_sum, workings.npv.total, epsilon = 1e-6);
        assert_relative_eq!(
            workings.npv.total,
            workings.npv.sale + workings.npv.fee + workings.npv.expense + workings.npv.refund,
            epsilon = 1e-6
        );
        assert_eq!(workings.months(), 480);
        assert_eq!(workings.yearly_discounted_totals().len(), 40);
    }
}
