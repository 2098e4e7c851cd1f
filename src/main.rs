//! Village Projection CLI
//!
//! Command-line interface for running portfolio projections
//!
//! # Commands
//!
//! - `village-projection project --portfolio <file>` - Project every unit and report NPVs
//! - `village-projection life-table` - Print life expectancies for a mortality table

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Instant;
use village_projection::assumptions::loader::{load_named_mortality_table, DEFAULT_DATA_PATH};
use village_projection::assumptions::load_mortality_table;
use village_projection::projection::{life_expectancy_table, yearly_totals};
use village_projection::{
    export, load_units, MortalityTable, MortalityTableId, Occupancy, PackageType, PortfolioResults,
    ProjectionAssumptions, Workbook,
};

/// Retirement-village cashflow projections
#[derive(Parser)]
#[command(name = "village-projection")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project a portfolio of units and report NPVs
    Project {
        /// Portfolio CSV (ID, Main Member Age, Main Member Gender, Spouse Age, Spouse Gender)
        #[arg(short, long)]
        portfolio: PathBuf,

        #[command(flatten)]
        mortality: MortalityArgs,

        #[command(flatten)]
        overrides: AssumptionArgs,

        /// Write every sheet as CSV into this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Write the full results as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Print life expectancies at standard ages
    LifeTable {
        #[command(flatten)]
        mortality: MortalityArgs,

        /// Longevity loading in percent
        #[arg(long, default_value_t = 10.0)]
        loading: f64,
    },
}

#[derive(Args)]
struct MortalityArgs {
    /// Named mortality table in the data directory (only CUSTOM ships in data/)
    #[arg(short = 't', long, default_value = "CUSTOM")]
    mortality_table: MortalityTableId,

    /// Explicit mortality CSV, overriding the named table
    #[arg(short, long)]
    mortality: Option<PathBuf>,

    /// Directory holding the named mortality tables
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    data_dir: PathBuf,
}

impl MortalityArgs {
    fn source(&self) -> String {
        match &self.mortality {
            Some(path) => path.display().to_string(),
            None => self.mortality_table.to_string(),
        }
    }

    fn load(&self) -> Result<MortalityTable> {
        match &self.mortality {
            Some(path) => load_mortality_table(path)
                .with_context(|| format!("Failed to load mortality table {}", path.display())),
            None => load_named_mortality_table(&self.data_dir, self.mortality_table)
                .with_context(|| format!("Failed to load mortality table {}", self.source())),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OccupancyArg {
    Single,
    Double,
}

#[derive(Clone, Copy, ValueEnum)]
enum PackageArg {
    LifeRights,
    Rental,
}

/// Command-line overrides applied on top of the assumptions file
#[derive(Args)]
struct AssumptionArgs {
    /// JSON assumptions file; missing fields take defaults
    #[arg(short, long)]
    assumptions: Option<PathBuf>,

    /// Longevity loading in percent
    #[arg(long)]
    loading: Option<f64>,

    /// Annual discount rate in percent
    #[arg(long)]
    discount_rate: Option<f64>,

    /// Annual investment return in percent
    #[arg(long)]
    investment_return: Option<f64>,

    /// Projection horizon in years
    #[arg(long)]
    years: Option<u32>,

    #[arg(long, value_enum)]
    occupancy: Option<OccupancyArg>,

    #[arg(long, value_enum)]
    package: Option<PackageArg>,

    #[arg(long)]
    purchase_price: Option<f64>,

    #[arg(long)]
    monthly_fee: Option<f64>,

    #[arg(long)]
    monthly_expense: Option<f64>,

    /// Resell the unit after each contract end (true/false)
    #[arg(long)]
    replacement: Option<bool>,

    /// Refund part of the price when the contract ends early (true/false)
    #[arg(long)]
    refund: Option<bool>,

    /// Refund as a percentage of the price
    #[arg(long)]
    refund_pct: Option<f64>,

    /// Refund window in years from the start of occupancy
    #[arg(long)]
    refund_years: Option<u32>,
}

impl AssumptionArgs {
    fn resolve(&self) -> Result<ProjectionAssumptions> {
        let mut a = match &self.assumptions {
            Some(path) => village_projection::assumptions::load_assumptions(path)
                .with_context(|| format!("Failed to load assumptions {}", path.display()))?,
            None => ProjectionAssumptions::default(),
        };
        self.apply(&mut a);

        a.validate().context("Invalid assumptions")?;
        Ok(a)
    }

    /// Overwrite every field given on the command line
    fn apply(&self, a: &mut ProjectionAssumptions) {
        if let Some(v) = self.loading {
            a.longevity_loading_pct = v;
        }
        if let Some(v) = self.discount_rate {
            a.discount_rate_annual_pct = v;
        }
        if let Some(v) = self.investment_return {
            a.investment_return_annual_pct = v;
        }
        if let Some(v) = self.years {
            a.projection_years = v;
        }
        if let Some(v) = self.occupancy {
            a.occupancy = match v {
                OccupancyArg::Single => Occupancy::Single,
                OccupancyArg::Double => Occupancy::Double,
            };
        }
        if let Some(v) = self.package {
            a.package_type = match v {
                PackageArg::LifeRights => PackageType::LifeRights,
                PackageArg::Rental => PackageType::Rental,
            };
        }
        if let Some(v) = self.purchase_price {
            a.purchase_price = v;
        }
        if let Some(v) = self.monthly_fee {
            a.monthly_fee = v;
        }
        if let Some(v) = self.monthly_expense {
            a.monthly_expense = v;
        }
        if let Some(v) = self.replacement {
            a.replacement_enabled = v;
        }
        if let Some(v) = self.refund {
            a.refund_on_early_exit = v;
        }
        if let Some(v) = self.refund_pct {
            a.refund_pct = v;
        }
        if let Some(v) = self.refund_years {
            a.refund_duration_years = v;
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Project {
            portfolio,
            mortality,
            overrides,
            export_dir,
            json,
        } => run_project(&portfolio, &mortality, &overrides, export_dir.as_deref(), json.as_deref()),
        Commands::LifeTable { mortality, loading } => run_life_table(&mortality, loading),
    }
}

fn run_project(
    portfolio: &Path,
    mortality: &MortalityArgs,
    overrides: &AssumptionArgs,
    export_dir: Option<&Path>,
    json: Option<&Path>,
) -> Result<()> {
    let start = Instant::now();

    let units = load_units(portfolio).with_context(|| format!("Failed to load portfolio {}", portfolio.display()))?;
    let table = mortality.load()?;
    let assumptions = overrides.resolve()?;

    let results = village_projection::run_projection(&units, &assumptions, &table).context("Projection failed")?;

    print_summary(&results);

    if let Some(dir) = export_dir {
        Workbook::build(&units, &results)
            .write_csv_dir(dir)
            .with_context(|| format!("Failed to export to {}", dir.display()))?;
        println!("\nSheets written to {}", dir.display());
    }
    if let Some(path) = json {
        export::write_json(path, &units, &results)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("JSON written to {}", path.display());
    }

    info!("Total time: {:?}", start.elapsed());
    Ok(())
}

fn print_summary(results: &PortfolioResults) {
    let a = &results.assumptions;
    println!("Village Projection v{}", env!("CARGO_PKG_VERSION"));
    println!("==========================\n");
    println!("  Package: {:?}, Occupancy: {:?}", a.package_type, a.occupancy);
    println!(
        "  Discount: {:.2}%  Return: {:.2}%  Loading: {:.2}%  Horizon: {} years",
        a.discount_rate_annual_pct, a.investment_return_annual_pct, a.longevity_loading_pct, a.projection_years
    );
    println!();

    println!(
        "{:<10} {:>20} {:>14} {:>14} {:>14} {:>14} {:>14}",
        "ID", "Last LE", "Sale NPV", "Fee NPV", "Expense NPV", "Refund NPV", "NPV"
    );
    println!("{}", "-".repeat(106));
    for row in &results.summary {
        println!(
            "{:<10} {:>20} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>14.2}",
            row.unit_id,
            row.last_life_expectancy,
            row.npv.sale,
            row.npv.fee,
            row.npv.expense,
            row.npv.refund,
            row.npv.total
        );
    }

    let totals = results.totals();
    println!("{}", "-".repeat(106));
    println!(
        "{:<10} {:>20} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>14.2}",
        "Total", "", totals.sale, totals.fee, totals.expense, totals.refund, totals.total
    );

    // Portfolio discounted cashflow by projection year
    let months = results.factors.len();
    let mut portfolio_monthly = vec![0.0; months];
    for w in results.all_workings() {
        for (acc, v) in portfolio_monthly.iter_mut().zip(&w.discounted.total) {
            *acc += v;
        }
    }

    println!("\n{:>5} {:>16}", "Year", "Discounted CF");
    for (year, total) in yearly_totals(&portfolio_monthly).iter().enumerate() {
        println!("{:>5} {:>16.2}", year + 1, total);
    }
}

fn run_life_table(mortality: &MortalityArgs, loading: f64) -> Result<()> {
    let table = mortality.load()?;
    let rows = life_expectancy_table(&table, loading).context("Invalid longevity loading")?;

    println!("Life expectancies ({} loading {:.1}%)", mortality.source(), loading);
    println!("{:>5} {:>20} {:>20}", "Age", "Male", "Female");
    for row in &rows {
        println!("{:>5} {:>20} {:>20}", row.age, row.male_display(), row.female_display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(args: &[&str]) -> AssumptionArgs {
        let mut argv = vec!["village-projection", "project", "--portfolio", "units.csv"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Project { overrides, .. } => overrides,
            Commands::LifeTable { .. } => unreachable!(),
        }
    }

    #[test]
    fn test_boolean_overrides_switch_off() {
        let mut a = ProjectionAssumptions {
            replacement_enabled: true,
            refund_on_early_exit: true,
            ..Default::default()
        };
        overrides(&["--replacement", "false", "--refund", "false"]).apply(&mut a);
        assert!(!a.replacement_enabled);
        assert!(!a.refund_on_early_exit);
    }

    #[test]
    fn test_absent_overrides_keep_file_values() {
        let mut a = ProjectionAssumptions {
            replacement_enabled: true,
            refund_pct: 50.0,
            ..Default::default()
        };
        overrides(&["--refund", "true", "--years", "20"]).apply(&mut a);
        assert!(a.replacement_enabled);
        assert!(a.refund_on_early_exit);
        assert_eq!(a.refund_pct, 50.0);
        assert_eq!(a.projection_years, 20);
    }

    #[test]
    fn test_mortality_source_prefers_path() {
        let cli = Cli::try_parse_from(["village-projection", "life-table", "--mortality", "rates.csv"]).unwrap();
        match cli.command {
            Commands::LifeTable { mortality, .. } => assert_eq!(mortality.source(), "rates.csv"),
            Commands::Project { .. } => unreachable!(),
        }

        let cli = Cli::try_parse_from(["village-projection", "life-table"]).unwrap();
        match cli.command {
            Commands::LifeTable { mortality, .. } => assert_eq!(mortality.source(), "CUSTOM"),
            Commands::Project { .. } => unreachable!(),
        }
    }
}
