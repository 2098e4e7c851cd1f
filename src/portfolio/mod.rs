//! Portfolio data structures and unit loading

mod data;
pub mod loader;

pub use data::{Gender, Unit};
pub use loader::{load_units, load_units_from_reader};
