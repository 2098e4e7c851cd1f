//! Shared test inputs

use crate::assumptions::{MortalityRow, MortalityTable};

/// Ten certain survival years from 70, certain death at 80:
/// a 70-year-old has exactly 10 years (120 months) remaining.
pub(crate) fn ten_year_table() -> MortalityTable {
    let mut rows: Vec<MortalityRow> = (70..80).map(|age| MortalityRow::new(age, 0.0, 0.0)).collect();
    rows.push(MortalityRow::new(80, 1.0, 1.0));
    MortalityTable::from_rows(rows).unwrap()
}

/// Gompertz-style increasing rates from age 50 to 110, certain death at 111
pub(crate) fn gompertz_table() -> MortalityTable {
    let rows = (50..=110)
        .map(|age| {
            let male = (0.0005 * (0.095 * (age as f64 - 30.0)).exp()).min(1.0);
            let female = (0.0003 * (0.097 * (age as f64 - 30.0)).exp()).min(1.0);
            MortalityRow::new(age, male, female)
        })
        .chain(std::iter::once(MortalityRow::new(111, 1.0, 1.0)))
        .collect();
    MortalityTable::from_rows(rows).unwrap()
}
