//! Resident contract (unit) data structures matching the portfolio format

use crate::error::ProjectionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gender of a resident, selecting the mortality column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl FromStr for Gender {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            other => Err(ProjectionError::invalid(format!(
                "gender must be Male or Female, got {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single resident contract from the portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Unit identifier, unique within a portfolio
    pub id: String,

    /// Age of the main member at the projection date
    pub main_age: u32,

    /// Gender of the main member
    pub main_gender: Gender,

    /// Age of the spouse, if the unit has one on record
    pub spouse_age: Option<u32>,

    /// Gender of the spouse, if the unit has one on record
    pub spouse_gender: Option<Gender>,
}

impl Unit {
    /// Create a single-member unit
    pub fn single(id: impl Into<String>, main_age: u32, main_gender: Gender) -> Self {
        Self {
            id: id.into(),
            main_age,
            main_gender,
            spouse_age: None,
            spouse_gender: None,
        }
    }

    /// Create a unit with both main member and spouse on record
    pub fn couple(
        id: impl Into<String>,
        main_age: u32,
        main_gender: Gender,
        spouse_age: u32,
        spouse_gender: Gender,
    ) -> Self {
        Self {
            id: id.into(),
            main_age,
            main_gender,
            spouse_age: Some(spouse_age),
            spouse_gender: Some(spouse_gender),
        }
    }

    /// Spouse age and gender, when both are present
    pub fn spouse(&self) -> Option<(u32, Gender)> {
        match (self.spouse_age, self.spouse_gender) {
            (Some(age), Some(gender)) => Some((age, gender)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parse() {
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!(" Female ".parse::<Gender>().unwrap(), Gender::Female);

        let err = "Other".parse::<Gender>().unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidArgument(_)));
    }

    #[test]
    fn test_spouse_requires_both_fields() {
        let couple = Unit::couple("U1", 72, Gender::Male, 70, Gender::Female);
        assert_eq!(couple.spouse(), Some((70, Gender::Female)));

        let mut partial = Unit::single("U2", 80, Gender::Female);
        partial.spouse_age = Some(78);
        assert_eq!(partial.spouse(), None);
    }
}
