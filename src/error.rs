//! Error types for the projection engine and its loaders

use thiserror::Error;

/// Errors raised while loading inputs or running a projection
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An input value is outside its permitted domain (unknown gender,
    /// out-of-range percentage, negative money or term, missing spouse data)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Two monthly series that must line up have different lengths
    #[error("length mismatch: cashflow series has {cashflows} months, discount factors have {factors}")]
    LengthMismatch {
        /// Length of the cashflow series
        cashflows: usize,
        /// Length of the discount factor series
        factors: usize,
    },

    /// A mortality or portfolio table is malformed
    #[error("malformed {table} table: {reason}")]
    DataShape {
        /// Which input table failed
        table: &'static str,
        /// What is wrong with it
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ProjectionError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ProjectionError::InvalidArgument(msg.into())
    }

    pub(crate) fn shape(table: &'static str, reason: impl Into<String>) -> Self {
        ProjectionError::DataShape {
            table,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectionError>;
