//! Core error types for tactivo-core.
//!
//! The reconciler and normalizer are total functions and never fail; these
//! variants cover lookups and boundary parsing around them.

use thiserror::Error;

use crate::day::Day;
use crate::id::RowKey;

/// Core errors produced by the tactivo-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A day label was not a single letter `A`..`Z`.
    #[error("invalid day label: '{label}'")]
    InvalidDayLabel { label: String },

    /// A day ordinal fell outside the letter range.
    #[error("day out of range: index {index}")]
    DayOutOfRange { index: usize },

    /// A program already has the maximum number of day columns.
    #[error("day limit reached: at most {max} days")]
    DayLimitReached { max: usize },

    /// The day is neither declared nor used by any exercise.
    #[error("day not found: {day}")]
    DayNotFound { day: Day },

    /// No assignment with this key exists in the program.
    #[error("exercise not found: {key}")]
    ExerciseNotFound { key: RowKey },

    /// A rendered key could not be parsed.
    #[error("invalid key: '{key}'")]
    InvalidKey { key: String },

    /// A temp row was promoted twice.
    #[error("row already persisted: {key}")]
    AlreadyPersisted { key: RowKey },

    /// Day/position invariants do not hold.
    #[error("invariant violated: {reason}")]
    InvariantViolation { reason: String },
}
