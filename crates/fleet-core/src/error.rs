//! Configuration error type.
//!
//! Only scenario-definition problems are errors.  An infeasible action during
//! a step is never an `Err`: it is recorded as a [`Signal`][crate::Signal] and
//! the step carries on.  Sub-crates wrap `FleetError` as one variant of their
//! own enums via `#[from]`.

use thiserror::Error;

/// The top-level error type for `fleet-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("attribute {attribute:?}: lower bound {min} exceeds upper bound {max}")]
    InvertedBounds {
        attribute: String,
        min:       f64,
        max:       f64,
    },

    #[error("attribute {attribute:?}: initial value {init} lies outside its bounds")]
    InitOutOfBounds {
        attribute: String,
        init:      f64,
    },

    #[error("attribute {attribute:?}: initial value refers to the {side} bound, which is not set")]
    MissingBound {
        attribute: String,
        side:      &'static str,
    },

    #[error("invalid parameter: {0}")]
    InvalidParam(String),
}

/// Shorthand result type for all `fleet-*` crates.
pub type FleetResult<T> = Result<T, FleetError>;
