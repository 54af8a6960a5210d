//! Bounded accumulators: apply a delta against an optional lower and/or upper
//! bound and classify the outcome.
//!
//! The four variants are exhaustive and chosen once from which bounds are
//! present.  All arithmetic here is pure: the tracker decides what to write
//! back.
//!
//! # Outcome rule (upper bound; the lower bound mirrors it)
//!
//! ```text
//! current undefined          → (delta,   NonViolation)
//! current + delta <= max     → (current + delta, NonViolation)
//! current == max             → (current, FullViolation)
//! otherwise                  → (current, SemiViolation)
//! ```
//!
//! A semi-violation leaves the value where it was.  Nothing is partially
//! applied: reward shaping downstream is calibrated on exactly this rule.

use fleet_core::Signal;

/// Which bounds constrain an attribute.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Restriction {
    /// No bounds: every delta applies.
    Unbounded,
    /// `add` is checked against `max`; `subtract` always applies.
    UpperOnly { max: f64 },
    /// `subtract` is checked against `min`; `add` always applies.
    LowerOnly { min: f64 },
    /// Both directions are checked.
    Bounded { min: f64, max: f64 },
}

impl Restriction {
    /// Select the variant from the bounds that are present.
    pub fn from_bounds(max: Option<f64>, min: Option<f64>) -> Self {
        match (max, min) {
            (None, None)           => Restriction::Unbounded,
            (Some(max), None)      => Restriction::UpperOnly { max },
            (None, Some(min))      => Restriction::LowerOnly { min },
            (Some(max), Some(min)) => Restriction::Bounded { min, max },
        }
    }

    pub fn max(&self) -> Option<f64> {
        match *self {
            Restriction::UpperOnly { max } | Restriction::Bounded { max, .. } => Some(max),
            _ => None,
        }
    }

    pub fn min(&self) -> Option<f64> {
        match *self {
            Restriction::LowerOnly { min } | Restriction::Bounded { min, .. } => Some(min),
            _ => None,
        }
    }

    /// Apply `+delta` to `current`.
    pub fn add(&self, current: Option<f64>, delta: f64) -> (f64, Signal) {
        let Some(cur) = current else {
            return (delta, Signal::NonViolation);
        };
        match self.max() {
            None => (cur + delta, Signal::NonViolation),
            Some(max) => {
                let candidate = cur + delta;
                if candidate <= max {
                    (candidate, Signal::NonViolation)
                } else if cur == max {
                    (cur, Signal::FullViolation)
                } else {
                    (cur, Signal::SemiViolation)
                }
            }
        }
    }

    /// Apply `-delta` to `current`.
    pub fn subtract(&self, current: Option<f64>, delta: f64) -> (f64, Signal) {
        let Some(cur) = current else {
            return (-delta, Signal::NonViolation);
        };
        match self.min() {
            None => (cur - delta, Signal::NonViolation),
            Some(min) => {
                let candidate = cur - delta;
                if candidate >= min {
                    (candidate, Signal::NonViolation)
                } else if cur == min {
                    (cur, Signal::FullViolation)
                } else {
                    (cur, Signal::SemiViolation)
                }
            }
        }
    }

    /// Largest `delta` that `add` would accept from `current` without a
    /// violation; infinite without an upper bound.
    pub fn headroom_up(&self, current: f64) -> f64 {
        self.max().map_or(f64::INFINITY, |max| (max - current).max(0.0))
    }

    /// Largest `delta` that `subtract` would accept from `current`.
    pub fn headroom_down(&self, current: f64) -> f64 {
        self.min().map_or(f64::INFINITY, |min| (current - min).max(0.0))
    }
}
