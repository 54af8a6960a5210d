//! Tri-state restriction outcomes and the table that maps them to scalars.

/// How an attempted change interacted with its bound(s).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Signal {
    /// The change was applied in full.
    NonViolation,
    /// The change would cross a bound that still had headroom; nothing was
    /// applied.
    SemiViolation,
    /// The value already sat on the bound; nothing was applied.
    FullViolation,
}

impl Signal {
    /// Position of this outcome in a [`SignalTable`].
    #[inline]
    pub fn ordinal(self) -> usize {
        match self {
            Signal::NonViolation  => 0,
            Signal::SemiViolation => 1,
            Signal::FullViolation => 2,
        }
    }

    pub fn is_violation(self) -> bool {
        !matches!(self, Signal::NonViolation)
    }
}

/// The three scalars written to `signal_<attr>` columns, in the order
/// `[non-violation, semi-violation, full-violation]`.
///
/// The reward stage reads these values directly, so the table is part of the
/// scenario configuration rather than a constant.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalTable(pub [f64; 3]);

impl SignalTable {
    pub const fn new(non_violation: f64, semi_violation: f64, full_violation: f64) -> Self {
        Self([non_violation, semi_violation, full_violation])
    }

    /// Scalar for `signal`.
    #[inline]
    pub fn value(&self, signal: Signal) -> f64 {
        self.0[signal.ordinal()]
    }

    /// Scalar written by `reset_signal` and at the start of every step.
    #[inline]
    pub fn non_violation(&self) -> f64 {
        self.0[0]
    }
}

impl Default for SignalTable {
    /// `[1, 1, -1]`: partial and clean outcomes reward alike, a hard bound hit
    /// penalises.
    fn default() -> Self {
        Self::new(1.0, 1.0, -1.0)
    }
}
