//! `RestrictedValue` — the sole writer of one restricted attribute for one
//! entity slot.
//!
//! A tracker holds keys, not values: the attribute's [`AttributeColumns`],
//! its slot, the accumulator variant and the signal table.  Every read goes
//! to [`Columns`], so two trackers touching the same entity always see the
//! same state.  [`StateStore`][crate::StateStore] owns the trackers and lends
//! them its columns through a split borrow.
//!
//! # Time budget
//!
//! When the attribute has a rate, `in_time_X[slot]` holds what is left of
//! this frame's throughput.  Mutations are clamped to it and every committed
//! change consumes its magnitude.  The budget is restored by
//! [`reset_budget`][RestrictedValue::reset_budget], which the store calls
//! from `init_step`.
//!
//! # Totality
//!
//! Nothing in here returns an error or panics on a bad request.  An
//! infeasible change leaves the value alone and records a violation signal.

use fleet_core::{ResolvedRestriction, Signal, SignalTable};
use tracing::trace;

use crate::column::{AttributeColumns, Columns};
use crate::Restriction;

/// Tracker for one `(attribute, slot)` pair.
#[derive(Clone, Debug)]
pub struct RestrictedValue {
    name:        String,
    slot:        usize,
    cols:        AttributeColumns,
    restriction: Restriction,
    rate:        Option<f64>,
    signals:     SignalTable,
}

impl RestrictedValue {
    /// Register the attribute's columns for `slot` and seed them.
    ///
    /// `resolved` must already be validated (see
    /// [`ResolvedRestriction::resolve`]).  The value starts at `init`, the
    /// signal at the non-violation entry and the budget at `rate`.
    pub fn new(
        columns:  &mut Columns,
        name:     &str,
        slot:     usize,
        resolved: ResolvedRestriction,
        signals:  SignalTable,
    ) -> Self {
        let cols = columns.register_attribute(name, slot, resolved.max, resolved.min, resolved.init);
        let tracker = Self {
            name: name.to_owned(),
            slot,
            cols,
            restriction: Restriction::from_bounds(resolved.max, resolved.min),
            rate: resolved.rate,
            signals,
        };
        tracker.reset_signal(columns);
        tracker.reset_budget(columns);
        tracker
    }

    // ── Metadata ──────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn columns(&self) -> AttributeColumns {
        self.cols
    }

    pub fn restriction(&self) -> Restriction {
        self.restriction
    }

    pub fn rate(&self) -> Option<f64> {
        self.rate
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    /// Current value, `None` while the attribute is inactive for this slot.
    #[inline]
    pub fn value(&self, columns: &Columns) -> Option<f64> {
        columns.get(self.cols.value, self.slot)
    }

    /// Current value, or `default` while inactive.
    #[inline]
    pub fn cur_value(&self, columns: &Columns, default: f64) -> f64 {
        self.value(columns).unwrap_or(default)
    }

    /// Scalar currently stored in `signal_X[slot]`.
    pub fn signal_value(&self, columns: &Columns) -> Option<f64> {
        columns.get(self.cols.signal, self.slot)
    }

    /// Remaining throughput this frame; `None` without a rate.
    pub fn time_budget(&self, columns: &Columns) -> Option<f64> {
        columns.get(self.cols.in_time, self.slot)
    }

    // ── Resets ────────────────────────────────────────────────────────────

    /// Value := `init_X[slot]`.
    pub fn reset(&self, columns: &mut Columns) {
        let init = columns.get(self.cols.init, self.slot);
        columns.set(self.cols.value, self.slot, init);
    }

    /// `signal_X[slot]` := non-violation entry.
    pub fn reset_signal(&self, columns: &mut Columns) {
        columns.set(self.cols.signal, self.slot, Some(self.signals.non_violation()));
    }

    /// `in_time_X[slot]` := rate (start of a new time frame).
    pub fn reset_budget(&self, columns: &mut Columns) {
        columns.set(self.cols.in_time, self.slot, self.rate);
    }

    /// Force the value to the upper bound.  No-op without one, or while the
    /// attribute is inactive.
    pub fn set_to_max(&self, columns: &mut Columns) {
        self.force(columns, self.restriction.max());
    }

    /// Force the value to the lower bound.  No-op without one, or while the
    /// attribute is inactive.
    pub fn set_to_min(&self, columns: &mut Columns) {
        self.force(columns, self.restriction.min());
    }

    fn force(&self, columns: &mut Columns, bound: Option<f64>) {
        if let (Some(b), Some(_)) = (bound, self.value(columns)) {
            columns.set(self.cols.value, self.slot, Some(b));
        }
    }

    // ── Mutations ─────────────────────────────────────────────────────────

    /// Add `delta` (clamped to the frame budget) and record the outcome.
    ///
    /// Returns the accumulator's new value.  While the attribute is inactive
    /// that value is reported but not stored.
    pub fn add_value(&self, columns: &mut Columns, delta: f64) -> f64 {
        let delta = self.clamp_to_budget(columns, sanitize(delta));
        let (new_value, signal) = self.restriction.add(self.value(columns), delta);
        self.update(columns, new_value, signal);
        new_value
    }

    /// Subtract `delta` (clamped to the frame budget) and record the outcome.
    pub fn subtract_value(&self, columns: &mut Columns, delta: f64) -> f64 {
        let delta = self.clamp_to_budget(columns, sanitize(delta));
        let (new_value, signal) = self.restriction.subtract(self.value(columns), delta);
        self.update(columns, new_value, signal);
        new_value
    }

    /// Commit `new_value` and `signal`.
    ///
    /// Consumes the magnitude of the change from the frame budget (floored at
    /// zero), overwrites the value only if one was already defined, and
    /// always writes the signal through the table.
    pub fn update(&self, columns: &mut Columns, new_value: f64, signal: Signal) {
        let old = self.value(columns);

        if let Some(budget) = self.time_budget(columns) {
            let used = match old {
                Some(o) => (o - new_value).abs(),
                None    => new_value.abs(),
            };
            columns.set(self.cols.in_time, self.slot, Some((budget - used).max(0.0)));
        }

        if old.is_some() {
            columns.set(self.cols.value, self.slot, Some(new_value));
        }

        if signal.is_violation() {
            trace!(attribute = %self.name, slot = self.slot, ?signal, "restriction violated");
        }
        columns.set(self.cols.signal, self.slot, Some(self.signals.value(signal)));
    }

    // ── Dry runs ──────────────────────────────────────────────────────────

    /// Magnitude that `add_value(delta)` would actually change right now.
    ///
    /// `None` asks for as much as possible (the full headroom to the upper
    /// bound).  With `respect_time_budget`, the request is first clamped to
    /// the frame budget, exactly as `add_value` would.  Returns `0.0` while
    /// the attribute is inactive, since nothing would be stored.
    pub fn check_add_value(
        &self,
        columns:             &Columns,
        delta:               Option<f64>,
        respect_time_budget: bool,
    ) -> f64 {
        let Some(cur) = self.value(columns) else {
            return 0.0;
        };
        let mut delta = delta.map_or_else(|| self.restriction.headroom_up(cur), sanitize);
        if respect_time_budget {
            delta = self.clamp_to_budget(columns, delta);
        }
        let (new_value, _) = self.restriction.add(Some(cur), delta);
        (new_value - cur).abs()
    }

    /// Magnitude that `subtract_value(delta)` would actually change right
    /// now.  See [`check_add_value`][Self::check_add_value].
    pub fn check_subtract_value(
        &self,
        columns:             &Columns,
        delta:               Option<f64>,
        respect_time_budget: bool,
    ) -> f64 {
        let Some(cur) = self.value(columns) else {
            return 0.0;
        };
        let mut delta = delta.map_or_else(|| self.restriction.headroom_down(cur), sanitize);
        if respect_time_budget {
            delta = self.clamp_to_budget(columns, delta);
        }
        let (new_value, _) = self.restriction.subtract(Some(cur), delta);
        (cur - new_value).abs()
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    #[inline]
    fn clamp_to_budget(&self, columns: &Columns, delta: f64) -> f64 {
        match self.time_budget(columns) {
            Some(budget) => delta.min(budget),
            None         => delta,
        }
    }
}

/// Deltas are magnitudes: negative and NaN requests become zero.
#[inline]
fn sanitize(delta: f64) -> f64 {
    delta.max(0.0)
}
