//! The `DispatchPolicy` trait — the extension point for vehicle control.

use fleet_core::VehicleId;

use crate::{Action, DispatchContext};

/// Pluggable per-vehicle decision making.
///
/// The simulation calls [`decide`][Self::decide] once per vehicle per step,
/// in vehicle order, against the state as it was at the start of the step.
/// The returned actions are applied after every vehicle has decided.
///
/// Policies read state only through the context; anything that varies per
/// vehicle belongs in the store, not in the policy.
pub trait DispatchPolicy {
    /// Actions for `vehicle` this step.  An empty `Vec` means "wait".
    fn decide(&self, vehicle: VehicleId, ctx: &DispatchContext<'_>) -> Vec<Action>;
}
