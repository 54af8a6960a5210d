//! A policy that never acts.

use fleet_core::VehicleId;

use crate::{Action, DispatchContext, DispatchPolicy};

/// A [`DispatchPolicy`] that always returns an empty action list.
///
/// Useful as a placeholder in tests, or when every action comes from an
/// external controller through `Sim::step`.
pub struct IdlePolicy;

impl DispatchPolicy for IdlePolicy {
    fn decide(&self, _vehicle: VehicleId, _ctx: &DispatchContext<'_>) -> Vec<Action> {
        vec![]
    }
}
