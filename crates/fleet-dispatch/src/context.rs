//! Read-only simulation state passed to every policy callback.

use fleet_state::StateStore;

/// A read-only view of the simulation for one step's decision phase.
///
/// Built once per step by the simulation layer and shared by every
/// [`DispatchPolicy::decide`][crate::DispatchPolicy::decide] call.  No
/// mutable access to the store exists while a context is live, so every
/// vehicle decides against the same state.
pub struct DispatchContext<'a> {
    /// Steps completed so far in this episode.
    pub step: u32,

    pub store: &'a StateStore,
}

impl<'a> DispatchContext<'a> {
    #[inline]
    pub fn new(step: u32, store: &'a StateStore) -> Self {
        Self { step, store }
    }
}
