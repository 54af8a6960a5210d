//! Per-vehicle, per-step action outcome flags.
//!
//! Each step every vehicle gets one scalar per [`ActionSignal`] kind.  They
//! start at `0.0` in `init_step` and are written by whoever applies an
//! action (the simulation layer), then handed to the reward stage in the
//! step snapshot.

/// What an action-outcome scalar describes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionSignal {
    /// Manhattan deviation between the commanded coordinate and the node it
    /// was matched to.
    CompareCoord,
    /// 1 if the vehicle was able to move (not transported, not stuck).
    FreeToTravel,
    /// Deviation between sub-vehicles requested for unloading and those
    /// actually unloaded.
    UnloadingV,
    /// 1 if the vehicle was able to unload a sub-vehicle.
    FreeToUnloadV,
    /// 1 if the sub-vehicle chosen for loading was actually loaded.
    FreeToBeLoadedV,
    /// 1 if the vehicle was able to load a sub-vehicle.
    FreeToLoadV,
    /// 1 if the vehicle was able to unload cargo.
    FreeToUnloadCargo,
    /// 1 if the vehicle was able to load cargo.
    FreeToLoadCargo,
}

impl ActionSignal {
    pub const ALL: [ActionSignal; 8] = [
        ActionSignal::CompareCoord,
        ActionSignal::FreeToTravel,
        ActionSignal::UnloadingV,
        ActionSignal::FreeToUnloadV,
        ActionSignal::FreeToBeLoadedV,
        ActionSignal::FreeToLoadV,
        ActionSignal::FreeToUnloadCargo,
        ActionSignal::FreeToLoadCargo,
    ];

    #[inline]
    fn ordinal(self) -> usize {
        self as usize
    }

    /// Snake-case label, matching the keys reward code expects.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionSignal::CompareCoord      => "compare_coord",
            ActionSignal::FreeToTravel      => "free_to_travel",
            ActionSignal::UnloadingV        => "unloading_v",
            ActionSignal::FreeToUnloadV     => "free_to_unload_v",
            ActionSignal::FreeToBeLoadedV   => "free_to_be_loaded_v",
            ActionSignal::FreeToLoadV       => "free_to_load_v",
            ActionSignal::FreeToUnloadCargo => "free_to_unload_cargo",
            ActionSignal::FreeToLoadCargo   => "free_to_load_cargo",
        }
    }
}

impl std::fmt::Display for ActionSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One independent `Vec<f64>` per kind, each `vehicle_count` long.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionSignals {
    kinds: [Vec<f64>; 8],
}

impl ActionSignals {
    /// Zero every kind and resize to `vehicle_count`.
    pub fn reset(&mut self, vehicle_count: usize) {
        for v in &mut self.kinds {
            v.clear();
            v.resize(vehicle_count, 0.0);
        }
    }

    /// Value for `vehicle`; `0.0` for a slot beyond the current length.
    #[inline]
    pub fn get(&self, kind: ActionSignal, vehicle: usize) -> f64 {
        self.kinds[kind.ordinal()].get(vehicle).copied().unwrap_or(0.0)
    }

    /// Write `value` for `vehicle`.  Out-of-range slots are ignored.
    #[inline]
    pub fn set(&mut self, kind: ActionSignal, vehicle: usize, value: f64) {
        if let Some(v) = self.kinds[kind.ordinal()].get_mut(vehicle) {
            *v = value;
        }
    }

    /// All vehicles' values for `kind`.
    pub fn column(&self, kind: ActionSignal) -> &[f64] {
        &self.kinds[kind.ordinal()]
    }

    pub fn vehicle_count(&self) -> usize {
        self.kinds[0].len()
    }
}
