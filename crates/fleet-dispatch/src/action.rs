//! Vehicle actions — what a policy asks the simulation to do.

use fleet_core::{Coord, VehicleId};

/// One request for one vehicle in the current step.
///
/// Actions are produced by [`DispatchPolicy::decide`][crate::DispatchPolicy::decide]
/// and applied by the simulation layer in submission order.  An action that
/// cannot be carried out is not an error: it leaves state untouched and
/// shows up in the step's action signals.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(tag = "action", rename_all = "snake_case"))]
pub enum Action {
    /// Drive or fly to the node nearest `target`.
    MoveTo {
        vehicle: VehicleId,
        target:  Coord,
    },

    /// Take cargo from the depot at the vehicle's position.
    ///
    /// `None` asks for as much as the vehicle, the depot and this step's
    /// throughput allow.
    LoadCargo {
        vehicle: VehicleId,
        amount:  Option<f64>,
    },

    /// Deliver cargo to the customer at the vehicle's position.
    UnloadCargo {
        vehicle: VehicleId,
        amount:  Option<f64>,
    },

    /// `mother` picks up the co-located sub vehicle `sub`.
    LoadVehicle {
        mother: VehicleId,
        sub:    VehicleId,
    },

    /// `mother` releases `sub`, or the oldest carried vehicle when `None`.
    UnloadVehicle {
        mother: VehicleId,
        sub:    Option<VehicleId>,
    },
}

impl Action {
    /// The vehicle that performs the action.
    pub fn actor(&self) -> VehicleId {
        match *self {
            Action::MoveTo { vehicle, .. }
            | Action::LoadCargo { vehicle, .. }
            | Action::UnloadCargo { vehicle, .. } => vehicle,
            Action::LoadVehicle { mother, .. } | Action::UnloadVehicle { mother, .. } => mother,
        }
    }
}
