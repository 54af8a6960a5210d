//! `fleet-core` — foundational types for the fleet restriction engine.
//!
//! This crate is a dependency of every other `fleet-*` crate.  It has no
//! `fleet-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `VehicleId`, `CustomerId`, `DepotId`                  |
//! | [`geo`]         | `Coord`, `Grid`, Manhattan distance                   |
//! | [`signal`]      | `Signal` (tri-state outcome), `SignalTable`           |
//! | [`param`]       | `Param`, `InitParam`, `ParamResolver` implementations |
//! | [`rng`]         | `SimRng` (seeded, deterministic)                      |
//! | [`error`]       | `FleetError`, `FleetResult`                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required by the scenario loader in `fleet-sim`.            |

pub mod error;
pub mod geo;
pub mod ids;
pub mod param;
pub mod rng;
pub mod signal;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{FleetError, FleetResult};
pub use geo::{Coord, Grid};
pub use ids::{CustomerId, DepotId, VehicleId};
pub use param::{
    BoundSide, FixedResolver, InitParam, Param, ParamResolver, ResolvedRestriction,
    RestrictionSpec, RngResolver,
};
pub use rng::SimRng;
pub use signal::{Signal, SignalTable};
