//! `fleet-state` — columnar state, bounded accumulators, and restricted-value
//! trackers for the fleet engine.
//!
//! # Crate layout
//!
//! | Module            | Contents                                                   |
//! |-------------------|------------------------------------------------------------|
//! | [`column`]        | `Columns` (named SoA columns), `AttributeColumns`          |
//! | [`restriction`]   | `Restriction` — the four bounded-accumulator variants      |
//! | [`tracker`]       | `RestrictedValue` — sole writer of one attribute slot      |
//! | [`action`]        | `ActionSignal`, `ActionSignals` (per-step outcome flags)   |
//! | [`entity`]        | `Vehicle`, `Customer`, `Depot`, `NodeRef`, `Group`         |
//! | [`index`]         | Nearest-neighbour scan, `Filter`, `ResolvedFilter`         |
//! | [`store`]         | `StateStore` (owner of everything above), `StepSignals`    |
//! | [`names`]         | Well-known column names                                    |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on entity kinds and step   |
//! |         | snapshots.                                                   |

pub mod action;
pub mod column;
pub mod entity;
pub mod error;
pub mod index;
pub mod names;
pub mod restriction;
pub mod store;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use action::{ActionSignal, ActionSignals};
pub use column::{AttributeColumns, ColumnId, Columns, CoordColumnId};
pub use entity::{Customer, Depot, Group, NodeRef, RangeType, TravelType, Vehicle, VehicleKind};
pub use error::{StateError, StateResult};
pub use index::{nearest, Filter, ResolvedFilter};
pub use restriction::Restriction;
pub use store::{
    AttributeSignals, FlagColumns, GroupCounts, NewVehicle, StateStore, StepSignals, Target,
    TrackerId,
};
pub use tracker::RestrictedValue;
