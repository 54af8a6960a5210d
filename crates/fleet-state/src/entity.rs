//! Thin entity handles.
//!
//! Handles carry identity and static configuration only.  Everything that
//! changes during an episode lives in [`Columns`][crate::Columns].

use fleet_core::{Coord, CustomerId, DepotId, VehicleId};

/// Entity group.  Slots are numbered per group.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Group {
    Vehicle,
    Customer,
    Depot,
}

impl Group {
    pub fn as_str(self) -> &'static str {
        match self {
            Group::Vehicle  => "vehicle",
            Group::Customer => "customer",
            Group::Depot    => "depot",
        }
    }
}

/// Mother vehicles carry sub vehicles; sub vehicles can be carried.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(rename_all = "lowercase"))]
pub enum VehicleKind {
    Mother,
    Sub,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(rename_all = "lowercase"))]
pub enum TravelType {
    #[default]
    Ground,
    Aerial,
}

impl TravelType {
    pub fn code(self) -> f64 {
        match self {
            TravelType::Ground => 0.0,
            TravelType::Aerial => 1.0,
        }
    }
}

/// Which restricted attribute a trip consumes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(rename_all = "lowercase"))]
pub enum RangeType {
    /// Trips drain `battery`.
    Battery,
    /// Trips drain `range`.
    Range,
    /// Trips are free.
    #[default]
    Unlimited,
}

impl RangeType {
    pub fn code(self) -> f64 {
        match self {
            RangeType::Battery   => 0.0,
            RangeType::Range     => 1.0,
            RangeType::Unlimited => 2.0,
        }
    }
}

/// Static description of a vehicle at registration time.
#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub id:       VehicleId,
    pub kind:     VehicleKind,
    pub loadable: bool,
    /// Where the vehicle starts every episode.
    pub start:    Coord,
}

impl Vehicle {
    pub fn is_mother(&self) -> bool {
        self.kind == VehicleKind::Mother
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Customer {
    pub id:    CustomerId,
    pub coord: Coord,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Depot {
    pub id:    DepotId,
    pub coord: Coord,
}

/// A node a vehicle has visited this episode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Customer(CustomerId),
    Depot(DepotId),
}
