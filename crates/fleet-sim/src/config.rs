//! Scenario configuration, read from TOML.
//!
//! # Format
//!
//! ```toml
//! max_steps = 200
//! seed      = 7                       # omit to forbid random parameters
//! signals   = [1.0, 1.0, -1.0]        # non / semi / full violation
//!
//! [grid]
//! width  = 20
//! height = 20
//!
//! [[vehicles]]
//! kind        = "mother"
//! start       = { x = 0, y = 0 }
//! range_type  = "unlimited"
//! cargo       = { max = 20.0, min = 0.0, init = "min", rate = 10.0 }
//! cargo_v     = { max = 2.0,  min = 0.0, init = "min" }
//!
//! [[vehicles]]
//! kind        = "sub"
//! count       = 2
//! loadable    = true
//! travel_type = "aerial"
//! range_type  = "battery"
//! consumption = 2.0
//! battery     = { max = 100.0, min = 0.0, init = "max" }
//!
//! [[customers]]
//! at     = { x = 5, y = 3 }
//! demand = { max = { low = 1.0, high = 5.0 }, min = 0.0, init = "max" }
//!
//! [[depots]]
//! at    = { x = 0, y = 0 }
//! stock = { max = 500.0, min = 0.0, init = "max" }
//! ```
//!
//! Every restricted attribute is optional.  A vehicle without `cargo` cannot
//! carry cargo, a depot without `stock` supplies without limit, and a
//! customer without `demand` is served by its first delivery.

use std::path::Path;

use fleet_core::{Coord, Grid, RestrictionSpec, SignalTable};
use fleet_state::{RangeType, TravelType, VehicleKind};
use serde::{Deserialize, Serialize};

use crate::{SimError, SimResult};

fn default_max_steps() -> u32 {
    100
}

fn one_f64() -> f64 {
    1.0
}

fn one_u32() -> u32 {
    1
}

/// A complete scenario description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    pub grid: Grid,

    /// Seed for drawing random parameter expressions.  `None` means every
    /// parameter must be a literal.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Episode length limit.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    #[serde(default)]
    pub signals: SignalTable,

    #[serde(default)]
    pub vehicles: Vec<VehicleConfig>,

    #[serde(default)]
    pub customers: Vec<CustomerConfig>,

    #[serde(default)]
    pub depots: Vec<DepotConfig>,
}

/// One vehicle type, instantiated `count` times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleConfig {
    pub kind:  VehicleKind,
    pub start: Coord,

    #[serde(default = "one_u32")]
    pub count: u32,

    #[serde(default)]
    pub loadable: bool,

    #[serde(default)]
    pub travel_type: TravelType,

    #[serde(default)]
    pub range_type: RangeType,

    #[serde(default = "one_f64")]
    pub speed: f64,

    /// Range units consumed per grid cell travelled.
    #[serde(default = "one_f64")]
    pub consumption: f64,

    /// Trips drain the whole cost at once, so no `rate`.
    #[serde(default)]
    pub battery: Option<RestrictionSpec>,

    #[serde(default)]
    pub range: Option<RestrictionSpec>,

    /// Cargo hold.  `rate` limits how much can be moved in or out per step.
    #[serde(default)]
    pub cargo: Option<RestrictionSpec>,

    /// Sub-vehicle slots.  `rate` limits loads and unloads per step.
    #[serde(default)]
    pub cargo_v: Option<RestrictionSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerConfig {
    pub at: Coord,

    #[serde(default)]
    pub demand: Option<RestrictionSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepotConfig {
    pub at: Coord,

    #[serde(default)]
    pub stock: Option<RestrictionSpec>,
}

impl ScenarioConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> SimResult<Self> {
        let config: ScenarioConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_toml_file(path: &Path) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check the structural constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// [`SimError::Config`] for an empty grid, a position off the grid, a
    /// vehicle type with `count = 0`, a non-positive speed, a negative
    /// consumption, a range type whose attribute is not configured, or a
    /// `rate` on `battery` or `range`.
    pub fn validate(&self) -> SimResult<()> {
        let grid = self.grid;
        if grid.width == 0 || grid.height == 0 {
            return Err(SimError::Config(format!(
                "grid must be non-empty, got {}x{}",
                grid.width, grid.height
            )));
        }

        let on_grid = |what: &str, i: usize, c: Coord| {
            if grid.contains(c) {
                Ok(())
            } else {
                Err(SimError::Config(format!("{what} {i} at {c} lies outside the grid")))
            }
        };

        for (i, v) in self.vehicles.iter().enumerate() {
            on_grid("vehicle type", i, v.start)?;
            if v.count == 0 {
                return Err(SimError::Config(format!("vehicle type {i} has count = 0")));
            }
            if !(v.speed > 0.0) {
                return Err(SimError::Config(format!("vehicle type {i} has speed {}", v.speed)));
            }
            if !(v.consumption >= 0.0) {
                return Err(SimError::Config(format!(
                    "vehicle type {i} has consumption {}",
                    v.consumption
                )));
            }
            let missing = match v.range_type {
                RangeType::Battery   => v.battery.is_none().then_some("battery"),
                RangeType::Range     => v.range.is_none().then_some("range"),
                RangeType::Unlimited => None,
            };
            if let Some(attr) = missing {
                return Err(SimError::Config(format!(
                    "vehicle type {i} travels on {attr} but configures no {attr} restriction"
                )));
            }
            for (attr, spec) in [("battery", &v.battery), ("range", &v.range)] {
                if spec.as_ref().is_some_and(|s| s.rate.is_some()) {
                    return Err(SimError::Config(format!(
                        "vehicle type {i} sets a rate on {attr}, which travel does not honour"
                    )));
                }
            }
        }
        for (i, c) in self.customers.iter().enumerate() {
            on_grid("customer", i, c.at)?;
        }
        for (i, d) in self.depots.iter().enumerate() {
            on_grid("depot", i, d.at)?;
        }
        Ok(())
    }

    /// Total number of vehicles after expanding `count`.
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.iter().map(|v| v.count as usize).sum()
    }
}
