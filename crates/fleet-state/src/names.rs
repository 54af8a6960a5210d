//! Well-known column names.
//!
//! Restricted attributes additionally get `max_`, `min_`, `init_`, `signal_`
//! and `in_time_` prefixed columns (see [`AttributeColumns`][crate::AttributeColumns]).

// ── Coordinates ───────────────────────────────────────────────────────────────

pub const V_COORD: &str = "v_coord";
pub const C_COORD: &str = "c_coord";
pub const D_COORD: &str = "d_coord";

// ── Vehicle flags ─────────────────────────────────────────────────────────────

/// 1 while the vehicle may act on its own (not carried by a mother vehicle).
pub const V_FREE: &str = "v_free";
/// 1 once the vehicle ran out of range away from any resupply point.
pub const V_STUCK: &str = "v_stuck";
/// 1 while the vehicle is carried by a mother vehicle.
pub const V_LOADED: &str = "v_loaded";
/// 1 for mother vehicles (can carry others), 0 for sub vehicles.
pub const V_TYPE: &str = "v_type";
/// 1 if the vehicle can be carried.
pub const V_LOADABLE: &str = "v_loadable";
pub const SPEED: &str = "speed";
pub const TRAVEL_TYPE: &str = "travel_type";
pub const RANGE_TYPE: &str = "range_type";

// ── Node flags ────────────────────────────────────────────────────────────────

/// 1 while the customer still waits for service, 0 once served.
pub const C_WAITING: &str = "c_waiting";

// ── Restricted attributes ─────────────────────────────────────────────────────

pub const BATTERY: &str = "battery";
pub const RANGE: &str = "range";
pub const CARGO: &str = "cargo";
/// Sub-vehicle slots of a mother vehicle.
pub const CARGO_V: &str = "cargo_v";
pub const STOCK: &str = "stock";
pub const DEMAND: &str = "demand";
