//! Named, append-only columns indexed by entity slot.
//!
//! # Design
//!
//! Every simulation scalar lives in a `Vec<Option<f64>>` registered under a
//! name (`battery`, `max_battery`, `v_free`, …); every coordinate lives in a
//! `Vec<Coord>` registered the same way (`v_coord`, `c_coord`, `d_coord`).
//! Lookups by name happen once, at registration; afterwards callers hold a
//! [`ColumnId`] and index directly, so the per-step hot path never hashes a
//! string.
//!
//! Columns are created lazily in registration order and only ever grow.  A
//! column is extended with `None` up to the slot being written, which keeps
//! slot `i` aligned across every column of an entity group even when an
//! attribute exists for only some of its members.
//!
//! `None` means "no value for this slot": an inactive attribute, or an
//! absent bound in a `max_*` / `min_*` column.  It is never conflated with
//! `0.0`.
//!
//! # Usage
//!
//! ```rust
//! use fleet_state::Columns;
//!
//! let mut cols = Columns::new();
//! let battery = cols.register_scalar("battery");
//! cols.set(battery, 2, Some(80.0));
//! assert_eq!(cols.get(battery, 2), Some(80.0));
//! assert_eq!(cols.get(battery, 0), None); // padded, not zero
//! ```

use fleet_core::Coord;
use rustc_hash::FxHashMap;

use crate::{StateError, StateResult};

/// Handle to a registered scalar column.  Stable for the store's lifetime.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ColumnId(pub u32);

impl ColumnId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a registered coordinate column.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct CoordColumnId(pub u32);

impl CoordColumnId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

struct ScalarColumn {
    name:   String,
    values: Vec<Option<f64>>,
}

struct CoordColumn {
    values: Vec<Coord>,
}

/// Registry of every named column, in registration order.
#[derive(Default)]
pub struct Columns {
    scalars:       Vec<ScalarColumn>,
    scalar_lookup: FxHashMap<String, ColumnId>,
    coords:        Vec<CoordColumn>,
    coord_lookup:  FxHashMap<String, CoordColumnId>,
}

impl Columns {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Register scalar column `name`, returning its handle.
    ///
    /// Calling this twice for the same name is a no-op that returns the
    /// existing handle; existing data is not disturbed.
    pub fn register_scalar(&mut self, name: &str) -> ColumnId {
        if let Some(&id) = self.scalar_lookup.get(name) {
            return id;
        }
        let id = ColumnId(self.scalars.len() as u32);
        self.scalars.push(ScalarColumn { name: name.to_owned(), values: Vec::new() });
        self.scalar_lookup.insert(name.to_owned(), id);
        id
    }

    /// Register coordinate column `name`, returning its handle.  Idempotent.
    pub fn register_coords(&mut self, name: &str) -> CoordColumnId {
        if let Some(&id) = self.coord_lookup.get(name) {
            return id;
        }
        let id = CoordColumnId(self.coords.len() as u32);
        self.coords.push(CoordColumn { values: Vec::new() });
        self.coord_lookup.insert(name.to_owned(), id);
        id
    }

    // ── Name resolution ───────────────────────────────────────────────────

    /// Handle of an already-registered scalar column.
    ///
    /// # Errors
    ///
    /// [`StateError::UnknownColumn`] if `name` was never registered.
    pub fn scalar_id(&self, name: &str) -> StateResult<ColumnId> {
        self.scalar_lookup
            .get(name)
            .copied()
            .ok_or_else(|| StateError::UnknownColumn(name.to_owned()))
    }

    /// Handle of an already-registered coordinate column.
    pub fn coord_id(&self, name: &str) -> StateResult<CoordColumnId> {
        self.coord_lookup
            .get(name)
            .copied()
            .ok_or_else(|| StateError::UnknownColumn(name.to_owned()))
    }

    pub fn name(&self, id: ColumnId) -> &str {
        &self.scalars[id.index()].name
    }

    /// Scalar column names in registration order.
    pub fn scalar_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.scalars.iter().map(|c| c.name.as_str())
    }

    // ── Scalar access ─────────────────────────────────────────────────────

    /// Value at `slot`, or `None` if the slot is inactive or beyond the
    /// column's current length.
    #[inline]
    pub fn get(&self, id: ColumnId, slot: usize) -> Option<f64> {
        self.scalars[id.index()].values.get(slot).copied().flatten()
    }

    /// Write `value` at `slot`, padding the column with `None` as needed.
    #[inline]
    pub fn set(&mut self, id: ColumnId, slot: usize, value: Option<f64>) {
        let values = &mut self.scalars[id.index()].values;
        if values.len() <= slot {
            values.resize(slot + 1, None);
        }
        values[slot] = value;
    }

    /// Pad the column with `None` up to `len` entries.  Never shrinks.
    pub fn grow_to(&mut self, id: ColumnId, len: usize) {
        let values = &mut self.scalars[id.index()].values;
        if values.len() < len {
            values.resize(len, None);
        }
    }

    /// Whole column as a slice (for observation encoders and signal
    /// snapshots).
    pub fn scalar(&self, id: ColumnId) -> &[Option<f64>] {
        &self.scalars[id.index()].values
    }

    // ── Coordinate access ─────────────────────────────────────────────────

    /// Coordinate at `slot`, or `None` beyond the column's length.
    #[inline]
    pub fn coord(&self, id: CoordColumnId, slot: usize) -> Option<Coord> {
        self.coords[id.index()].values.get(slot).copied()
    }

    /// Write `c` at `slot`, padding with the origin as needed.
    pub fn set_coord(&mut self, id: CoordColumnId, slot: usize, c: Coord) {
        let values = &mut self.coords[id.index()].values;
        if values.len() <= slot {
            values.resize(slot + 1, Coord::default());
        }
        values[slot] = c;
    }

    pub fn coords(&self, id: CoordColumnId) -> &[Coord] {
        &self.coords[id.index()].values
    }

    // ── Metadata ──────────────────────────────────────────────────────────

    /// Number of distinct scalar columns currently registered.
    pub fn scalar_count(&self) -> usize {
        self.scalars.len()
    }

    /// `true` if scalar column `name` has been registered.
    pub fn contains(&self, name: &str) -> bool {
        self.scalar_lookup.contains_key(name)
    }
}

// ── Restricted-attribute column set ───────────────────────────────────────────

/// The six columns that back one restricted attribute `X`:
/// `X`, `max_X`, `min_X`, `init_X`, `signal_X`, `in_time_X`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AttributeColumns {
    pub value:   ColumnId,
    pub max:     ColumnId,
    pub min:     ColumnId,
    pub init:    ColumnId,
    pub signal:  ColumnId,
    pub in_time: ColumnId,
}

impl Columns {
    /// Register (or look up) the six columns of attribute `name` and write
    /// the configured bounds and initial value at `slot`.
    ///
    /// The value column starts at `init`; `signal_X` and `in_time_X` start
    /// empty and are seeded by the tracker.
    pub fn register_attribute(
        &mut self,
        name: &str,
        slot: usize,
        max:  Option<f64>,
        min:  Option<f64>,
        init: Option<f64>,
    ) -> AttributeColumns {
        let cols = AttributeColumns {
            value:   self.register_scalar(name),
            max:     self.register_scalar(&format!("max_{name}")),
            min:     self.register_scalar(&format!("min_{name}")),
            init:    self.register_scalar(&format!("init_{name}")),
            signal:  self.register_scalar(&format!("signal_{name}")),
            in_time: self.register_scalar(&format!("in_time_{name}")),
        };
        self.set(cols.value, slot, init);
        self.set(cols.max, slot, max);
        self.set(cols.min, slot, min);
        self.set(cols.init, slot, init);
        self.grow_to(cols.signal, slot + 1);
        self.grow_to(cols.in_time, slot + 1);
        cols
    }
}
