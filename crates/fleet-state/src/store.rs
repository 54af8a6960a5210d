//! `StateStore` — the single owner of all simulation state.
//!
//! # Why trackers and columns are separate fields
//!
//! A tracker mutation needs `&RestrictedValue` (its keys and accumulator)
//! and `&mut Columns` (the data) at the same time.  Holding both in one
//! struct and borrowing them as disjoint fields lets the store lend its
//! columns to its own trackers without cloning either:
//!
//! ```ignore
//! let (trackers, columns) = (&self.trackers, &mut self.columns);
//! trackers[id.index()].add_value(columns, delta)
//! ```
//!
//! # Step protocol
//!
//! ```text
//! reset_episode()            once per episode
//! loop {
//!     init_step()            zero action signals, reset restriction signals
//!                            and per-frame budgets
//!     add_value / subtract_value / check_* / set_flag …
//!     finish_step()          snapshot signal_X columns + action signals
//! }
//! ```

use fleet_core::{
    Coord, CustomerId, DepotId, FixedResolver, Grid, InitParam, Param, ParamResolver,
    ResolvedRestriction, RestrictionSpec, SignalTable, VehicleId,
};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::column::{AttributeColumns, ColumnId, Columns, CoordColumnId};
use crate::entity::{Customer, Depot, Group, NodeRef, RangeType, TravelType, Vehicle, VehicleKind};
use crate::index::{nearest, ResolvedFilter};
use crate::{names, ActionSignal, ActionSignals, RestrictedValue, StateError, StateResult};

// ── Handles ───────────────────────────────────────────────────────────────────

/// Handle to a tracker owned by the store.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TrackerId(pub u32);

impl TrackerId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handles of the flag and coordinate columns every store registers up
/// front.
#[derive(Copy, Clone, Debug)]
pub struct FlagColumns {
    pub v_coord:     CoordColumnId,
    pub c_coord:     CoordColumnId,
    pub d_coord:     CoordColumnId,
    pub v_free:      ColumnId,
    pub v_stuck:     ColumnId,
    pub v_loaded:    ColumnId,
    pub v_type:      ColumnId,
    pub v_loadable:  ColumnId,
    pub speed:       ColumnId,
    pub travel_type: ColumnId,
    pub range_type:  ColumnId,
    pub c_waiting:   ColumnId,
}

impl FlagColumns {
    fn register(columns: &mut Columns) -> Self {
        Self {
            v_coord:     columns.register_coords(names::V_COORD),
            c_coord:     columns.register_coords(names::C_COORD),
            d_coord:     columns.register_coords(names::D_COORD),
            v_free:      columns.register_scalar(names::V_FREE),
            v_stuck:     columns.register_scalar(names::V_STUCK),
            v_loaded:    columns.register_scalar(names::V_LOADED),
            v_type:      columns.register_scalar(names::V_TYPE),
            v_loadable:  columns.register_scalar(names::V_LOADABLE),
            speed:       columns.register_scalar(names::SPEED),
            travel_type: columns.register_scalar(names::TRAVEL_TYPE),
            range_type:  columns.register_scalar(names::RANGE_TYPE),
            c_waiting:   columns.register_scalar(names::C_WAITING),
        }
    }
}

/// Which coordinate column a nearest-neighbour query scans.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Vehicles,
    Customers,
    Depots,
}

/// Registration-time data of a new vehicle.
#[derive(Clone, Debug, PartialEq)]
pub struct NewVehicle {
    pub kind:     VehicleKind,
    pub loadable: bool,
    pub start:    Coord,
}

/// Entity counts, recomputed by `reset_episode`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupCounts {
    pub vehicles:  usize,
    pub customers: usize,
    pub depots:    usize,
}

impl GroupCounts {
    pub fn nodes(&self) -> usize {
        self.customers + self.depots
    }
}

// ── Step snapshot ─────────────────────────────────────────────────────────────

/// `signal_X` column of one restricted attribute at the end of a step.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeSignals {
    pub attribute: String,
    /// Indexed by slot.  `None` for slots without this attribute.
    pub signals:   Vec<Option<f64>>,
}

/// Everything the reward stage needs from one step.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepSignals {
    /// One entry per restricted attribute, in registration order.
    pub restrictions: Vec<AttributeSignals>,
    pub actions:      ActionSignals,
}

impl StepSignals {
    /// Signals of attribute `name`, if it is tracked.
    pub fn attribute(&self, name: &str) -> Option<&[Option<f64>]> {
        self.restrictions
            .iter()
            .find(|a| a.attribute == name)
            .map(|a| a.signals.as_slice())
    }
}

// ── StateStore ────────────────────────────────────────────────────────────────

/// Columnar registry of every simulation value plus the trackers that guard
/// the restricted ones.
pub struct StateStore {
    grid:    Grid,
    signals: SignalTable,

    columns: Columns,
    flags:   FlagColumns,

    trackers:       Vec<RestrictedValue>,
    tracker_lookup: FxHashMap<(ColumnId, usize), TrackerId>,
    /// Restricted attributes in registration order with their group and
    /// signal column.
    attributes:     Vec<(String, Group, ColumnId)>,

    vehicles:  Vec<Vehicle>,
    customers: Vec<Customer>,
    depots:    Vec<Depot>,
    counts:    GroupCounts,

    /// Sub vehicles carried by each vehicle, in load order.
    transporting: Vec<Vec<VehicleId>>,
    /// Nodes each vehicle has visited this episode.
    visited:      Vec<Vec<NodeRef>>,
    actions:      ActionSignals,
}

impl StateStore {
    pub fn new(grid: Grid, signals: SignalTable) -> Self {
        let mut columns = Columns::new();
        let flags = FlagColumns::register(&mut columns);
        Self {
            grid,
            signals,
            columns,
            flags,
            trackers: Vec::new(),
            tracker_lookup: FxHashMap::default(),
            attributes: Vec::new(),
            vehicles: Vec::new(),
            customers: Vec::new(),
            depots: Vec::new(),
            counts: GroupCounts::default(),
            transporting: Vec::new(),
            visited: Vec::new(),
            actions: ActionSignals::default(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn signal_table(&self) -> SignalTable {
        self.signals
    }

    /// Read-only view of every column (observation encoders, filters).
    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn flags(&self) -> FlagColumns {
        self.flags
    }

    pub fn counts(&self) -> GroupCounts {
        self.counts
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn depots(&self) -> &[Depot] {
        &self.depots
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id.index())
    }

    pub fn vehicle_ids(&self) -> impl Iterator<Item = VehicleId> + '_ {
        (0..self.vehicles.len() as u32).map(VehicleId)
    }

    pub fn actions(&self) -> &ActionSignals {
        &self.actions
    }

    fn group_len(&self, group: Group) -> usize {
        match group {
            Group::Vehicle  => self.vehicles.len(),
            Group::Customer => self.customers.len(),
            Group::Depot    => self.depots.len(),
        }
    }

    // ── Entity registration ───────────────────────────────────────────────

    /// Append a vehicle and seed its flag columns.
    pub fn register_vehicle(
        &mut self,
        vehicle:     NewVehicle,
        travel_type: TravelType,
        range_type:  RangeType,
        speed:       f64,
    ) -> VehicleId {
        let id = VehicleId(self.vehicles.len() as u32);
        let slot = id.index();
        let f = self.flags;
        let is_mother = vehicle.kind == VehicleKind::Mother;

        self.columns.set_coord(f.v_coord, slot, vehicle.start);
        self.columns.set(f.v_free, slot, Some(1.0));
        self.columns.set(f.v_stuck, slot, Some(0.0));
        self.columns.set(f.v_loaded, slot, Some(0.0));
        self.columns.set(f.v_type, slot, Some(flag(is_mother)));
        self.columns.set(f.v_loadable, slot, Some(flag(vehicle.loadable)));
        self.columns.set(f.speed, slot, Some(speed));
        self.columns.set(f.travel_type, slot, Some(travel_type.code()));
        self.columns.set(f.range_type, slot, Some(range_type.code()));

        self.vehicles.push(Vehicle {
            id,
            kind: vehicle.kind,
            loadable: vehicle.loadable,
            start: vehicle.start,
        });
        self.transporting.push(Vec::new());
        self.visited.push(Vec::new());
        id
    }

    /// Append a customer at `coord`, initially waiting.
    pub fn register_customer(&mut self, coord: Coord) -> CustomerId {
        let id = CustomerId(self.customers.len() as u32);
        self.columns.set_coord(self.flags.c_coord, id.index(), coord);
        self.columns.set(self.flags.c_waiting, id.index(), Some(1.0));
        self.customers.push(Customer { id, coord });
        id
    }

    /// Append a depot at `coord`.
    pub fn register_depot(&mut self, coord: Coord) -> DepotId {
        let id = DepotId(self.depots.len() as u32);
        self.columns.set_coord(self.flags.d_coord, id.index(), coord);
        self.depots.push(Depot { id, coord });
        id
    }

    // ── Attribute registration ────────────────────────────────────────────

    /// Register the value and derived columns of `name` for entity `slot`
    /// of `group` without creating a tracker.
    ///
    /// The attribute joins the [`finish_step`][Self::finish_step] snapshot;
    /// its signal stays empty until something tracks it.
    ///
    /// # Errors
    ///
    /// As [`track`][Self::track], with the bounds checked the way a literal
    /// [`RestrictionSpec`] is.
    pub fn register_attribute(
        &mut self,
        group: Group,
        name:  &str,
        slot:  usize,
        max:   Option<f64>,
        min:   Option<f64>,
        init:  Option<f64>,
    ) -> StateResult<AttributeColumns> {
        self.check_new_attribute(group, name, slot)?;
        let spec = RestrictionSpec {
            max:  max.map(Param::Value),
            min:  min.map(Param::Value),
            init: init.map(InitParam::from),
            rate: None,
        };
        ResolvedRestriction::resolve(name, &spec, &mut FixedResolver)?;

        let cols = self.columns.register_attribute(name, slot, max, min, init);
        self.note_attribute(name, group, cols.signal);
        Ok(cols)
    }

    /// Create the tracker for attribute `name` of entity `slot` in `group`.
    ///
    /// # Errors
    ///
    /// - [`StateError::UnknownEntity`] if `slot` is not registered in `group`.
    /// - [`StateError::GroupConflict`] if `name` already belongs to another
    ///   group (slots of different groups would collide in one column).
    /// - [`StateError::DuplicateTracker`] if `(name, slot)` is already
    ///   tracked.
    /// - Any configuration error from resolving `spec`.
    pub fn track<R: ParamResolver + ?Sized>(
        &mut self,
        group:    Group,
        name:     &str,
        slot:     usize,
        spec:     &RestrictionSpec,
        resolver: &mut R,
    ) -> StateResult<TrackerId> {
        self.check_new_attribute(group, name, slot)?;

        let resolved = ResolvedRestriction::resolve(name, spec, resolver)?;
        let tracker = RestrictedValue::new(&mut self.columns, name, slot, resolved, self.signals);
        let cols = tracker.columns();
        self.note_attribute(name, group, cols.signal);

        let id = TrackerId(self.trackers.len() as u32);
        self.tracker_lookup.insert((cols.value, slot), id);
        self.trackers.push(tracker);
        Ok(id)
    }

    fn check_new_attribute(&self, group: Group, name: &str, slot: usize) -> StateResult<()> {
        if slot >= self.group_len(group) {
            return Err(StateError::UnknownEntity { group: group.as_str(), slot });
        }
        if let Some((_, existing, _)) = self.attributes.iter().find(|(n, _, _)| n == name) {
            if *existing != group {
                return Err(StateError::GroupConflict {
                    attribute: name.to_owned(),
                    existing:  existing.as_str(),
                    requested: group.as_str(),
                });
            }
        }
        if let Ok(value_col) = self.columns.scalar_id(name) {
            if self.tracker_lookup.contains_key(&(value_col, slot)) {
                return Err(StateError::DuplicateTracker { attribute: name.to_owned(), slot });
            }
        }
        Ok(())
    }

    fn note_attribute(&mut self, name: &str, group: Group, signal: ColumnId) {
        if !self.attributes.iter().any(|(n, _, _)| n == name) {
            self.attributes.push((name.to_owned(), group, signal));
        }
    }

    /// Tracker for `(name, slot)`, if one was created.
    pub fn find_tracker(&self, name: &str, slot: usize) -> Option<TrackerId> {
        let col = self.columns.scalar_id(name).ok()?;
        self.tracker_lookup.get(&(col, slot)).copied()
    }

    pub fn tracker(&self, id: TrackerId) -> &RestrictedValue {
        &self.trackers[id.index()]
    }

    pub fn tracker_count(&self) -> usize {
        self.trackers.len()
    }

    /// Restricted attribute names in registration order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.attributes.iter().map(|(n, _, _)| n.as_str())
    }

    // ── Tracker operations ────────────────────────────────────────────────

    pub fn value(&self, id: TrackerId) -> Option<f64> {
        self.trackers[id.index()].value(&self.columns)
    }

    pub fn cur_value(&self, id: TrackerId, default: f64) -> f64 {
        self.trackers[id.index()].cur_value(&self.columns, default)
    }

    pub fn signal_value(&self, id: TrackerId) -> Option<f64> {
        self.trackers[id.index()].signal_value(&self.columns)
    }

    pub fn time_budget(&self, id: TrackerId) -> Option<f64> {
        self.trackers[id.index()].time_budget(&self.columns)
    }

    pub fn add_value(&mut self, id: TrackerId, delta: f64) -> f64 {
        let (trackers, columns) = (&self.trackers, &mut self.columns);
        trackers[id.index()].add_value(columns, delta)
    }

    pub fn subtract_value(&mut self, id: TrackerId, delta: f64) -> f64 {
        let (trackers, columns) = (&self.trackers, &mut self.columns);
        trackers[id.index()].subtract_value(columns, delta)
    }

    pub fn check_add_value(&self, id: TrackerId, delta: Option<f64>, respect_time_budget: bool) -> f64 {
        self.trackers[id.index()].check_add_value(&self.columns, delta, respect_time_budget)
    }

    pub fn check_subtract_value(&self, id: TrackerId, delta: Option<f64>, respect_time_budget: bool) -> f64 {
        self.trackers[id.index()].check_subtract_value(&self.columns, delta, respect_time_budget)
    }

    pub fn set_to_max(&mut self, id: TrackerId) {
        let (trackers, columns) = (&self.trackers, &mut self.columns);
        trackers[id.index()].set_to_max(columns);
    }

    pub fn set_to_min(&mut self, id: TrackerId) {
        let (trackers, columns) = (&self.trackers, &mut self.columns);
        trackers[id.index()].set_to_min(columns);
    }

    // ── Flags and coordinates ─────────────────────────────────────────────

    /// Scalar at `slot` of an unrestricted column (flags, speed, …).
    #[inline]
    pub fn flag(&self, column: ColumnId, slot: usize) -> Option<f64> {
        self.columns.get(column, slot)
    }

    /// Write an unrestricted column.  Restricted value columns must go
    /// through their tracker instead.
    #[inline]
    pub fn set_flag(&mut self, column: ColumnId, slot: usize, value: f64) {
        debug_assert!(
            !self.tracker_lookup.contains_key(&(column, slot)),
            "restricted column {} written directly",
            self.columns.name(column),
        );
        self.columns.set(column, slot, Some(value));
    }

    pub fn is_free(&self, v: VehicleId) -> bool {
        self.flag(self.flags.v_free, v.index()) == Some(1.0)
    }

    pub fn vehicle_coord(&self, v: VehicleId) -> Option<Coord> {
        self.columns.coord(self.flags.v_coord, v.index())
    }

    pub fn set_vehicle_coord(&mut self, v: VehicleId, c: Coord) {
        self.columns.set_coord(self.flags.v_coord, v.index(), c);
    }

    pub fn customer_coord(&self, c: CustomerId) -> Option<Coord> {
        self.columns.coord(self.flags.c_coord, c.index())
    }

    pub fn depot_coord(&self, d: DepotId) -> Option<Coord> {
        self.columns.coord(self.flags.d_coord, d.index())
    }

    fn target_column(&self, target: Target) -> CoordColumnId {
        match target {
            Target::Vehicles  => self.flags.v_coord,
            Target::Customers => self.flags.c_coord,
            Target::Depots    => self.flags.d_coord,
        }
    }

    // ── Transport and visit history ───────────────────────────────────────

    /// Sub vehicles currently carried by `mother`, oldest first.
    pub fn transported_by(&self, mother: VehicleId) -> &[VehicleId] {
        self.transporting.get(mother.index()).map_or(&[], Vec::as_slice)
    }

    pub fn push_transported(&mut self, mother: VehicleId, sub: VehicleId) {
        if let Some(list) = self.transporting.get_mut(mother.index()) {
            list.push(sub);
        }
    }

    /// Remove `sub` from `mother`'s load.  `false` if it was not aboard.
    pub fn remove_transported(&mut self, mother: VehicleId, sub: VehicleId) -> bool {
        let Some(list) = self.transporting.get_mut(mother.index()) else {
            return false;
        };
        match list.iter().position(|&s| s == sub) {
            Some(pos) => {
                list.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn visited(&self, v: VehicleId) -> &[NodeRef] {
        self.visited.get(v.index()).map_or(&[], Vec::as_slice)
    }

    /// Record a visit.  Repeated visits are stored once.
    pub fn mark_visited(&mut self, v: VehicleId, node: NodeRef) {
        if let Some(list) = self.visited.get_mut(v.index()) {
            if !list.contains(&node) {
                list.push(node);
            }
        }
    }

    // ── Action signals ────────────────────────────────────────────────────

    pub fn set_action(&mut self, kind: ActionSignal, v: VehicleId, value: f64) {
        self.actions.set(kind, v.index(), value);
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Return every value to its configured initial state.  Column layout is
    /// untouched.
    pub fn reset_episode(&mut self) {
        self.counts = GroupCounts {
            vehicles:  self.vehicles.len(),
            customers: self.customers.len(),
            depots:    self.depots.len(),
        };

        let (trackers, columns) = (&self.trackers, &mut self.columns);
        for t in trackers {
            t.reset(columns);
            t.reset_signal(columns);
            t.reset_budget(columns);
        }

        let f = self.flags;
        for v in &self.vehicles {
            let slot = v.id.index();
            self.columns.set_coord(f.v_coord, slot, v.start);
            self.columns.set(f.v_free, slot, Some(1.0));
            self.columns.set(f.v_stuck, slot, Some(0.0));
            self.columns.set(f.v_loaded, slot, Some(0.0));
        }
        for c in &self.customers {
            self.columns.set(f.c_waiting, c.id.index(), Some(1.0));
        }

        self.transporting = vec![Vec::new(); self.counts.vehicles];
        self.visited = vec![Vec::new(); self.counts.vehicles];
        self.actions.reset(self.counts.vehicles);

        debug!(
            vehicles  = self.counts.vehicles,
            customers = self.counts.customers,
            depots    = self.counts.depots,
            trackers  = self.trackers.len(),
            "episode reset",
        );
    }

    /// Open a step: zero action signals, reset restriction signals, and
    /// start a new time frame for every rate-limited tracker.
    pub fn init_step(&mut self) {
        self.actions.reset(self.vehicles.len());
        let (trackers, columns) = (&self.trackers, &mut self.columns);
        for t in trackers {
            t.reset_signal(columns);
            t.reset_budget(columns);
        }
    }

    /// Close a step: snapshot every restricted attribute's signal column
    /// and the action signals.
    pub fn finish_step(&self) -> StepSignals {
        let restrictions = self
            .attributes
            .iter()
            .map(|(name, group, signal_col)| {
                let len = self.group_len(*group);
                let mut signals = self.columns.scalar(*signal_col).to_vec();
                signals.resize(len, None);
                AttributeSignals { attribute: name.clone(), signals }
            })
            .collect();
        StepSignals { restrictions, actions: self.actions.clone() }
    }

    // ── Dispatch index ────────────────────────────────────────────────────

    /// Slot in `target` nearest (Manhattan) to vehicle `v`.
    ///
    /// With `exclude_visited`, nodes in `v`'s visit history are never
    /// returned.  Ties resolve to the lowest slot.  `None` if `v` is unknown
    /// or nothing qualifies.
    pub fn nearest_neighbour(&self, v: VehicleId, target: Target, exclude_visited: bool) -> Option<usize> {
        self.nearest_filtered(v, target, &ResolvedFilter::default(), exclude_visited)
    }

    /// [`nearest_neighbour`][Self::nearest_neighbour] restricted to slots
    /// that `filter` admits.
    pub fn nearest_filtered(
        &self,
        v:               VehicleId,
        target:          Target,
        filter:          &ResolvedFilter,
        exclude_visited: bool,
    ) -> Option<usize> {
        let from = self.vehicle_coord(v)?;
        let visited = self.visited(v);
        let candidates = self.columns.coords(self.target_column(target));
        nearest(from, candidates, |slot| {
            if exclude_visited && is_visited(visited, target, slot) {
                return false;
            }
            filter.admits(&self.columns, slot)
        })
    }
}

fn is_visited(visited: &[NodeRef], target: Target, slot: usize) -> bool {
    visited.iter().any(|node| match (*node, target) {
        (NodeRef::Customer(c), Target::Customers) => c.index() == slot,
        (NodeRef::Depot(d), Target::Depots)       => d.index() == slot,
        _ => false,
    })
}

#[inline]
fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}
