//! The `Sim` struct, action application, and the step loop.

use fleet_core::{Coord, CustomerId, DepotId, VehicleId};
use fleet_dispatch::{Action, AutoAgent, DispatchContext, DispatchPolicy};
use fleet_state::{nearest, ActionSignal, NodeRef, RangeType, StateStore, StepSignals, TrackerId};
use tracing::{debug, trace, warn};

use crate::{SimResult, StepObserver};

// ── Per-vehicle wiring ────────────────────────────────────────────────────────

/// Trackers and travel parameters of one vehicle, fixed at build time.
#[derive(Copy, Clone, Debug)]
pub(crate) struct VehicleTrackers {
    pub battery:     Option<TrackerId>,
    pub range:       Option<TrackerId>,
    pub cargo:       Option<TrackerId>,
    pub cargo_v:     Option<TrackerId>,
    pub range_type:  RangeType,
    pub consumption: f64,
}

impl VehicleTrackers {
    /// The tracker a trip drains, if any.
    fn fuel(&self) -> Option<TrackerId> {
        match self.range_type {
            RangeType::Battery   => self.battery,
            RangeType::Range     => self.range,
            RangeType::Unlimited => None,
        }
    }
}

// ── Reports ───────────────────────────────────────────────────────────────────

/// Outcome of one [`Sim::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    /// Episode index, counted from 0.
    pub episode: u32,
    /// Steps completed in this episode, including this one.
    pub step:    u32,
    /// Actions submitted this step.
    pub applied: usize,
    pub signals: StepSignals,
    /// The signal table's non-violation scalar, for reading `signals`.
    pub non_violation: f64,
    /// All customers served, or the episode's step limit reached.
    pub done:    bool,
}

impl StepReport {
    /// Restriction signal entries that differ from the non-violation scalar.
    ///
    /// A table that maps a violation to the same scalar as a clean outcome
    /// makes that violation invisible here.
    pub fn violations(&self) -> usize {
        self.signals
            .restrictions
            .iter()
            .flat_map(|a| a.signals.iter().flatten())
            .filter(|&&s| s != self.non_violation)
            .count()
    }
}

/// State of the episode when a run ends.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeSummary {
    pub episode:          u32,
    pub steps:            u32,
    pub customers:        usize,
    pub served_customers: usize,
    /// Demand still above its lower bound, summed over customers.
    pub remaining_demand: f64,
    pub done:             bool,
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The simulation runner.
///
/// Each [`step`][Self::step]:
///
/// 1. `init_step`: zero action signals, reset restriction signals and
///    per-step budgets.
/// 2. Apply the submitted actions in order.  Unknown vehicles are skipped
///    with a warning; infeasible actions change nothing but their signals.
/// 3. `finish_step`: snapshot signals into a [`StepReport`].
///
/// Travel completes within the step in which it is commanded.
///
/// Create via [`ScenarioBuilder`][crate::ScenarioBuilder].
pub struct Sim {
    /// All simulation state.  Policies read it through
    /// [`DispatchContext`]; observation encoders read it directly.
    pub store: StateStore,

    /// Episode length limit.
    pub max_steps: u32,

    vehicles: Vec<VehicleTrackers>,
    demand:   Vec<Option<TrackerId>>,
    stock:    Vec<Option<TrackerId>>,

    episode:     u32,
    step:        u32,
    total_steps: u64,
    done:        bool,
}

impl Sim {
    pub(crate) fn from_parts(
        store:     StateStore,
        max_steps: u32,
        vehicles:  Vec<VehicleTrackers>,
        demand:    Vec<Option<TrackerId>>,
        stock:     Vec<Option<TrackerId>>,
    ) -> Self {
        Self {
            store,
            max_steps,
            vehicles,
            demand,
            stock,
            episode: 0,
            step: 0,
            total_steps: 0,
            done: false,
        }
    }

    // ── Counters ──────────────────────────────────────────────────────────

    pub fn episode(&self) -> u32 {
        self.episode
    }

    /// Steps taken in the current episode.
    pub fn step_count(&self) -> u32 {
        self.step
    }

    /// Steps taken since the sim was built, across episodes.
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Demand tracker of customer `c`, if it has one.
    pub fn demand_tracker(&self, c: CustomerId) -> Option<TrackerId> {
        self.demand.get(c.index()).copied().flatten()
    }

    /// Stock tracker of depot `d`, if it has one.
    pub fn stock_tracker(&self, d: DepotId) -> Option<TrackerId> {
        self.stock.get(d.index()).copied().flatten()
    }

    // ── Episode state ─────────────────────────────────────────────────────

    /// Customers no longer waiting.
    pub fn served_customers(&self) -> usize {
        let waiting = self.store.flags().c_waiting;
        (0..self.store.customers().len())
            .filter(|&c| self.store.flag(waiting, c) == Some(0.0))
            .count()
    }

    pub fn all_served(&self) -> bool {
        self.served_customers() == self.store.customers().len()
    }

    pub fn remaining_demand(&self) -> f64 {
        self.demand
            .iter()
            .flatten()
            .map(|&t| {
                let min = self.store.tracker(t).restriction().min().unwrap_or(0.0);
                (self.store.cur_value(t, min) - min).max(0.0)
            })
            .sum()
    }

    pub fn summary(&self) -> EpisodeSummary {
        EpisodeSummary {
            episode:          self.episode,
            steps:            self.step,
            customers:        self.store.customers().len(),
            served_customers: self.served_customers(),
            remaining_demand: self.remaining_demand(),
            done:             self.done,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Start a new episode: every value back to its initial state.
    pub fn reset(&mut self) {
        if self.step > 0 {
            self.episode += 1;
        }
        self.step = 0;
        self.done = false;
        self.store.reset_episode();
        debug!(episode = self.episode, "sim reset");
    }

    /// Apply `actions` in order as one step.
    pub fn step(&mut self, actions: &[Action]) -> StepReport {
        self.store.init_step();
        for action in actions {
            self.apply(action);
        }
        let signals = self.store.finish_step();

        self.step += 1;
        self.total_steps += 1;
        self.done = self.all_served() || self.step >= self.max_steps;

        StepReport {
            episode:       self.episode,
            step:          self.step,
            applied:       actions.len(),
            signals,
            non_violation: self.store.signal_table().non_violation(),
            done:          self.done,
        }
    }

    /// Ask `policy` for every vehicle's actions against the current state.
    pub fn decide<P: DispatchPolicy + ?Sized>(&self, policy: &P) -> Vec<Action> {
        let ctx = DispatchContext::new(self.step, &self.store);
        self.store
            .vehicle_ids()
            .flat_map(|v| policy.decide(v, &ctx))
            .collect()
    }

    /// Run up to `steps` steps driven by `policy`, stopping early when the
    /// episode is done.
    pub fn run_with<P: DispatchPolicy + ?Sized, O: StepObserver>(
        &mut self,
        policy:   &P,
        steps:    u32,
        observer: &mut O,
    ) -> EpisodeSummary {
        for _ in 0..steps {
            observer.on_step_start(self.step);
            let actions = self.decide(policy);
            let report = self.step(&actions);
            observer.on_step_end(&report);
            if report.done {
                break;
            }
        }
        let summary = self.summary();
        observer.on_episode_end(&summary);
        summary
    }

    /// [`run_with`][Self::run_with] the greedy [`AutoAgent`].
    pub fn run_auto<O: StepObserver>(&mut self, steps: u32, observer: &mut O) -> SimResult<EpisodeSummary> {
        let agent = AutoAgent::new(&self.store)?;
        Ok(self.run_with(&agent, steps, observer))
    }

    // ── Action application ────────────────────────────────────────────────

    fn apply(&mut self, action: &Action) {
        let actor = action.actor();
        if actor.index() >= self.vehicles.len() {
            warn!(vehicle = %actor, ?action, "action for unknown vehicle ignored");
            return;
        }
        match *action {
            Action::MoveTo { vehicle, target }      => self.move_to(vehicle, target),
            Action::LoadCargo { vehicle, amount }   => self.load_cargo(vehicle, amount),
            Action::UnloadCargo { vehicle, amount } => self.unload_cargo(vehicle, amount),
            Action::LoadVehicle { mother, sub }     => self.load_vehicle(mother, sub),
            Action::UnloadVehicle { mother, sub }   => self.unload_vehicle(mother, sub),
        }
    }

    /// Snap `target` to the nearest node and travel there.
    fn move_to(&mut self, v: VehicleId, target: Coord) {
        let trackers = self.vehicles[v.index()];
        let store = &mut self.store;
        let f = store.flags();
        let Some(here) = store.vehicle_coord(v) else {
            return;
        };
        if !store.is_free(v) {
            return;
        }

        let (dest, node) = match snap_to_node(store, target) {
            Some((c, n)) => (c, Some(n)),
            None if store.grid().contains(target) => (target, None),
            None => return,
        };
        store.set_action(ActionSignal::CompareCoord, v, f64::from(target.manhattan(dest)));

        let cost = f64::from(here.manhattan(dest)) * trackers.consumption;
        if let Some(fuel) = trackers.fuel().filter(|&t| store.value(t).is_some()) {
            if cost > 0.0 && store.check_subtract_value(fuel, Some(cost), false) == 0.0 {
                // Records the violation; the value does not move.
                store.subtract_value(fuel, cost);
                debug!(vehicle = %v, cost, "trip out of range");
                self.refresh_stuck(v);
                return;
            }
            store.subtract_value(fuel, cost);
        }

        store.set_action(ActionSignal::FreeToTravel, v, 1.0);
        store.set_vehicle_coord(v, dest);
        let carried = store.transported_by(v).to_vec();
        for &sub in &carried {
            store.set_vehicle_coord(sub, dest);
        }

        match node {
            Some(NodeRef::Depot(d)) => {
                store.mark_visited(v, NodeRef::Depot(d));
                self.recharge(v);
                for sub in carried {
                    self.recharge(sub);
                }
            }
            Some(NodeRef::Customer(c)) => {
                store.mark_visited(v, NodeRef::Customer(c));
                self.refresh_stuck(v);
            }
            None => self.refresh_stuck(v),
        }
        trace!(vehicle = %v, from = %here, to = %dest, cost, "moved");
    }

    /// Set `v_stuck` when a free vehicle off a depot cannot reach the
    /// nearest depot on what it has left.  With no depots at all, stuck
    /// means drained to the lower bound.
    fn refresh_stuck(&mut self, v: VehicleId) {
        let trackers = self.vehicles[v.index()];
        let store = &mut self.store;
        let f = store.flags();
        let fuel = trackers.fuel().filter(|&t| store.value(t).is_some());
        let stuck = match (fuel, store.vehicle_coord(v)) {
            (Some(fuel), Some(here)) if store.is_free(v) => {
                let depots = store.columns().coords(f.d_coord);
                match nearest(here, depots, |_| true).map(|i| here.manhattan(depots[i])) {
                    Some(dist) => {
                        let cost = f64::from(dist) * trackers.consumption;
                        cost > 0.0 && store.check_subtract_value(fuel, Some(cost), false) == 0.0
                    }
                    None => store.check_subtract_value(fuel, None, false) == 0.0,
                }
            }
            _ => false,
        };
        if stuck && store.flag(f.v_stuck, v.index()) != Some(1.0) {
            debug!(vehicle = %v, "vehicle stuck");
        }
        store.set_flag(f.v_stuck, v.index(), if stuck { 1.0 } else { 0.0 });
    }

    /// Battery and range to max, stuck flag cleared.
    fn recharge(&mut self, v: VehicleId) {
        let trackers = self.vehicles[v.index()];
        for t in [trackers.battery, trackers.range].into_iter().flatten() {
            self.store.set_to_max(t);
        }
        let stuck = self.store.flags().v_stuck;
        self.store.set_flag(stuck, v.index(), 0.0);
    }

    /// Take cargo from the depot the vehicle stands on.
    fn load_cargo(&mut self, v: VehicleId, amount: Option<f64>) {
        let Some(cargo) = self.vehicles[v.index()].cargo else {
            return;
        };
        let store = &mut self.store;
        if !store.is_free(v) {
            return;
        }
        let Some(here) = store.vehicle_coord(v) else {
            return;
        };
        let Some(depot) = store.depots().iter().find(|d| d.coord == here).map(|d| d.id) else {
            return;
        };
        let stock = self.stock[depot.index()];

        let room = store.check_add_value(cargo, None, true);
        let supply = stock.map_or(f64::INFINITY, |s| store.check_subtract_value(s, None, true));
        let q = requested(amount).min(room).min(supply);
        if !(q > 0.0 && q.is_finite()) {
            return;
        }

        let before = store.cur_value(cargo, 0.0);
        let moved = (store.add_value(cargo, q) - before).abs();
        if moved == 0.0 {
            return;
        }
        if let Some(s) = stock {
            store.subtract_value(s, moved);
        }
        store.set_action(ActionSignal::FreeToLoadCargo, v, 1.0);
        trace!(vehicle = %v, depot = %depot, moved, "cargo loaded");
    }

    /// Deliver cargo to the customer the vehicle stands on.
    fn unload_cargo(&mut self, v: VehicleId, amount: Option<f64>) {
        let Some(cargo) = self.vehicles[v.index()].cargo else {
            return;
        };
        let store = &mut self.store;
        if !store.is_free(v) {
            return;
        }
        let Some(here) = store.vehicle_coord(v) else {
            return;
        };
        let Some(customer) = store.customers().iter().find(|c| c.coord == here).map(|c| c.id) else {
            return;
        };
        let waiting = store.flags().c_waiting;
        if store.flag(waiting, customer.index()) != Some(1.0) {
            return;
        }
        let demand = self.demand[customer.index()];

        let available = store.check_subtract_value(cargo, None, true);
        let wanted = demand.map_or(f64::INFINITY, |d| store.check_subtract_value(d, None, true));
        let q = requested(amount).min(available).min(wanted);
        if !(q > 0.0 && q.is_finite()) {
            return;
        }

        let before = store.cur_value(cargo, 0.0);
        let moved = (before - store.subtract_value(cargo, q)).abs();
        if moved == 0.0 {
            return;
        }
        let satisfied = match demand {
            Some(d) => {
                store.subtract_value(d, moved);
                store.check_subtract_value(d, None, false) == 0.0
            }
            None => true,
        };
        if satisfied {
            store.set_flag(waiting, customer.index(), 0.0);
            debug!(customer = %customer, vehicle = %v, "customer served");
        }
        store.set_action(ActionSignal::FreeToUnloadCargo, v, 1.0);
        trace!(vehicle = %v, customer = %customer, moved, "cargo delivered");
    }

    /// `mother` picks up the co-located `sub`.
    fn load_vehicle(&mut self, mother: VehicleId, sub: VehicleId) {
        if sub.index() >= self.vehicles.len() {
            warn!(mother = %mother, sub = %sub, "load of unknown vehicle ignored");
            return;
        }
        let slots = self.vehicles[mother.index()].cargo_v;
        let store = &mut self.store;
        let f = store.flags();

        let is_mother = store.vehicle(mother).is_some_and(|h| h.is_mother());
        let room = slots.map_or(true, |t| store.check_add_value(t, Some(1.0), true) >= 1.0);
        if !(is_mother && store.is_free(mother) && room && sub != mother) {
            return;
        }
        store.set_action(ActionSignal::FreeToLoadV, mother, 1.0);

        let loadable = store.vehicle(sub).is_some_and(|h| h.loadable);
        let co_located = store.vehicle_coord(sub) == store.vehicle_coord(mother);
        if !(loadable && store.is_free(sub) && co_located) {
            return;
        }

        if let Some(t) = slots {
            store.add_value(t, 1.0);
        }
        store.push_transported(mother, sub);
        store.set_flag(f.v_free, sub.index(), 0.0);
        store.set_flag(f.v_loaded, sub.index(), 1.0);
        store.set_action(ActionSignal::FreeToBeLoadedV, mother, 1.0);
        self.refresh_stuck(sub);
        trace!(mother = %mother, sub = %sub, "vehicle loaded");
    }

    /// `mother` releases `sub`, or the vehicle it has carried longest.
    fn unload_vehicle(&mut self, mother: VehicleId, sub: Option<VehicleId>) {
        let slots = self.vehicles[mother.index()].cargo_v;
        let store = &mut self.store;
        let f = store.flags();

        // One vehicle requested; cleared once one is actually released.
        store.set_action(ActionSignal::UnloadingV, mother, 1.0);
        if !store.is_free(mother) {
            return;
        }
        store.set_action(ActionSignal::FreeToUnloadV, mother, 1.0);

        let Some(target) = sub.or_else(|| store.transported_by(mother).first().copied()) else {
            return;
        };
        let budget = slots.map_or(true, |t| store.check_subtract_value(t, Some(1.0), true) >= 1.0);
        if !budget || !store.remove_transported(mother, target) {
            return;
        }

        if let Some(t) = slots {
            store.subtract_value(t, 1.0);
        }
        if let Some(at) = store.vehicle_coord(mother) {
            store.set_vehicle_coord(target, at);
        }
        store.set_flag(f.v_free, target.index(), 1.0);
        store.set_flag(f.v_loaded, target.index(), 0.0);
        store.set_action(ActionSignal::UnloadingV, mother, 0.0);
        self.refresh_stuck(target);
        trace!(mother = %mother, sub = %target, "vehicle unloaded");
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Requested quantity: `None` is "as much as possible"; negative requests
/// are zero.
fn requested(amount: Option<f64>) -> f64 {
    amount.map_or(f64::INFINITY, |a| a.max(0.0))
}

/// The node nearest `target`, customers winning ties with depots.
fn snap_to_node(store: &StateStore, target: Coord) -> Option<(Coord, NodeRef)> {
    let f = store.flags();
    let cols = store.columns();
    let customers = cols.coords(f.c_coord);
    let depots = cols.coords(f.d_coord);

    let c = nearest(target, customers, |_| true)
        .map(|i| (customers[i], NodeRef::Customer(CustomerId(i as u32))));
    let d = nearest(target, depots, |_| true)
        .map(|i| (depots[i], NodeRef::Depot(DepotId(i as u32))));

    match (c, d) {
        (Some(c), Some(d)) if target.manhattan(d.0) < target.manhattan(c.0) => Some(d),
        (Some(c), _) => Some(c),
        (None, d)    => d,
    }
}
