//! `AutoAgent` — the greedy reference policy.
//!
//! Every free vehicle runs the same loop:
//!
//! ```text
//! at a waiting customer with cargo aboard      → unload cargo
//! at a depot with stock and room in the hold   → load cargo
//! mother at a customer carrying sub vehicles   → release the oldest one
//! mother next to a loadable, free sub vehicle  → pick it up
//! then move: cargo aboard and customers waiting → nearest one, unvisited first
//!            otherwise                          → nearest depot with stock
//! ```
//!
//! Candidate selection goes through the store's nearest-neighbour index with
//! filters resolved once, at construction.  Attributes the scenario does not
//! track (`demand`, `stock`, `cargo`) simply drop out of the filters.

use fleet_core::{Coord, CustomerId, DepotId, VehicleId};
use fleet_state::{names, ColumnId, Filter, ResolvedFilter, StateStore, Target};
use tracing::trace;

use crate::{Action, DispatchContext, DispatchPolicy, DispatchResult};

/// Greedy nearest-target dispatcher.
#[derive(Clone, Debug)]
pub struct AutoAgent {
    /// Waiting customers with outstanding demand.
    customers: ResolvedFilter,
    /// Depots with remaining stock.
    depots:    ResolvedFilter,
    /// Free, loadable sub vehicles.
    loadable:  ResolvedFilter,

    cargo:     Option<ColumnId>,
    max_cargo: Option<ColumnId>,
    demand:    Option<ColumnId>,
    stock:     Option<ColumnId>,
}

impl AutoAgent {
    /// Resolve every filter against `store`'s columns.
    ///
    /// Call after the scenario has registered its trackers: an attribute
    /// registered later is invisible to this agent.
    pub fn new(store: &StateStore) -> DispatchResult<Self> {
        let cols = store.columns();
        let opt = |name: &str| cols.scalar_id(name).ok();

        let mut customers = Filter::new().include(names::C_WAITING, 1.0);
        if cols.contains(names::DEMAND) {
            customers = customers.exclude(names::DEMAND, 0.0);
        }
        let mut depots = Filter::new();
        if cols.contains(names::STOCK) {
            depots = depots.exclude(names::STOCK, 0.0);
        }
        let loadable = Filter::new()
            .include(names::V_LOADABLE, 1.0)
            .include(names::V_FREE, 1.0)
            .include(names::V_TYPE, 0.0);

        Ok(Self {
            customers: customers.resolve(cols)?,
            depots:    depots.resolve(cols)?,
            loadable:  loadable.resolve(cols)?,
            cargo:     opt(names::CARGO),
            max_cargo: opt(format!("max_{}", names::CARGO).as_str()),
            demand:    opt(names::DEMAND),
            stock:     opt(names::STOCK),
        })
    }

    // ── Target selection ──────────────────────────────────────────────────

    /// Where `v` should head next, or `None` if nothing qualifies.
    ///
    /// With cargo aboard and at least one customer waiting, that customer
    /// (see [`find_customer`][Self::find_customer]).  Otherwise the nearest
    /// depot with stock.
    pub fn find_destination(&self, store: &StateStore, v: VehicleId) -> Option<Coord> {
        if self.cargo_aboard(store, v) > 0.0 && self.any_customer_waiting(store) {
            if let Some(c) = self.find_customer(store, v) {
                return store.customer_coord(c);
            }
        }
        self.find_depot(store, v).and_then(|d| store.depot_coord(d))
    }

    /// The sub vehicle `mother` has carried longest.
    pub fn find_v_to_unload(&self, store: &StateStore, mother: VehicleId) -> Option<VehicleId> {
        store.transported_by(mother).first().copied()
    }

    /// The free, loadable sub vehicle nearest to `mother`.
    pub fn find_v_to_load(&self, store: &StateStore, mother: VehicleId) -> Option<VehicleId> {
        store
            .nearest_filtered(mother, Target::Vehicles, &self.loadable, false)
            .map(|slot| VehicleId(slot as u32))
    }

    /// The nearest waiting customer with outstanding demand, preferring
    /// those `v` has not visited this episode.  A customer whose demand
    /// outlasts one hold is revisited.
    pub fn find_customer(&self, store: &StateStore, v: VehicleId) -> Option<CustomerId> {
        store
            .nearest_filtered(v, Target::Customers, &self.customers, true)
            .or_else(|| store.nearest_filtered(v, Target::Customers, &self.customers, false))
            .map(|slot| CustomerId(slot as u32))
    }

    /// The nearest depot with stock left.
    pub fn find_depot(&self, store: &StateStore, v: VehicleId) -> Option<DepotId> {
        store
            .nearest_filtered(v, Target::Depots, &self.depots, false)
            .map(|slot| DepotId(slot as u32))
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn cargo_aboard(&self, store: &StateStore, v: VehicleId) -> f64 {
        self.cargo
            .and_then(|c| store.flag(c, v.index()))
            .unwrap_or(0.0)
    }

    fn hold_has_room(&self, store: &StateStore, v: VehicleId) -> bool {
        match self.max_cargo.and_then(|c| store.flag(c, v.index())) {
            Some(max) => self.cargo_aboard(store, v) < max,
            None      => self.cargo.is_some(),
        }
    }

    fn any_customer_waiting(&self, store: &StateStore) -> bool {
        (0..store.customers().len()).any(|slot| self.customers.admits(store.columns(), slot))
    }

    fn customer_at(&self, store: &StateStore, here: Coord) -> Option<CustomerId> {
        store.customers().iter().find(|c| c.coord == here).map(|c| c.id)
    }

    fn depot_at(&self, store: &StateStore, here: Coord) -> Option<DepotId> {
        store.depots().iter().find(|d| d.coord == here).map(|d| d.id)
    }

    fn positive(&self, store: &StateStore, column: Option<ColumnId>, slot: usize) -> bool {
        column
            .and_then(|c| store.flag(c, slot))
            .is_some_and(|v| v > 0.0)
    }
}

impl DispatchPolicy for AutoAgent {
    fn decide(&self, v: VehicleId, ctx: &DispatchContext<'_>) -> Vec<Action> {
        let store = ctx.store;
        if !store.is_free(v) {
            return vec![];
        }
        let Some(here) = store.vehicle_coord(v) else {
            return vec![];
        };
        let is_mother = store.vehicle(v).is_some_and(|h| h.is_mother());
        let mut actions = Vec::new();
        let mut loading = false;

        let at_customer = self.customer_at(store, here);
        if let Some(c) = at_customer {
            if self.customers.admits(store.columns(), c.index())
                && self.cargo_aboard(store, v) > 0.0
                && self.positive(store, self.demand, c.index())
            {
                actions.push(Action::UnloadCargo { vehicle: v, amount: None });
            }
        }
        if let Some(d) = self.depot_at(store, here) {
            if self.positive(store, self.stock, d.index()) && self.hold_has_room(store, v) {
                actions.push(Action::LoadCargo { vehicle: v, amount: None });
                loading = true;
            }
        }

        if is_mother {
            if let (Some(_), Some(sub)) = (at_customer, self.find_v_to_unload(store, v)) {
                actions.push(Action::UnloadVehicle { mother: v, sub: Some(sub) });
            } else if let Some(sub) = self.find_v_to_load(store, v) {
                if store.vehicle_coord(sub) == Some(here) {
                    actions.push(Action::LoadVehicle { mother: v, sub });
                }
            }
        }

        let destination = if loading {
            self.find_customer(store, v)
                .and_then(|c| store.customer_coord(c))
                .or_else(|| self.find_destination(store, v))
        } else {
            self.find_destination(store, v)
        };
        if let Some(target) = destination.filter(|t| *t != here) {
            actions.push(Action::MoveTo { vehicle: v, target });
        }

        trace!(vehicle = %v, step = ctx.step, n = actions.len(), "auto agent decided");
        actions
    }
}
