//! Fluent builder for constructing a [`Sim`] from a [`ScenarioConfig`].

use fleet_core::{FixedResolver, ParamResolver, RestrictionSpec, RngResolver};
use fleet_state::{names, Group, NewVehicle, StateStore, TrackerId};
use tracing::debug;

use crate::loader::NodeSet;
use crate::sim::VehicleTrackers;
use crate::{ScenarioConfig, Sim, SimResult};

/// Fluent builder for [`Sim`].
///
/// # Optional inputs
///
/// | Method          | Default                                         |
/// |-----------------|-------------------------------------------------|
/// | `.nodes(set)`   | Only the customers and depots in the config     |
/// | `.seed(s)`      | `config.seed`; without either, literals only    |
///
/// # Example
///
/// ```rust,ignore
/// let config = ScenarioConfig::from_toml_file(path)?;
/// let nodes = load_nodes_csv(nodes_path)?;
/// let mut sim = ScenarioBuilder::new(config).nodes(nodes).seed(7).build()?;
/// sim.run_auto(200, &mut NoopObserver)?;
/// ```
pub struct ScenarioBuilder {
    config: ScenarioConfig,
    nodes:  Option<NodeSet>,
    seed:   Option<u64>,
}

impl ScenarioBuilder {
    pub fn new(config: ScenarioConfig) -> Self {
        Self { config, nodes: None, seed: None }
    }

    /// Append customers and depots (e.g. from [`load_nodes_csv`][crate::load_nodes_csv])
    /// after those listed in the config.
    pub fn nodes(mut self, nodes: NodeSet) -> Self {
        self.nodes = Some(nodes);
        self
    }

    /// Draw random parameters from `seed`, overriding `config.seed`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Resolve parameters with a seeded [`RngResolver`] when a seed is set,
    /// and with [`FixedResolver`] otherwise.
    pub fn build(self) -> SimResult<Sim> {
        match self.seed.or(self.config.seed) {
            Some(seed) => self.build_with(&mut RngResolver::new(seed)),
            None       => self.build_with(&mut FixedResolver),
        }
    }

    /// Validate the scenario, register every entity and tracker, and return a
    /// [`Sim`] at the start of its first episode.
    pub fn build_with<R: ParamResolver + ?Sized>(self, resolver: &mut R) -> SimResult<Sim> {
        let mut config = self.config;
        if let Some(nodes) = self.nodes {
            config.customers.extend(nodes.customers);
            config.depots.extend(nodes.depots);
        }
        config.validate()?;

        let mut store = StateStore::new(config.grid, config.signals);

        // ── Entities ──────────────────────────────────────────────────────
        //
        // Every slot must exist before a tracker can be attached to it.
        let mut vehicle_types = Vec::with_capacity(config.vehicle_count());
        for vc in &config.vehicles {
            for _ in 0..vc.count {
                let id = store.register_vehicle(
                    NewVehicle { kind: vc.kind, loadable: vc.loadable, start: vc.start },
                    vc.travel_type,
                    vc.range_type,
                    vc.speed,
                );
                vehicle_types.push((id, vc));
            }
        }
        for c in &config.customers {
            store.register_customer(c.at);
        }
        for d in &config.depots {
            store.register_depot(d.at);
        }

        // ── Trackers ──────────────────────────────────────────────────────
        let mut vehicles = Vec::with_capacity(vehicle_types.len());
        for (id, vc) in vehicle_types {
            let slot = id.index();
            let v = Group::Vehicle;
            vehicles.push(VehicleTrackers {
                battery:     track_opt(&mut store, v, names::BATTERY, slot, vc.battery.as_ref(), resolver)?,
                range:       track_opt(&mut store, v, names::RANGE, slot, vc.range.as_ref(), resolver)?,
                cargo:       track_opt(&mut store, v, names::CARGO, slot, vc.cargo.as_ref(), resolver)?,
                cargo_v:     track_opt(&mut store, v, names::CARGO_V, slot, vc.cargo_v.as_ref(), resolver)?,
                range_type:  vc.range_type,
                consumption: vc.consumption,
            });
        }

        let demand = config
            .customers
            .iter()
            .enumerate()
            .map(|(slot, c)| track_opt(&mut store, Group::Customer, names::DEMAND, slot, c.demand.as_ref(), resolver))
            .collect::<SimResult<Vec<_>>>()?;

        let stock = config
            .depots
            .iter()
            .enumerate()
            .map(|(slot, d)| track_opt(&mut store, Group::Depot, names::STOCK, slot, d.stock.as_ref(), resolver))
            .collect::<SimResult<Vec<_>>>()?;

        store.reset_episode();
        debug!(
            vehicles  = vehicles.len(),
            customers = demand.len(),
            depots    = stock.len(),
            trackers  = store.tracker_count(),
            "scenario built",
        );

        Ok(Sim::from_parts(store, config.max_steps, vehicles, demand, stock))
    }
}

fn track_opt<R: ParamResolver + ?Sized>(
    store:    &mut StateStore,
    group:    Group,
    name:     &str,
    slot:     usize,
    spec:     Option<&RestrictionSpec>,
    resolver: &mut R,
) -> SimResult<Option<TrackerId>> {
    match spec {
        Some(spec) => Ok(Some(store.track(group, name, slot, spec, resolver)?)),
        None       => Ok(None),
    }
}
