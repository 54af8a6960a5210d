//! greedy — one truck and two drones served by the built-in auto-pilot.
//!
//! The scenario is embedded: vehicles come from a TOML document, customers
//! and depots from a CSV table.  Demand is drawn from a range once, when
//! the scenario is built, so the seed fixes it for every episode.
//! Set `RUST_LOG=fleet_sim=debug` to follow every step.

use std::io::Cursor;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fleet_core::VehicleId;
use fleet_dispatch::{Action, AutoAgent};
use fleet_sim::{
    load_nodes_reader, EpisodeSummary, ScenarioBuilder, ScenarioConfig, StepObserver, StepReport,
    TracingObserver,
};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:     u64 = 42;
const EPISODES: u32 = 3;
const STEPS:    u32 = 200;

// ── Scenario ──────────────────────────────────────────────────────────────────

const SCENARIO_TOML: &str = r#"
max_steps = 200
signals   = [0.0, -0.5, -1.0]

[grid]
width  = 16
height = 16

[[vehicles]]
kind    = "mother"
start   = { x = 0, y = 0 }
cargo   = { max = 20.0, min = 0.0, init = "min", rate = 10.0 }
cargo_v = { max = 2.0,  min = 0.0, init = "min" }

[[vehicles]]
kind        = "sub"
count       = 2
start       = { x = 0, y = 0 }
loadable    = true
travel_type = "aerial"
range_type  = "battery"
consumption = 2.0
battery     = { max = 30.0, min = 0.0, init = "max" }
cargo       = { max = 2.0,  min = 0.0, init = "min" }

[[customers]]
at     = { x = 12, y = 3 }
demand = { max = { low = 1.0, high = 4.0 }, min = 0.0, init = "max" }
"#;

// kind, x, y, amount.  An empty amount is untracked.
const NODES_CSV: &str = "\
kind,x,y,amount\n\
depot,0,0,200\n\
depot,10,10,\n\
customer,5,2,3\n\
customer,3,9,2\n\
customer,14,14,4\n\
customer,8,6,1\n\
customer,1,13,2\n\
";

// ── Observer ──────────────────────────────────────────────────────────────────

/// Forwards to [`TracingObserver`] and sums the reward signals.
struct RewardObserver {
    inner:  TracingObserver,
    reward: f64,
}

impl StepObserver for RewardObserver {
    fn on_step_start(&mut self, step: u32) {
        self.inner.on_step_start(step);
    }

    fn on_step_end(&mut self, report: &StepReport) {
        self.reward += report
            .signals
            .restrictions
            .iter()
            .flat_map(|a| a.signals.iter().flatten())
            .sum::<f64>();
        self.inner.on_step_end(report);
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        self.inner.on_episode_end(summary);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ScenarioConfig::from_toml_str(SCENARIO_TOML)?;
    let nodes = load_nodes_reader(Cursor::new(NODES_CSV))?;
    let mut sim = ScenarioBuilder::new(config).nodes(nodes).seed(SEED).build()?;

    let counts = sim.store.counts();
    info!(
        vehicles  = counts.vehicles,
        customers = counts.customers,
        depots    = counts.depots,
        trackers  = sim.store.tracker_count(),
        "scenario loaded",
    );

    // Peek at the first decision before running.
    let agent = AutoAgent::new(&sim.store)?;
    let first: Vec<Action> = sim.decide(&agent);
    for action in first.iter().filter(|a| a.actor() == VehicleId(0)) {
        info!(?action, "truck opens with");
    }

    for episode in 0..EPISODES {
        if episode > 0 {
            sim.reset();
        }
        let mut observer = RewardObserver { inner: TracingObserver::new(), reward: 0.0 };
        let summary = sim.run_auto(STEPS, &mut observer)?;
        println!(
            "episode {}: {}/{} customers served in {} steps, {:.1} demand left, reward {:.1}, {} violations",
            summary.episode,
            summary.served_customers,
            summary.customers,
            summary.steps,
            summary.remaining_demand,
            observer.reward,
            observer.inner.violations(),
        );
    }

    println!("total steps: {}", sim.total_steps());
    Ok(())
}
