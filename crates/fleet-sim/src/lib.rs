//! `fleet-sim` — scenario loading, action application, and the step loop.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                    |
//! |--------------|-------------------------------------------------------------|
//! | [`config`]   | `ScenarioConfig` and friends, read from TOML                |
//! | [`loader`]   | CSV customer / depot loader                                 |
//! | [`builder`]  | `ScenarioBuilder` — config to a ready `Sim`                 |
//! | [`sim`]      | `Sim`, `StepReport`, `EpisodeSummary`                       |
//! | [`observer`] | `StepObserver` trait, `NoopObserver`, `TracingObserver`     |
//! | [`error`]    | `SimError`, `SimResult<T>`                                  |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use fleet_sim::{NoopObserver, ScenarioBuilder, ScenarioConfig};
//!
//! let config = ScenarioConfig::from_toml_str(TOML)?;
//! let mut sim = ScenarioBuilder::new(config).build()?;
//! let summary = sim.run_auto(200, &mut NoopObserver)?;
//! println!("{}/{} customers served", summary.served_customers, summary.customers);
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod loader;
pub mod observer;
pub mod sim;


pub use builder::ScenarioBuilder;
pub use config::{CustomerConfig, DepotConfig, ScenarioConfig, VehicleConfig};
pub use error::{SimError, SimResult};
pub use loader::{load_nodes_csv, load_nodes_reader, NodeSet};
pub use observer::{NoopObserver, StepObserver, TracingObserver};
pub use sim::{EpisodeSummary, Sim, StepReport};
