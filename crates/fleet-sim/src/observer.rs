//! Step observer trait for progress reporting and data collection.

use tracing::{debug, info};

use crate::{EpisodeSummary, StepReport};

/// Callbacks invoked by [`Sim::run_with`][crate::Sim::run_with] and
/// [`Sim::run_auto`][crate::Sim::run_auto] at step boundaries.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — reward collector
///
/// ```rust,ignore
/// struct Penalties(f64);
///
/// impl StepObserver for Penalties {
///     fn on_step_end(&mut self, report: &StepReport) {
///         for attr in &report.signals.restrictions {
///             self.0 += attr.signals.iter().flatten().sum::<f64>();
///         }
///     }
/// }
/// ```
pub trait StepObserver {
    /// Called before any action of step `step` is decided.
    fn on_step_start(&mut self, _step: u32) {}

    /// Called after the step's actions were applied and its signals
    /// snapshotted.
    fn on_step_end(&mut self, _report: &StepReport) {}

    /// Called once when the episode is done or the run's step limit is hit.
    fn on_episode_end(&mut self, _summary: &EpisodeSummary) {}
}

/// A [`StepObserver`] that does nothing.
pub struct NoopObserver;

impl StepObserver for NoopObserver {}

/// A [`StepObserver`] that reports through `tracing`: every step at `debug`,
/// the episode summary at `info`.
#[derive(Default)]
pub struct TracingObserver {
    violations: u64,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restriction violations seen so far.
    pub fn violations(&self) -> u64 {
        self.violations
    }
}

impl StepObserver for TracingObserver {
    fn on_step_end(&mut self, report: &StepReport) {
        let violations = report.violations();
        self.violations += violations as u64;
        debug!(
            episode    = report.episode,
            step       = report.step,
            actions    = report.applied,
            violations,
            done       = report.done,
            "step finished",
        );
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        info!(
            episode          = summary.episode,
            steps            = summary.steps,
            served           = summary.served_customers,
            customers        = summary.customers,
            remaining_demand = summary.remaining_demand,
            violations       = self.violations,
            "episode finished",
        );
    }
}
