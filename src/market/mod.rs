/// Day-indexed result history.
pub mod accumulator;
pub mod clock;
/// Commitment schedules and the canary override.
pub mod commitment;
/// Day-ahead snapshot and unit commitment.
pub mod day_ahead;
pub mod error;
/// Advisory capacity adequacy checks.
pub mod feasibility;
#[cfg(test)]
pub(crate) mod fixtures;
/// Generator company records.
pub mod genco;
/// Network, generator and load-serving entity data.
pub mod grid;
pub mod kpi;
/// Forecast and actual load scenarios.
pub mod load;
pub mod matrix;
/// Real-time redispatch.
pub mod real_time;
/// The market operator's state machine.
pub mod scheduler;
pub mod status;
pub mod types;

pub use error::{MarketError, Stage};
pub use scheduler::{MarketScheduler, SchedulerState, StageCounters};
