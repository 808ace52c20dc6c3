//! Wholesale electricity market simulator: day-ahead unit commitment and
//! real-time economic dispatch cleared by an external or built-in solver.

#[cfg(feature = "api")]
pub mod api;
pub mod cli;
pub mod config;
pub mod forecast;
/// Export of run results.
pub mod io;
/// Market participants, stages and the scheduler.
pub mod market;
pub mod runner;
/// Solver interface, file protocol and built-in engines.
pub mod solver;
pub mod telemetry;
pub mod units;
