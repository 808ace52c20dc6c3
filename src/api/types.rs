//! API response and query types.

use serde::{Deserialize, Serialize};

/// Query for `/lmp`.
#[derive(Debug, Deserialize)]
pub struct LmpQuery {
    pub day: Option<usize>,
    pub hour: Option<usize>,
}

/// Query for `/dispatch`.
#[derive(Debug, Deserialize)]
pub struct DispatchQuery {
    pub day: Option<usize>,
}

/// Price at one bus.
#[derive(Debug, Serialize)]
pub struct BusPrice {
    pub bus: String,
    pub lmp_per_mwh: f64,
}

/// Prices of one hour. `prices` is empty when the hour had no solution.
#[derive(Debug, Serialize)]
pub struct LmpResponse {
    pub day: usize,
    pub hour: usize,
    pub has_solution: bool,
    pub prices: Vec<BusPrice>,
}

/// One generator in one hour.
///
/// `dispatch_mw` is `null` for hours without a solution.
#[derive(Debug, Serialize)]
pub struct DispatchRecord {
    pub hour: usize,
    pub generator: String,
    pub committed: bool,
    pub dispatch_mw: Option<f64>,
    pub production_cost: f64,
    pub startup_cost: f64,
    pub shutdown_cost: f64,
}

/// Error response body for 400- and 404-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
