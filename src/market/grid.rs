//! Static network and participant data for a market case.

use serde::Serialize;

/// A transmission branch between two buses (1-based bus numbers).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    pub from_bus: usize,
    pub to_bus: usize,
    /// Thermal limit (MW).
    pub limit_mw: f64,
    /// Series reactance (per-unit).
    pub reactance: f64,
}

/// Buses and branches of the transmission network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridModel {
    pub buses: usize,
    pub branches: Vec<Branch>,
}

impl GridModel {
    pub fn new(buses: usize, branches: Vec<Branch>) -> Self {
        Self { buses, branches }
    }

    pub fn bus_name(bus: usize) -> String {
        format!("Bus{bus}")
    }

    /// Branch names in declaration order, e.g. `Bus1_Bus2`.
    pub fn branch_names(&self) -> Vec<String> {
        self.branches
            .iter()
            .map(|b| format!("Bus{}_Bus{}", b.from_bus, b.to_bus))
            .collect()
    }
}

/// Technical and cost parameters of a thermal generator.
///
/// Power values are MW, costs are $ and $/MWh, times are hours.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratorParams {
    pub name: String,
    /// Stable 0-based index used by every result matrix.
    pub index: usize,
    pub bus: usize,
    /// Forced on in every real-time hour.
    pub canary: bool,
    pub min_up_hours: u32,
    pub min_down_hours: u32,
    pub ramp_up_mw: f64,
    pub ramp_down_mw: f64,
    pub startup_ramp_mw: f64,
    pub shutdown_ramp_mw: f64,
    pub cold_start_cost: f64,
    pub hot_start_cost: f64,
    pub shutdown_cost: f64,
    pub no_load_cost: f64,
    /// Output before the first simulated hour (MW).
    pub initial_power_mw: f64,
    /// Signed hours on (> 0) or off (< 0) before the first simulated hour.
    pub initial_status_hours: i32,
}

/// A generator's reported marginal cost curve `a + 2·b·p` and operating range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SupplyOffer {
    /// Linear cost coefficient ($/MWh).
    pub a: f64,
    /// Quadratic cost coefficient ($/MW²h).
    pub b: f64,
    pub cap_min_mw: f64,
    pub cap_max_mw: f64,
}

impl SupplyOffer {
    /// Production cost of `p` MW for one hour, excluding no-load cost.
    pub fn variable_cost(&self, p: f64) -> f64 {
        self.a * p + self.b * p * p
    }

    /// Marginal cost at output `p`.
    pub fn marginal_cost(&self, p: f64) -> f64 {
        self.a + 2.0 * self.b * p
    }
}

/// A load-serving entity attached to one bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lse {
    pub name: String,
    pub bus: usize,
}
