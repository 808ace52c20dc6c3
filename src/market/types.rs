//! Run-wide settings and the static network shared by the market stages.

use serde::Serialize;

use crate::solver::{GeneratorSnapshot, ModelSnapshot};

use super::genco::GenCo;
use super::grid::{GridModel, Lse, SupplyOffer};
use super::matrix::HourlyMatrix;

/// Settings that fix the shape of a market run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketConfig {
    /// Simulated days, the last of which only runs real time.
    pub days: usize,
    pub hours_per_day: usize,
    /// Time periods in the unit-commitment model, at least `hours_per_day`.
    pub uc_horizon_hours: usize,
    pub reserve_requirement_mw: f64,
    /// Fraction of installed capacity counted toward the adequacy check.
    pub ri_min_c: f64,
    /// Offer price ceiling used by the adequacy check ($/MWh).
    pub price_cap: f64,
}

impl MarketConfig {
    /// A run of `days` days of 24 hours with a one-day commitment horizon.
    pub fn new(days: usize) -> Self {
        Self {
            days,
            hours_per_day: 24,
            uc_horizon_hours: 24,
            reserve_requirement_mw: 0.0,
            ri_min_c: 1.0,
            price_cap: 1000.0,
        }
    }

    pub fn is_last_day(&self, day: usize) -> bool {
        day >= self.days
    }
}

/// The network the market clears over: topology and where loads sit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketModel {
    pub grid: GridModel,
    pub lses: Vec<Lse>,
}

impl MarketModel {
    /// Builds the solver view of `day`.
    ///
    /// `offers` is aligned with `gencos`; initial conditions come from each
    /// record's history before `day`.
    pub fn snapshot(
        &self,
        day: usize,
        gencos: &[GenCo],
        offers: &[SupplyOffer],
        demand: HourlyMatrix,
        reserve_requirement_mw: f64,
    ) -> ModelSnapshot {
        let generators = gencos
            .iter()
            .zip(offers)
            .map(|(g, offer)| GeneratorSnapshot {
                params: g.params().clone(),
                offer: *offer,
                power_t0_mw: g.power_t0(day),
                unit_on_t0: g.unit_on_t0_state(day),
            })
            .collect();
        ModelSnapshot {
            day,
            horizon_hours: demand.hours(),
            grid: self.grid.clone(),
            generators,
            lses: self.lses.clone(),
            demand,
            reserve_requirement_mw,
        }
    }
}

/// Canary flags indexed by generator index.
pub fn canary_flags(gencos: &[GenCo]) -> Vec<bool> {
    let len = gencos.iter().map(|g| g.index() + 1).max().unwrap_or(0);
    let mut flags = vec![false; len];
    for g in gencos {
        flags[g.index()] = g.is_canary();
    }
    flags
}
