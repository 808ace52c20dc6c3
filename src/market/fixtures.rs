//! Two-bus market used across the market unit tests.

use super::commitment::{CommitmentDecision, ScheduleSet};
use super::genco::GenCo;
use super::grid::{Branch, GeneratorParams, GridModel, Lse, SupplyOffer};
use super::load::TableLoadScenario;
use super::matrix::HourlyMatrix;
use super::types::{MarketConfig, MarketModel};

pub(crate) fn config(days: usize) -> MarketConfig {
    MarketConfig {
        days,
        hours_per_day: 2,
        uc_horizon_hours: 2,
        reserve_requirement_mw: 0.0,
        ri_min_c: 1.0,
        price_cap: 1000.0,
    }
}

pub(crate) fn model() -> MarketModel {
    MarketModel {
        grid: GridModel::new(
            2,
            vec![Branch {
                from_bus: 1,
                to_bus: 2,
                limit_mw: 150.0,
                reactance: 0.1,
            }],
        ),
        lses: vec![Lse {
            name: "LSE1".into(),
            bus: 2,
        }],
    }
}

fn params(name: &str, index: usize, bus: usize, initial_status_hours: i32) -> GeneratorParams {
    GeneratorParams {
        name: name.to_string(),
        index,
        bus,
        canary: false,
        min_up_hours: 1,
        min_down_hours: 1,
        ramp_up_mw: 200.0,
        ramp_down_mw: 200.0,
        startup_ramp_mw: 200.0,
        shutdown_ramp_mw: 200.0,
        cold_start_cost: 0.0,
        hot_start_cost: 10.0,
        shutdown_cost: 5.0,
        no_load_cost: 1.5,
        initial_power_mw: if initial_status_hours > 0 { 50.0 } else { 0.0 },
        initial_status_hours,
    }
}

/// GenCo1 at bus 1 (quadratic cost, starts on) and GenCo2 at bus 2 (flat
/// cost, starts off).
pub(crate) fn gencos() -> Vec<GenCo> {
    vec![
        GenCo::new(
            params("GenCo1", 0, 1, 4),
            SupplyOffer {
                a: 10.0,
                b: 0.01,
                cap_min_mw: 0.0,
                cap_max_mw: 200.0,
            },
        ),
        GenCo::new(
            params("GenCo2", 1, 2, -2),
            SupplyOffer {
                a: 20.0,
                b: 0.0,
                cap_min_mw: 10.0,
                cap_max_mw: 100.0,
            },
        ),
    ]
}

pub(crate) fn canary(g: GenCo) -> GenCo {
    let params = GeneratorParams {
        canary: true,
        ..g.params().clone()
    };
    GenCo::new(params, g.supply_offer())
}

/// Forecast for day `d` is `100 + d` MW then `80 + d` MW; actual load is
/// 5 MW higher.
pub(crate) fn load(days: usize) -> TableLoadScenario {
    let day = |d: usize, extra: f64| {
        let d = d as f64;
        HourlyMatrix::from_rows(&[vec![100.0 + d + extra], vec![80.0 + d + extra]], 1)
            .unwrap_or_else(|| HourlyMatrix::zeros(2, 1))
    };
    TableLoadScenario::new(
        (1..=days).map(|d| day(d, 0.0)).collect(),
        (1..=days).map(|d| day(d, 5.0)).collect(),
    )
}

pub(crate) fn schedule(hours: &[[u8; 2]]) -> ScheduleSet {
    let decisions = hours
        .iter()
        .enumerate()
        .map(|(i, h)| {
            CommitmentDecision::new(format!("GenCo{}", i + 1), i, h.to_vec())
                .unwrap_or_else(|e| panic!("{e}"))
        })
        .collect();
    ScheduleSet::new(2, decisions).unwrap_or_else(|e| panic!("{e}"))
}
