//! Shared solver test fixtures.

use crate::market::grid::{Branch, GeneratorParams, GridModel, Lse, SupplyOffer};
use crate::market::matrix::HourlyMatrix;

use super::model_file::{GeneratorSnapshot, ModelSnapshot};

/// Two buses, one line, a quadratic unit at bus 1 and a flat unit at bus 2.
/// Demand of 120 MW then 80 MW sits at bus 2.
pub(crate) fn two_bus_snapshot() -> ModelSnapshot {
    let gen_params = |name: &str, index, bus| GeneratorParams {
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
        initial_power_mw: 0.0,
        initial_status_hours: 1,
    };
    ModelSnapshot {
        day: 2,
        horizon_hours: 2,
        grid: GridModel::new(
            2,
            vec![Branch {
                from_bus: 1,
                to_bus: 2,
                limit_mw: 150.0,
                reactance: 0.1,
            }],
        ),
        generators: vec![
            GeneratorSnapshot {
                params: gen_params("GenCo1", 0, 1),
                offer: SupplyOffer {
                    a: 10.0,
                    b: 0.01,
                    cap_min_mw: 0.0,
                    cap_max_mw: 200.0,
                },
                power_t0_mw: 250.0,
                unit_on_t0: 4,
            },
            GeneratorSnapshot {
                params: gen_params("GenCo2", 1, 2),
                offer: SupplyOffer {
                    a: 20.0,
                    b: 0.0,
                    cap_min_mw: 10.0,
                    cap_max_mw: 100.0,
                },
                power_t0_mw: 50.0,
                unit_on_t0: -2,
            },
        ],
        lses: vec![Lse {
            name: "LSE1".into(),
            bus: 2,
        }],
        demand: HourlyMatrix::from_rows(&[vec![120.0], vec![80.0]], 1)
            .unwrap_or_else(|| HourlyMatrix::zeros(2, 1)),
        reserve_requirement_mw: 10.0,
    }
}
