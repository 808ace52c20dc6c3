//! Solver integration: unit commitment and economic dispatch.
//!
//! The market talks to solvers through [`UnitCommitment`] and
//! [`EconomicDispatch`]. [`gateway::SolverGateway`] drives an external
//! program through model, commitment and result files; [`builtin`] holds
//! in-process engines for runs without one.

pub mod builtin;
pub mod commitment_file;
pub mod error;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod gateway;
pub mod model_file;
pub mod process;
pub mod result_file;

use serde::Serialize;

use crate::market::commitment::ScheduleSet;
use crate::market::grid::GridModel;
use crate::market::matrix::HourlyMatrix;
use crate::units::BasePower;

pub use error::{ParseError, ParseErrorKind, SolverError};
pub use gateway::SolverGateway;
pub use model_file::{GeneratorSnapshot, ModelSnapshot};

use result_file::RawDispatch;

/// Produces the next day's commitment schedule.
pub trait UnitCommitment {
    /// Solves unit commitment over `model` and returns the first day of the
    /// resulting schedule.
    fn solve_commitment(&mut self, model: &ModelSnapshot) -> Result<ScheduleSet, SolverError>;
}

/// Dispatches committed units against realized load.
pub trait EconomicDispatch {
    fn solve_dispatch(
        &mut self,
        model: &ModelSnapshot,
        schedule: &ScheduleSet,
    ) -> Result<DispatchSolution, SolverError>;
}

/// One day of dispatch results in SI units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchSolution {
    /// Hour by generator (MW).
    pub dispatch: HourlyMatrix,
    /// Hour by bus ($/MWh).
    pub lmp: HourlyMatrix,
    /// Hour by branch (MW), positive from `from_bus` to `to_bus`.
    pub branch_flow: HourlyMatrix,
    /// Hour by generator ($).
    pub production_cost: HourlyMatrix,
    pub startup_cost: HourlyMatrix,
    pub shutdown_cost: HourlyMatrix,
    /// Hour-level feasibility; data in a `false` hour is not a result.
    pub has_solution: Vec<bool>,
}

impl DispatchSolution {
    /// Converts per-unit solver output to SI and derives branch flows from
    /// the voltage angles.
    pub fn from_raw(raw: RawDispatch, grid: &GridModel, base: BasePower) -> Self {
        let mut branch_flow = branch_flows(&raw.voltage_angles, grid);
        branch_flow.map_in_place(|f| base.power_to_si(f));
        let mut dispatch = raw.dispatch;
        dispatch.map_in_place(|p| base.power_to_si(p));
        let mut lmp = raw.lmp;
        lmp.map_in_place(|price| base.price_to_si(price));
        Self {
            dispatch,
            lmp,
            branch_flow,
            production_cost: raw.production_cost,
            startup_cost: raw.startup_cost,
            shutdown_cost: raw.shutdown_cost,
            has_solution: raw.has_solution,
        }
    }

    pub fn hours(&self) -> usize {
        self.has_solution.len()
    }
}

/// DC branch flows in per-unit: `(θ_from - θ_to) / x` for every hour.
pub fn branch_flows(angles: &HourlyMatrix, grid: &GridModel) -> HourlyMatrix {
    let mut flows = HourlyMatrix::zeros(angles.hours(), grid.branches.len());
    for h in 0..angles.hours() {
        for (n, b) in grid.branches.iter().enumerate() {
            let delta = angles.get(h, b.from_bus - 1) - angles.get(h, b.to_bus - 1);
            flows.set(h, n, delta / b.reactance);
        }
    }
    flows
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::market::grid::Branch;

    fn triangle() -> GridModel {
        let branch = |from_bus, to_bus, reactance| Branch {
            from_bus,
            to_bus,
            limit_mw: 100.0,
            reactance,
        };
        GridModel::new(3, vec![branch(1, 2, 0.1), branch(2, 3, 0.2), branch(1, 3, 0.05)])
    }

    #[test]
    fn flows_follow_angle_difference() {
        let angles = HourlyMatrix::from_rows(&[vec![0.0, -0.01, -0.03]], 3)
            .unwrap_or_else(|| HourlyMatrix::zeros(1, 3));
        let f = branch_flows(&angles, &triangle());
        assert_relative_eq!(f.get(0, 0), 0.1, epsilon = 1e-12);
        assert_relative_eq!(f.get(0, 1), 0.1, epsilon = 1e-12);
        assert_relative_eq!(f.get(0, 2), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn from_raw_converts_units() {
        fn m(rows: &[Vec<f64>], e: usize) -> HourlyMatrix {
            HourlyMatrix::from_rows(rows, e).unwrap_or_else(|| HourlyMatrix::zeros(rows.len(), e))
        }
        let raw = RawDispatch {
            lmp: m(&[vec![1500.0, 1500.0, 1600.0]], 3),
            voltage_angles: m(&[vec![0.0, -0.01, -0.03]], 3),
            dispatch: m(&[vec![1.2]], 1),
            production_cost: m(&[vec![300.0]], 1),
            startup_cost: m(&[vec![0.0]], 1),
            shutdown_cost: m(&[vec![0.0]], 1),
            has_solution: vec![true],
        };
        let s = DispatchSolution::from_raw(raw, &triangle(), BasePower::new(100.0));
        assert_relative_eq!(s.dispatch.get(0, 0), 120.0);
        assert_relative_eq!(s.lmp.get(0, 2), 16.0);
        assert_relative_eq!(s.branch_flow.get(0, 2), 60.0, epsilon = 1e-9);
        // costs are already in dollars
        assert_relative_eq!(s.production_cost.get(0, 0), 300.0);
        assert_eq!(s.hours(), 1);
    }
}
