//! In-process engines for runs without an external solver.
//!
//! These ignore the network: every committed unit serves a single copper
//! plate and all buses see the same price. They exist so the market cycle
//! can run end to end from a config file alone.

use crate::market::commitment::ScheduleSet;
use crate::market::matrix::HourlyMatrix;

use super::error::SolverError;
use super::model_file::{GeneratorSnapshot, ModelSnapshot};
use super::{DispatchSolution, EconomicDispatch, UnitCommitment};

const BISECTION_STEPS: usize = 100;
const PRICE_TOL: f64 = 1e-6;

/// Commits every generator in every hour.
#[derive(Debug, Clone, Copy)]
pub struct AllOnCommitment {
    hours_per_day: usize,
}

impl AllOnCommitment {
    pub fn new(hours_per_day: usize) -> Self {
        Self { hours_per_day }
    }
}

impl UnitCommitment for AllOnCommitment {
    fn solve_commitment(&mut self, model: &ModelSnapshot) -> Result<ScheduleSet, SolverError> {
        Ok(ScheduleSet::all_on(
            self.hours_per_day,
            model.generator_keys(),
        )?)
    }
}

/// Merit-order dispatch of committed units against total demand.
///
/// The system price is found by bisection on the marginal cost `a + 2·b·p`.
/// An hour whose demand falls outside the committed capacity range has no
/// solution.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopperPlateDispatch;

impl EconomicDispatch for CopperPlateDispatch {
    fn solve_dispatch(
        &mut self,
        model: &ModelSnapshot,
        schedule: &ScheduleSet,
    ) -> Result<DispatchSolution, SolverError> {
        let hours = model.horizon_hours;
        let gens = &model.generators;
        let mut out = DispatchSolution {
            dispatch: HourlyMatrix::zeros(hours, gens.len()),
            lmp: HourlyMatrix::zeros(hours, model.grid.buses),
            branch_flow: HourlyMatrix::zeros(hours, model.grid.branches.len()),
            production_cost: HourlyMatrix::zeros(hours, gens.len()),
            startup_cost: HourlyMatrix::zeros(hours, gens.len()),
            shutdown_cost: HourlyMatrix::zeros(hours, gens.len()),
            has_solution: vec![false; hours],
        };

        for h in 0..hours {
            let committed: Vec<bool> = gens
                .iter()
                .map(|g| schedule.is_on(g.params.index, h))
                .collect();
            let load = model.demand.row_sum(h);
            let Some((lambda, dispatch)) = clear_hour(gens, &committed, load) else {
                continue;
            };
            out.has_solution[h] = true;
            for bus in 0..model.grid.buses {
                out.lmp.set(h, bus, lambda);
            }
            for (i, g) in gens.iter().enumerate() {
                let was_on = if h == 0 {
                    g.unit_on_t0 > 0
                } else {
                    schedule.is_on(g.params.index, h - 1)
                };
                if committed[i] {
                    out.dispatch.set(h, i, dispatch[i]);
                    out.production_cost.set(
                        h,
                        i,
                        g.params.no_load_cost + g.offer.variable_cost(dispatch[i]),
                    );
                    if !was_on {
                        out.startup_cost.set(h, i, g.params.hot_start_cost);
                    }
                } else if was_on {
                    out.shutdown_cost.set(h, i, g.params.shutdown_cost);
                }
            }
        }
        Ok(out)
    }
}

fn output_at(g: &GeneratorSnapshot, lambda: f64) -> f64 {
    let o = &g.offer;
    if o.b > 0.0 {
        ((lambda - o.a) / (2.0 * o.b)).clamp(o.cap_min_mw, o.cap_max_mw)
    } else if lambda >= o.a {
        o.cap_max_mw
    } else {
        o.cap_min_mw
    }
}

/// Price and per-generator output for one hour, or `None` when `load` cannot
/// be met by the committed units.
fn clear_hour(gens: &[GeneratorSnapshot], committed: &[bool], load: f64) -> Option<(f64, Vec<f64>)> {
    let on: Vec<&GeneratorSnapshot> = gens
        .iter()
        .zip(committed)
        .filter_map(|(g, c)| c.then_some(g))
        .collect();
    if on.is_empty() {
        return None;
    }
    let floor: f64 = on.iter().map(|g| g.offer.cap_min_mw).sum();
    let ceiling: f64 = on.iter().map(|g| g.offer.cap_max_mw).sum();
    if load < floor - PRICE_TOL || load > ceiling + PRICE_TOL {
        return None;
    }

    let mut lo = on
        .iter()
        .map(|g| g.offer.marginal_cost(g.offer.cap_min_mw))
        .fold(f64::INFINITY, f64::min);
    let mut hi = on
        .iter()
        .map(|g| g.offer.marginal_cost(g.offer.cap_max_mw))
        .fold(f64::NEG_INFINITY, f64::max);
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        let total: f64 = on.iter().map(|g| output_at(g, mid)).sum();
        if total < load {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= PRICE_TOL * PRICE_TOL {
            break;
        }
    }
    let lambda = 0.5 * (lo + hi);

    let mut dispatch: Vec<f64> = gens
        .iter()
        .zip(committed)
        .map(|(g, c)| if *c { output_at(g, lambda) } else { 0.0 })
        .collect();

    // flat-cost units at the margin absorb what the step curve leaves over
    let mut residual = load - dispatch.iter().sum::<f64>();
    for (i, g) in gens.iter().enumerate() {
        if residual.abs() <= PRICE_TOL {
            break;
        }
        if !committed[i] || g.offer.b > 0.0 || (g.offer.a - lambda).abs() > PRICE_TOL {
            continue;
        }
        let delta = if residual > 0.0 {
            residual.min(g.offer.cap_max_mw - dispatch[i])
        } else {
            residual.max(g.offer.cap_min_mw - dispatch[i])
        };
        dispatch[i] += delta;
        residual -= delta;
    }
    Some((lambda, dispatch))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::market::commitment::CommitmentDecision;
    use crate::solver::fixtures::two_bus_snapshot;

    fn all_on(model: &ModelSnapshot) -> ScheduleSet {
        AllOnCommitment::new(model.horizon_hours)
            .solve_commitment(model)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn all_on_commits_everything() {
        let model = two_bus_snapshot();
        let s = all_on(&model);
        assert_eq!(s.len(), 2);
        assert!(s.decisions().iter().all(|d| d.on_hours() == 2));
    }

    #[test]
    fn quadratic_unit_sets_the_price() {
        let model = two_bus_snapshot();
        let sol = CopperPlateDispatch
            .solve_dispatch(&model, &all_on(&model))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(sol.has_solution, vec![true, true]);
        // flat unit sits at its 10 MW floor, the quadratic unit covers the rest
        assert_relative_eq!(sol.dispatch.get(0, 1), 10.0, epsilon = 1e-6);
        assert_relative_eq!(sol.dispatch.get(0, 0), 110.0, epsilon = 1e-6);
        assert_relative_eq!(sol.lmp.get(0, 0), 12.2, epsilon = 1e-6);
        assert_relative_eq!(sol.lmp.get(0, 1), 12.2, epsilon = 1e-6);
        assert_relative_eq!(sol.lmp.get(1, 0), 11.4, epsilon = 1e-6);
        assert_relative_eq!(sol.production_cost.get(0, 0), 1222.5, epsilon = 1e-3);
    }

    #[test]
    fn flat_unit_at_the_margin_takes_the_residual() {
        let mut model = two_bus_snapshot();
        model.demand = HourlyMatrix::from_rows(&[vec![250.0], vec![80.0]], 1)
            .unwrap_or_else(|| HourlyMatrix::zeros(2, 1));
        let sol = CopperPlateDispatch
            .solve_dispatch(&model, &all_on(&model))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_relative_eq!(sol.dispatch.get(0, 0), 200.0, epsilon = 1e-6);
        assert_relative_eq!(sol.dispatch.get(0, 1), 50.0, epsilon = 1e-6);
        assert_relative_eq!(sol.lmp.get(0, 0), 20.0, epsilon = 1e-6);
    }

    #[test]
    fn load_beyond_capacity_has_no_solution() {
        let mut model = two_bus_snapshot();
        model.demand = HourlyMatrix::from_rows(&[vec![400.0], vec![80.0]], 1)
            .unwrap_or_else(|| HourlyMatrix::zeros(2, 1));
        let sol = CopperPlateDispatch
            .solve_dispatch(&model, &all_on(&model))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(sol.has_solution, vec![false, true]);
        assert_eq!(sol.dispatch.row(0), &[0.0, 0.0]);
    }

    #[test]
    fn start_and_stop_costs_follow_transitions() {
        let model = two_bus_snapshot();
        // GenCo1 starts on (t0 = +4) and stops in hour 1; GenCo2 starts off
        // (t0 = -2) and is started in hour 0
        let schedule = ScheduleSet::new(
            2,
            vec![
                CommitmentDecision::new("GenCo1", 0, vec![1, 0]).unwrap_or_else(|e| panic!("{e}")),
                CommitmentDecision::new("GenCo2", 1, vec![1, 1]).unwrap_or_else(|e| panic!("{e}")),
            ],
        )
        .unwrap_or_else(|e| panic!("{e}"));
        let sol = CopperPlateDispatch
            .solve_dispatch(&model, &schedule)
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(sol.startup_cost.get(0, 0), 0.0);
        assert_eq!(sol.startup_cost.get(0, 1), 10.0);
        assert_eq!(sol.shutdown_cost.get(1, 0), 5.0);
        assert_eq!(sol.dispatch.get(1, 0), 0.0);
        assert_relative_eq!(sol.dispatch.get(1, 1), 80.0, epsilon = 1e-6);
    }
}
