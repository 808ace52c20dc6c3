//! Day-indexed history of market results.

use std::collections::BTreeMap;

use serde::Serialize;

use super::commitment::ScheduleSet;
use super::genco::SanityViolation;
use super::real_time::DailyRealTime;

/// Results collected over a run.
///
/// Day-ahead schedules are keyed by the day they commit; real-time results by
/// the day they dispatch. Point lookups return `None` for hours the solver
/// marked as having no solution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultAccumulator {
    day_ahead: BTreeMap<usize, ScheduleSet>,
    real_time: BTreeMap<usize, DailyRealTime>,
    violations: Vec<SanityViolation>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_day_ahead(&mut self, day: usize, schedule: ScheduleSet) {
        self.day_ahead.insert(day, schedule);
    }

    pub fn record_real_time(&mut self, outcome: DailyRealTime) {
        self.real_time.insert(outcome.day, outcome);
    }

    pub fn record_violations(&mut self, violations: impl IntoIterator<Item = SanityViolation>) {
        self.violations.extend(violations);
    }

    pub fn day_ahead_schedule(&self, day: usize) -> Option<&ScheduleSet> {
        self.day_ahead.get(&day)
    }

    pub fn real_time(&self, day: usize) -> Option<&DailyRealTime> {
        self.real_time.get(&day)
    }

    /// Days with real-time results, ascending.
    pub fn real_time_days(&self) -> impl Iterator<Item = usize> + '_ {
        self.real_time.keys().copied()
    }

    pub fn day_ahead_days(&self) -> impl Iterator<Item = usize> + '_ {
        self.day_ahead.keys().copied()
    }

    pub fn violations(&self) -> &[SanityViolation] {
        &self.violations
    }

    /// Feasibility of `hour` on `day`; `None` when the day was not dispatched.
    pub fn has_solution(&self, day: usize, hour: usize) -> Option<bool> {
        self.real_time
            .get(&day)
            .and_then(|r| r.solution.has_solution.get(hour).copied())
    }

    fn solved(&self, day: usize, hour: usize) -> Option<&DailyRealTime> {
        self.real_time
            .get(&day)
            .filter(|r| r.solution.has_solution.get(hour).copied().unwrap_or(false))
    }

    /// Price at `bus` (1-based) in $/MWh.
    pub fn lmp(&self, day: usize, hour: usize, bus: usize) -> Option<f64> {
        let r = self.solved(day, hour)?;
        let column = bus.checked_sub(1)?;
        (column < r.solution.lmp.entities()).then(|| r.solution.lmp.get(hour, column))
    }

    /// Prices at every bus in `hour`, bus 1 first.
    pub fn lmp_row(&self, day: usize, hour: usize) -> Option<&[f64]> {
        self.solved(day, hour).map(|r| r.solution.lmp.row(hour))
    }

    /// Output of the generator in column `generator` (MW).
    pub fn dispatch(&self, day: usize, hour: usize, generator: usize) -> Option<f64> {
        let r = self.solved(day, hour)?;
        (generator < r.solution.dispatch.entities()).then(|| r.solution.dispatch.get(hour, generator))
    }

    /// Flow on branch `branch` (MW), positive in the branch direction.
    pub fn branch_flow(&self, day: usize, hour: usize, branch: usize) -> Option<f64> {
        let r = self.solved(day, hour)?;
        (branch < r.solution.branch_flow.entities())
            .then(|| r.solution.branch_flow.get(hour, branch))
    }

    /// Whether the generator was committed in the real-time schedule.
    pub fn committed(&self, day: usize, hour: usize, index: usize) -> Option<bool> {
        self.real_time
            .get(&day)
            .map(|r| r.schedule.is_on(index, hour))
    }

    /// Total production, start-up and shut-down cost of `day` ($).
    pub fn daily_cost(&self, day: usize) -> Option<f64> {
        let r = self.real_time.get(&day)?;
        Some(
            (0..r.solution.dispatch.entities())
                .map(|g| r.costs(g).total())
                .sum(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::matrix::HourlyMatrix;
    use crate::solver::DispatchSolution;

    fn outcome(day: usize, has_solution: Vec<bool>) -> DailyRealTime {
        let hours = has_solution.len();
        let filled = |entities: usize, v: f64| {
            let mut m = HourlyMatrix::zeros(hours, entities);
            m.map_in_place(|_| v);
            m
        };
        DailyRealTime {
            day,
            schedule: ScheduleSet::all_on(hours, [("GenCo1", 0)]).unwrap_or_else(|e| panic!("{e}")),
            solution: DispatchSolution {
                dispatch: filled(1, 90.0),
                lmp: filled(2, 25.0),
                branch_flow: filled(1, 40.0),
                production_cost: filled(1, 100.0),
                startup_cost: filled(1, 0.0),
                shutdown_cost: filled(1, 0.0),
                has_solution,
            },
        }
    }

    #[test]
    fn solved_hours_are_visible() {
        let mut acc = ResultAccumulator::new();
        acc.record_real_time(outcome(2, vec![true, true]));
        assert_eq!(acc.lmp(2, 0, 1), Some(25.0));
        assert_eq!(acc.lmp(2, 1, 2), Some(25.0));
        assert_eq!(acc.dispatch(2, 1, 0), Some(90.0));
        assert_eq!(acc.branch_flow(2, 0, 0), Some(40.0));
        assert_eq!(acc.daily_cost(2), Some(200.0));
    }

    #[test]
    fn no_solution_hours_are_absent() {
        let mut acc = ResultAccumulator::new();
        acc.record_real_time(outcome(2, vec![true, false]));
        assert_eq!(acc.has_solution(2, 1), Some(false));
        assert_eq!(acc.lmp(2, 1, 1), None);
        assert_eq!(acc.lmp_row(2, 1), None);
        assert_eq!(acc.dispatch(2, 1, 0), None);
        assert_eq!(acc.branch_flow(2, 1, 0), None);
        // costs of the unsolved hour count as zero
        assert_eq!(acc.daily_cost(2), Some(100.0));
    }

    #[test]
    fn out_of_range_lookups_are_absent() {
        let mut acc = ResultAccumulator::new();
        acc.record_real_time(outcome(2, vec![true, true]));
        assert_eq!(acc.lmp(2, 0, 0), None);
        assert_eq!(acc.lmp(2, 0, 3), None);
        assert_eq!(acc.dispatch(2, 0, 5), None);
        assert_eq!(acc.lmp(3, 0, 1), None);
        assert_eq!(acc.has_solution(1, 0), None);
    }

    #[test]
    fn day_ahead_history_is_keyed_by_target_day() {
        let mut acc = ResultAccumulator::new();
        let s = ScheduleSet::all_on(2, [("GenCo1", 0)]).unwrap_or_else(|e| panic!("{e}"));
        acc.record_day_ahead(3, s.clone());
        assert_eq!(acc.day_ahead_schedule(3), Some(&s));
        assert_eq!(acc.day_ahead_days().collect::<Vec<_>>(), vec![3]);
    }
}
