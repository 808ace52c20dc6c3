//! Post-hoc summary of a market run.

use std::fmt;

use serde::Serialize;

use super::accumulator::ResultAccumulator;

/// Aggregate figures derived from the accumulated results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Days with a real-time dispatch.
    pub days_cleared: usize,
    /// Day-ahead commitment solves recorded.
    pub commitments: usize,
    /// Total production cost ($).
    pub production_cost: f64,
    /// Total start-up cost ($).
    pub startup_cost: f64,
    /// Total shut-down cost ($).
    pub shutdown_cost: f64,
    /// Mean LMP over buses and solved hours ($/MWh).
    pub mean_lmp: f64,
    /// Hours the dispatch solver reported as infeasible.
    pub no_solution_hours: usize,
    /// Largest absolute branch flow in a solved hour (MW).
    pub peak_branch_flow_mw: f64,
    pub sanity_violations: usize,
}

impl RunSummary {
    pub fn from_results(acc: &ResultAccumulator) -> Self {
        let mut production = 0.0;
        let mut startup = 0.0;
        let mut shutdown = 0.0;
        let mut lmp_sum = 0.0;
        let mut lmp_count = 0_usize;
        let mut unsolved = 0_usize;
        let mut peak_flow = 0.0_f64;

        for day in acc.real_time_days() {
            let Some(r) = acc.real_time(day) else {
                continue;
            };
            for g in 0..r.solution.dispatch.entities() {
                let c = r.costs(g);
                production += c.production.iter().sum::<f64>();
                startup += c.startup.iter().sum::<f64>();
                shutdown += c.shutdown.iter().sum::<f64>();
            }
            for (hour, solved) in r.solution.has_solution.iter().enumerate() {
                if !solved {
                    unsolved += 1;
                    continue;
                }
                for price in r.solution.lmp.row(hour) {
                    lmp_sum += price;
                    lmp_count += 1;
                }
                for flow in r.solution.branch_flow.row(hour) {
                    peak_flow = peak_flow.max(flow.abs());
                }
            }
        }

        Self {
            days_cleared: acc.real_time_days().count(),
            commitments: acc.day_ahead_days().count(),
            production_cost: production,
            startup_cost: startup,
            shutdown_cost: shutdown,
            mean_lmp: if lmp_count > 0 {
                lmp_sum / lmp_count as f64
            } else {
                0.0
            },
            no_solution_hours: unsolved,
            peak_branch_flow_mw: peak_flow,
            sanity_violations: acc.violations().len(),
        }
    }

    pub fn total_cost(&self) -> f64 {
        self.production_cost + self.startup_cost + self.shutdown_cost
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Market Summary ---")?;
        writeln!(f, "Days cleared:          {}", self.days_cleared)?;
        writeln!(f, "Commitment solves:     {}", self.commitments)?;
        writeln!(f, "Production cost:       {:.2} $", self.production_cost)?;
        writeln!(f, "Start-up cost:         {:.2} $", self.startup_cost)?;
        writeln!(f, "Shut-down cost:        {:.2} $", self.shutdown_cost)?;
        writeln!(f, "Total cost:            {:.2} $", self.total_cost())?;
        writeln!(f, "Mean LMP:              {:.3} $/MWh", self.mean_lmp)?;
        writeln!(f, "No-solution hours:     {}", self.no_solution_hours)?;
        writeln!(f, "Peak branch flow:      {:.2} MW", self.peak_branch_flow_mw)?;
        write!(f, "Sanity violations:     {}", self.sanity_violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::commitment::ScheduleSet;
    use crate::market::matrix::HourlyMatrix;
    use crate::market::real_time::DailyRealTime;
    use crate::solver::DispatchSolution;

    fn m(rows: &[Vec<f64>], e: usize) -> HourlyMatrix {
        HourlyMatrix::from_rows(rows, e).unwrap_or_else(|| HourlyMatrix::zeros(rows.len(), e))
    }

    fn day(day: usize, has_solution: Vec<bool>) -> DailyRealTime {
        DailyRealTime {
            day,
            schedule: ScheduleSet::all_on(2, [("GenCo1", 0)]).unwrap_or_else(|e| panic!("{e}")),
            solution: DispatchSolution {
                dispatch: m(&[vec![100.0], vec![80.0]], 1),
                lmp: m(&[vec![20.0, 22.0], vec![30.0, 32.0]], 2),
                branch_flow: m(&[vec![-60.0], vec![40.0]], 1),
                production_cost: m(&[vec![1000.0], vec![800.0]], 1),
                startup_cost: m(&[vec![50.0], vec![0.0]], 1),
                shutdown_cost: m(&[vec![0.0], vec![0.0]], 1),
                has_solution,
            },
        }
    }

    #[test]
    fn aggregates_solved_hours() {
        let mut acc = ResultAccumulator::new();
        acc.record_real_time(day(2, vec![true, true]));
        acc.record_real_time(day(3, vec![true, false]));
        let s = RunSummary::from_results(&acc);
        assert_eq!(s.days_cleared, 2);
        assert_eq!(s.no_solution_hours, 1);
        assert_eq!(s.production_cost, 2800.0);
        assert_eq!(s.startup_cost, 100.0);
        // (20 + 22 + 30 + 32 + 20 + 22) / 6
        assert!((s.mean_lmp - 146.0 / 6.0).abs() < 1e-9);
        assert_eq!(s.peak_branch_flow_mw, 60.0);
    }

    #[test]
    fn empty_run() {
        let s = RunSummary::from_results(&ResultAccumulator::new());
        assert_eq!(s.days_cleared, 0);
        assert_eq!(s.mean_lmp, 0.0);
        assert_eq!(s.total_cost(), 0.0);
    }

    #[test]
    fn display_has_header() {
        let text = RunSummary::from_results(&ResultAccumulator::new()).to_string();
        assert!(text.starts_with("--- Market Summary ---"));
        assert!(text.contains("Days cleared:          0"));
    }
}
