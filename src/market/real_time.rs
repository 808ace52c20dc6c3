//! Real-time market: redispatch of the committed fleet against actual load.

use serde::Serialize;
use tracing::{info, warn};

use crate::solver::{DispatchSolution, EconomicDispatch};

use super::commitment::{ScheduleSet, apply_canary_override};
use super::error::{MarketError, Stage};
use super::genco::{DailyCosts, GenCo, SanityViolation};
use super::grid::SupplyOffer;
use super::load::LoadScenario;
use super::types::{MarketConfig, MarketModel, canary_flags};

/// Everything the real-time market produced for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRealTime {
    pub day: usize,
    /// The schedule dispatch ran against, canary override applied.
    pub schedule: ScheduleSet,
    pub solution: DispatchSolution,
}

impl DailyRealTime {
    /// Dispatch of the generator in column `column` with no-solution hours
    /// zeroed (MW).
    pub fn dispatch_series(&self, column: usize) -> Vec<f64> {
        self.masked(|s, h| s.dispatch.get(h, column))
    }

    /// Cost breakdown of the generator in column `column`.
    pub fn costs(&self, column: usize) -> DailyCosts {
        DailyCosts {
            startup: self.masked(|s, h| s.startup_cost.get(h, column)),
            production: self.masked(|s, h| s.production_cost.get(h, column)),
            shutdown: self.masked(|s, h| s.shutdown_cost.get(h, column)),
        }
    }

    fn masked(&self, value: impl Fn(&DispatchSolution, usize) -> f64) -> Vec<f64> {
        let hours = self.schedule.hours_per_day();
        (0..hours)
            .map(|h| {
                if self.solution.has_solution.get(h).copied().unwrap_or(false) {
                    value(&self.solution, h)
                } else {
                    0.0
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RealTimeStage {
    config: MarketConfig,
}

impl RealTimeStage {
    pub fn new(config: MarketConfig) -> Self {
        Self { config }
    }

    /// Dispatches `day` against its actual load.
    ///
    /// Canary units are forced on before the solve. Nothing is posted to
    /// the generator records; see [`RealTimeStage::post`].
    ///
    /// # Errors
    ///
    /// `MarketError::MissingLoad` when the scenario has no actual load for
    /// `day`, `MarketError::Solver` when the dispatch solve fails.
    #[expect(clippy::too_many_arguments)]
    pub fn run<D: EconomicDispatch>(
        &self,
        day: usize,
        hour: usize,
        model: &MarketModel,
        gencos: &[GenCo],
        offers: &[SupplyOffer],
        schedule: &ScheduleSet,
        load: &dyn LoadScenario,
        solver: &mut D,
    ) -> Result<DailyRealTime, MarketError> {
        let actual = load.actual(day).ok_or(MarketError::MissingLoad {
            day,
            kind: "actual",
        })?;
        let schedule = apply_canary_override(schedule, &canary_flags(gencos));
        let problem = model.snapshot(
            day,
            gencos,
            offers,
            actual.truncated(self.config.hours_per_day),
            self.config.reserve_requirement_mw,
        );
        let solution = solver
            .solve_dispatch(&problem, &schedule)
            .map_err(|source| MarketError::Solver {
                stage: Stage::RealTime,
                day,
                hour,
                source,
            })?;
        let unsolved = solution.has_solution.iter().filter(|s| !**s).count();
        if unsolved > 0 {
            warn!(day, unsolved_hours = unsolved, "real-time dispatch has hours without a solution");
        }
        info!(day, "real-time dispatch solved");
        Ok(DailyRealTime {
            day,
            schedule,
            solution,
        })
    }

    /// Records dispatch and costs on every generator record.
    pub fn post(&self, outcome: &DailyRealTime, gencos: &mut [GenCo]) {
        for (column, g) in gencos.iter_mut().enumerate() {
            g.add_actual_dispatch(outcome.day, outcome.dispatch_series(column));
            g.add_daily_costs(outcome.day, outcome.costs(column));
        }
    }

    /// Flags output in uncommitted hours. Violations are logged, never fatal.
    pub fn sanity_check(&self, day: usize, gencos: &[GenCo]) -> Vec<SanityViolation> {
        let violations: Vec<SanityViolation> =
            gencos.iter().flat_map(|g| g.sanity_check(day)).collect();
        for v in &violations {
            warn!(%v, "sanity check failed");
        }
        violations
    }
}
