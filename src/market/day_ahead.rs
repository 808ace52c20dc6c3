//! Day-ahead market: offer snapshot and next-day unit commitment.

use serde::Serialize;
use tracing::info;

use crate::forecast::NaiveForecast;
use crate::solver::UnitCommitment;

use super::commitment::ScheduleSet;
use super::error::{MarketError, Stage};
use super::genco::GenCo;
use super::grid::SupplyOffer;
use super::load::LoadScenario;
use super::matrix::HourlyMatrix;
use super::types::{MarketConfig, MarketModel};

/// Offers and forecast load gathered at hour 0 for the next day's market.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayAheadSnapshot {
    /// Day the market clears for.
    pub target_day: usize,
    /// Supply offers, aligned with the generator records.
    pub offers: Vec<SupplyOffer>,
    /// Forecast load for `target_day`, hour by LSE (MW).
    pub forecast: HourlyMatrix,
    /// Forecast for the day after `target_day`, when the run covers it.
    pub lookahead: Option<HourlyMatrix>,
}

/// Builds the day-ahead snapshot and runs unit commitment for the next day.
#[derive(Debug, Clone, Copy)]
pub struct DayAheadStage {
    config: MarketConfig,
}

impl DayAheadStage {
    pub fn new(config: MarketConfig) -> Self {
        Self { config }
    }

    /// Gathers offers and forecasts for `day + 1`.
    ///
    /// Returns `Ok(None)` outside hour 0 and on the last day.
    ///
    /// # Errors
    ///
    /// `MarketError::MissingLoad` if the scenario has no forecast for the
    /// target day.
    pub fn prepare(
        &self,
        day: usize,
        hour: usize,
        gencos: &[GenCo],
        load: &dyn LoadScenario,
    ) -> Result<Option<DayAheadSnapshot>, MarketError> {
        if hour != 0 || self.config.is_last_day(day) {
            return Ok(None);
        }
        let target_day = day + 1;
        let forecast = load.forecast(target_day).ok_or(MarketError::MissingLoad {
            day: target_day,
            kind: "forecast",
        })?;
        let lookahead = if self.config.is_last_day(target_day) {
            None
        } else {
            load.forecast(target_day + 1)
        };
        Ok(Some(DayAheadSnapshot {
            target_day,
            offers: gencos.iter().map(GenCo::supply_offer).collect(),
            forecast,
            lookahead,
        }))
    }

    /// Demand over the commitment horizon, extended past one day from the
    /// look-ahead forecast or by repeating the target day.
    pub fn horizon_demand(&self, snapshot: &DayAheadSnapshot) -> HourlyMatrix {
        let horizon = self.config.uc_horizon_hours.max(self.config.hours_per_day);
        NaiveForecast.extend(&snapshot.forecast, snapshot.lookahead.as_ref(), horizon)
    }

    /// Solves unit commitment for the snapshot's target day.
    ///
    /// # Errors
    ///
    /// `MarketError::Solver` when the solve fails.
    pub fn commit_next_day<U: UnitCommitment>(
        &self,
        day: usize,
        hour: usize,
        snapshot: &DayAheadSnapshot,
        model: &MarketModel,
        gencos: &[GenCo],
        solver: &mut U,
    ) -> Result<ScheduleSet, MarketError> {
        let problem = model.snapshot(
            snapshot.target_day,
            gencos,
            &snapshot.offers,
            self.horizon_demand(snapshot),
            self.config.reserve_requirement_mw,
        );
        let schedule = solver
            .solve_commitment(&problem)
            .map_err(|source| MarketError::Solver {
                stage: Stage::UnitCommitment,
                day,
                hour,
                source,
            })?;
        let on_hours: usize = schedule.decisions().iter().map(|d| d.on_hours()).sum();
        info!(
            target_day = snapshot.target_day,
            generators = schedule.len(),
            on_hours,
            "day-ahead commitment solved"
        );
        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::fixtures;
    use crate::solver::{ModelSnapshot, SolverError};

    struct Recording {
        seen: Vec<ModelSnapshot>,
    }

    impl UnitCommitment for Recording {
        fn solve_commitment(&mut self, model: &ModelSnapshot) -> Result<ScheduleSet, SolverError> {
            self.seen.push(model.clone());
            Ok(ScheduleSet::all_on(2, model.generator_keys())?)
        }
    }

    fn stage(days: usize, uc_horizon_hours: usize) -> DayAheadStage {
        let mut config = fixtures::config(days);
        config.uc_horizon_hours = uc_horizon_hours;
        DayAheadStage::new(config)
    }

    #[test]
    fn prepare_only_at_hour_zero_before_last_day() {
        let load = fixtures::load(3);
        let gencos = fixtures::gencos();
        let s = stage(3, 2);
        assert!(matches!(s.prepare(1, 1, &gencos, &load), Ok(None)));
        assert!(matches!(s.prepare(3, 0, &gencos, &load), Ok(None)));
        let snap = s.prepare(1, 0, &gencos, &load).ok().flatten();
        assert_eq!(snap.as_ref().map(|s| s.target_day), Some(2));
        assert!(snap.as_ref().is_some_and(|s| s.lookahead.is_some()));
    }

    #[test]
    fn no_lookahead_past_the_run() {
        let load = fixtures::load(3);
        let snap = stage(3, 2)
            .prepare(2, 0, &fixtures::gencos(), &load)
            .ok()
            .flatten();
        assert_eq!(snap.map(|s| s.lookahead), Some(None));
    }

    #[test]
    fn missing_forecast_is_an_error() {
        let load = fixtures::load(1);
        let e = stage(3, 2).prepare(1, 0, &fixtures::gencos(), &load);
        assert!(matches!(
            e,
            Err(MarketError::MissingLoad { day: 2, kind: "forecast" })
        ));
    }

    #[test]
    fn commitment_model_spans_the_horizon() {
        let load = fixtures::load(3);
        let gencos = fixtures::gencos();
        let s = stage(3, 4);
        let snap = s
            .prepare(1, 0, &gencos, &load)
            .ok()
            .flatten()
            .unwrap_or_else(|| panic!("snapshot expected"));
        let mut solver = Recording { seen: Vec::new() };
        let schedule = s.commit_next_day(1, 1, &snap, &fixtures::model(), &gencos, &mut solver);
        assert!(schedule.is_ok());
        let problem = &solver.seen[0];
        assert_eq!(problem.day, 2);
        assert_eq!(problem.horizon_hours, 4);
        // hours 2 and 3 come from day 3's forecast
        assert_eq!(problem.demand.column(0), vec![102.0, 82.0, 103.0, 83.0]);
    }
}
