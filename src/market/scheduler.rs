//! The market operator's state machine over the (day, hour) grid.

use std::fmt;

use serde::Serialize;
use tracing::{error, info, info_span, warn};

use crate::solver::{EconomicDispatch, UnitCommitment};

use super::accumulator::ResultAccumulator;
use super::clock::MarketClock;
use super::commitment::{ScheduleSet, apply_canary_override};
use super::day_ahead::{DayAheadSnapshot, DayAheadStage};
use super::error::{MarketError, Stage};
use super::feasibility::warn_on_shortfall;
use super::genco::GenCo;
use super::grid::SupplyOffer;
use super::load::LoadScenario;
use super::matrix::HourlyMatrix;
use super::real_time::RealTimeStage;
use super::status::{StatusEvent, StatusKind, StatusObserver};
use super::types::{MarketConfig, MarketModel, canary_flags};

/// Where the scheduler stands.
///
/// `RunningHour` and `Failed` carry the last stamp attempted; `Paused` and
/// `Stopped` carry the next stamp that would run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    Idle,
    RunningHour { day: usize, hour: usize },
    Paused { day: usize, hour: usize },
    Completed,
    Failed { day: usize, hour: usize },
    Stopped { day: usize, hour: usize },
}

impl SchedulerState {
    /// No further steps will run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed { .. } | Self::Stopped { .. }
        )
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::RunningHour { day, hour } => write!(f, "running (day {day}, hour {hour})"),
            Self::Paused { day, hour } => write!(f, "paused before (day {day}, hour {hour})"),
            Self::Completed => write!(f, "completed"),
            Self::Failed { day, hour } => write!(f, "failed at (day {day}, hour {hour})"),
            Self::Stopped { day, hour } => write!(f, "stopped before (day {day}, hour {hour})"),
        }
    }
}

/// How often each stage has run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageCounters {
    /// Day-ahead snapshots assembled.
    pub day_ahead: usize,
    /// Unit-commitment solves.
    pub unit_commitment: usize,
    /// Real-time dispatch days posted.
    pub real_time: usize,
    /// End-of-day rollovers.
    pub rollover: usize,
}

/// State handed from one hour to the next.
#[derive(Debug, Clone, Default)]
struct Carry {
    today_forecast: Option<HourlyMatrix>,
    today_actual: Option<HourlyMatrix>,
    snapshot: Option<DayAheadSnapshot>,
    da_schedule: Option<ScheduleSet>,
    rt_schedule: Option<ScheduleSet>,
    rt_offers: Vec<SupplyOffer>,
}

/// Sequences the day-ahead and real-time markets across a run.
///
/// Generic over the commitment engine `U` and the dispatch engine `D`.
/// Stamps must arrive as (1, 0), (1, 1), ... in order; anything else fails
/// the run. Pause and stop take effect between steps.
pub struct MarketScheduler<U, D> {
    config: MarketConfig,
    model: MarketModel,
    gencos: Vec<GenCo>,
    load: Box<dyn LoadScenario + Send>,
    uc: U,
    ed: D,
    day_ahead: DayAheadStage,
    real_time: RealTimeStage,
    observers: Vec<Box<dyn StatusObserver + Send>>,
    accumulator: ResultAccumulator,
    clock: MarketClock,
    carry: Carry,
    state: SchedulerState,
    last_stamp: Option<(usize, usize)>,
    counters: StageCounters,
    last_error: Option<MarketError>,
}

impl<U: UnitCommitment, D: EconomicDispatch> MarketScheduler<U, D> {
    /// Creates a scheduler in the `Idle` state.
    ///
    /// `gencos` must be ordered by generator index.
    pub fn new(
        config: MarketConfig,
        model: MarketModel,
        gencos: Vec<GenCo>,
        load: Box<dyn LoadScenario + Send>,
        uc: U,
        ed: D,
    ) -> Self {
        Self {
            config,
            model,
            gencos,
            load,
            uc,
            ed,
            day_ahead: DayAheadStage::new(config),
            real_time: RealTimeStage::new(config),
            observers: Vec::new(),
            accumulator: ResultAccumulator::new(),
            clock: MarketClock::new(config.days, config.hours_per_day),
            carry: Carry::default(),
            state: SchedulerState::Idle,
            last_stamp: None,
            counters: StageCounters::default(),
            last_error: None,
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn StatusObserver + Send>) {
        self.observers.push(observer);
    }

    /// Runs one hour.
    ///
    /// Returns the new state. A terminal or paused scheduler returns its
    /// state unchanged without running anything.
    pub fn step(&mut self, day: usize, hour: usize) -> SchedulerState {
        if self.state.is_terminal() || matches!(self.state, SchedulerState::Paused { .. }) {
            warn!(day, hour, state = %self.state, "step refused");
            return self.state;
        }

        let expected = self.clock.peek();
        if expected != Some((day, hour)) {
            return self.fail(
                day,
                hour,
                MarketError::Sequencing {
                    day,
                    hour,
                    expected,
                },
            );
        }

        self.state = SchedulerState::RunningHour { day, hour };
        let span = info_span!("hour", day, hour);
        let _guard = span.enter();

        let carry = std::mem::take(&mut self.carry);
        match self.run_hour(carry, day, hour) {
            Ok(carry) => {
                self.carry = carry;
                self.clock.tick();
                self.last_stamp = Some((day, hour));
                if self.clock.is_last(day, hour) {
                    info!(counters = ?self.counters, "market run completed");
                    self.state = SchedulerState::Completed;
                }
                self.state
            }
            Err(e) => self.fail(day, hour, e),
        }
    }

    fn fail(&mut self, day: usize, hour: usize, e: MarketError) -> SchedulerState {
        error!(day, hour, error = %e, "market run failed");
        self.last_error = Some(e);
        self.state = SchedulerState::Failed { day, hour };
        self.state
    }

    fn run_hour(&mut self, mut carry: Carry, day: usize, hour: usize) -> Result<Carry, MarketError> {
        let last_day = self.config.is_last_day(day);

        if hour == 0 {
            if let Some(snapshot) =
                self.day_ahead
                    .prepare(day, hour, &self.gencos, self.load.as_ref())?
            {
                self.counters.day_ahead += 1;
                carry.snapshot = Some(snapshot);
            }
            let forecast = self.load.forecast(day).ok_or(MarketError::MissingLoad {
                day,
                kind: "forecast",
            })?;
            let actual = self.load.actual(day).ok_or(MarketError::MissingLoad {
                day,
                kind: "actual",
            })?;
            let offers: Vec<SupplyOffer> = self.gencos.iter().map(GenCo::supply_offer).collect();
            warn_on_shortfall(day, &offers, &forecast, &self.config);
            carry.today_forecast = Some(forecast);
            carry.today_actual = Some(actual);

            if day > 1 {
                self.run_real_time(&carry, day, hour)?;
            }
        }

        if hour == 1 && !last_day {
            let snapshot = carry.snapshot.as_ref().ok_or(MarketError::MissingSchedule {
                stage: Stage::UnitCommitment,
                day,
            })?;
            let schedule = self.day_ahead.commit_next_day(
                day,
                hour,
                snapshot,
                &self.model,
                &self.gencos,
                &mut self.uc,
            )?;
            self.counters.unit_commitment += 1;
            self.accumulator.record_day_ahead(day + 1, schedule.clone());
            carry.da_schedule = Some(schedule);
        }

        self.announce(&carry, day, hour);

        if hour + 1 == self.config.hours_per_day && !last_day {
            self.rollover(&mut carry, day)?;
        }
        Ok(carry)
    }

    fn run_real_time(&mut self, carry: &Carry, day: usize, hour: usize) -> Result<(), MarketError> {
        let schedule = carry.rt_schedule.as_ref().ok_or(MarketError::MissingSchedule {
            stage: Stage::RealTime,
            day,
        })?;
        let outcome = self.real_time.run(
            day,
            hour,
            &self.model,
            &self.gencos,
            &carry.rt_offers,
            schedule,
            self.load.as_ref(),
            &mut self.ed,
        )?;
        self.real_time.post(&outcome, &mut self.gencos);
        self.accumulator.record_real_time(outcome);
        self.counters.real_time += 1;

        let violations = self.real_time.sanity_check(day, &self.gencos);
        self.accumulator.record_violations(violations);
        Ok(())
    }

    fn rollover(&mut self, carry: &mut Carry, day: usize) -> Result<(), MarketError> {
        let (Some(snapshot), Some(da)) = (&carry.snapshot, &carry.da_schedule) else {
            return Err(MarketError::MissingSchedule {
                stage: Stage::Rollover,
                day,
            });
        };
        carry.rt_offers = snapshot.offers.clone();
        let rt = apply_canary_override(da, &canary_flags(&self.gencos));
        for g in &mut self.gencos {
            match rt.by_index(g.index()) {
                Some(d) => g.add_commitment_for_day(day + 1, d.hours()),
                None => warn!(generator = g.name(), day = day + 1, "no commitment decision"),
            }
        }
        info!(next_day = day + 1, "schedule rolled over");
        carry.rt_schedule = Some(rt);
        self.counters.rollover += 1;
        Ok(())
    }

    fn announce(&mut self, carry: &Carry, day: usize, hour: usize) {
        let loads = [
            (StatusKind::ForecastLoad, &carry.today_forecast),
            (StatusKind::ActualLoad, &carry.today_actual),
        ];
        for (kind, matrix) in loads {
            let Some(m) = matrix else {
                continue;
            };
            if hour >= m.hours() {
                continue;
            }
            let event = StatusEvent {
                day,
                hour,
                kind,
                loads: m.row(hour).to_vec(),
            };
            for o in &mut self.observers {
                o.notify(&event);
            }
        }
    }

    /// Steps through every remaining stamp until the run leaves the running
    /// states.
    pub fn run_to_completion(&mut self) -> SchedulerState {
        while let Some((day, hour)) = self.next_stamp() {
            match self.step(day, hour) {
                SchedulerState::RunningHour { .. } => {}
                state => return state,
            }
        }
        self.state
    }
}

impl<U, D> MarketScheduler<U, D> {
    /// The stamp the next `step` expects, if the run is still going.
    pub fn next_stamp(&self) -> Option<(usize, usize)> {
        if self.state.is_terminal() {
            return None;
        }
        self.clock.peek()
    }

    /// Holds the run before the next step.
    pub fn pause(&mut self) {
        if let SchedulerState::Idle | SchedulerState::RunningHour { .. } = self.state {
            if let Some((day, hour)) = self.clock.peek() {
                self.state = SchedulerState::Paused { day, hour };
            }
        }
    }

    pub fn resume(&mut self) {
        if let SchedulerState::Paused { .. } = self.state {
            self.state = match self.last_stamp {
                Some((day, hour)) => SchedulerState::RunningHour { day, hour },
                None => SchedulerState::Idle,
            };
        }
    }

    /// Ends the run before the next step. A finished run is left as is.
    pub fn stop(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        if let Some((day, hour)) = self.clock.peek() {
            info!(day, hour, "market run stopped");
            self.state = SchedulerState::Stopped { day, hour };
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn counters(&self) -> StageCounters {
        self.counters
    }

    /// The error that failed the run.
    pub fn last_error(&self) -> Option<&MarketError> {
        self.last_error.as_ref()
    }

    pub fn accumulator(&self) -> &ResultAccumulator {
        &self.accumulator
    }

    pub fn gencos(&self) -> &[GenCo] {
        &self.gencos
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn model(&self) -> &MarketModel {
        &self.model
    }

    /// Gives up the run's results, leaving an empty history behind.
    pub fn take_accumulator(&mut self) -> ResultAccumulator {
        std::mem::take(&mut self.accumulator)
    }
}
