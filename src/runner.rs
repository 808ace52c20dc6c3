//! Runs a market case on a worker thread.
//!
//! [`Clearing`] erases the engine generics of [`MarketScheduler`] so the CLI
//! and API deal with one type. [`spawn_run`] drives it hour by hour on a
//! background thread, honouring pause, resume and stop requests made through
//! a shared [`RunControl`] between steps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Case;
use crate::market::accumulator::ResultAccumulator;
use crate::market::grid::GridModel;
use crate::market::kpi::RunSummary;
use crate::market::status::{StatusObserver, TracingObserver};
use crate::market::{MarketError, MarketScheduler, SchedulerState, StageCounters};
use crate::solver::SolverGateway;
use crate::solver::builtin::{AllOnCommitment, CopperPlateDispatch};
use crate::solver::gateway::GatewaySettings;
use crate::solver::process::SolverCommand;

/// Scheduler wrapper that erases the engine generics via enum dispatch.
pub enum Clearing {
    /// Commitment and dispatch by an external solver program.
    External(MarketScheduler<SolverGateway, SolverGateway>),
    /// In-process all-on commitment and copper-plate dispatch.
    Builtin(MarketScheduler<AllOnCommitment, CopperPlateDispatch>),
}

macro_rules! each {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Clearing::External($s) => $body,
            Clearing::Builtin($s) => $body,
        }
    };
}

impl Clearing {
    /// Builds a scheduler for a validated case, with a [`TracingObserver`]
    /// attached.
    pub fn from_case(case: Case) -> Self {
        let Case {
            market,
            model,
            gencos,
            load,
            base,
            solver,
        } = case;

        let mut clearing = if solver.engine == "external" {
            let settings = GatewaySettings {
                work_dir: solver.work_dir.clone(),
                delete_intermediate_files: solver.delete_intermediate_files,
                base,
                hours_per_day: market.hours_per_day,
            };
            let uc = SolverGateway::unit_commitment(
                SolverCommand::new(solver.program.clone(), solver.scuc_args.clone()),
                settings.clone(),
            );
            let ed = SolverGateway::economic_dispatch(
                SolverCommand::new(solver.program.clone(), solver.sced_args.clone()),
                settings,
            );
            Self::External(MarketScheduler::new(
                market,
                model,
                gencos,
                Box::new(load),
                uc,
                ed,
            ))
        } else {
            Self::Builtin(MarketScheduler::new(
                market,
                model,
                gencos,
                Box::new(load),
                AllOnCommitment::new(market.hours_per_day),
                CopperPlateDispatch,
            ))
        };
        clearing.add_observer(Box::new(TracingObserver));
        clearing
    }

    pub fn engine(&self) -> &'static str {
        match self {
            Self::External(_) => "external",
            Self::Builtin(_) => "builtin",
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn StatusObserver + Send>) {
        each!(self, s => s.add_observer(observer))
    }

    pub fn step(&mut self, day: usize, hour: usize) -> SchedulerState {
        each!(self, s => s.step(day, hour))
    }

    pub fn next_stamp(&self) -> Option<(usize, usize)> {
        each!(self, s => s.next_stamp())
    }

    pub fn pause(&mut self) {
        each!(self, s => s.pause())
    }

    pub fn resume(&mut self) {
        each!(self, s => s.resume())
    }

    pub fn stop(&mut self) {
        each!(self, s => s.stop())
    }

    pub fn state(&self) -> SchedulerState {
        each!(self, s => s.state())
    }

    pub fn counters(&self) -> StageCounters {
        each!(self, s => s.counters())
    }

    pub fn last_error(&self) -> Option<&MarketError> {
        each!(self, s => s.last_error())
    }

    pub fn accumulator(&self) -> &ResultAccumulator {
        each!(self, s => s.accumulator())
    }

    pub fn grid(&self) -> &GridModel {
        each!(self, s => &s.model().grid)
    }

    fn take_accumulator(&mut self) -> ResultAccumulator {
        each!(self, s => s.take_accumulator())
    }

    /// Runs every remaining hour, checking `control` before each one.
    pub fn drive(&mut self, control: &RunControl) -> SchedulerState {
        while let Some((day, hour)) = self.next_stamp() {
            if !control.wait_turn(self) {
                self.stop();
                break;
            }
            match self.step(day, hour) {
                SchedulerState::RunningHour { .. } => {}
                state => return state,
            }
        }
        self.state()
    }

    /// Consumes the scheduler into a report.
    pub fn into_report(mut self) -> RunReport {
        let accumulator = self.take_accumulator();
        RunReport {
            engine: self.engine(),
            state: self.state(),
            counters: self.counters(),
            summary: RunSummary::from_results(&accumulator),
            error: self.last_error().map(|e| e.to_string()),
            grid: self.grid().clone(),
            accumulator,
        }
    }
}

/// Outcome of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub engine: &'static str,
    pub state: SchedulerState,
    pub counters: StageCounters,
    pub summary: RunSummary,
    /// Message of the error that failed the run.
    pub error: Option<String>,
    #[serde(skip)]
    pub grid: GridModel,
    #[serde(skip)]
    pub accumulator: ResultAccumulator,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.state == SchedulerState::Completed
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Flags {
    paused: bool,
    stopped: bool,
}

/// Pause, resume and stop requests shared with a running worker.
///
/// Requests take effect between hour steps; an hour in progress always
/// finishes.
#[derive(Debug, Default)]
pub struct RunControl {
    flags: Mutex<Flags>,
    changed: Condvar,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.update(|f| f.paused = true);
    }

    pub fn resume(&self) {
        self.update(|f| f.paused = false);
    }

    pub fn stop(&self) {
        self.update(|f| f.stopped = true);
    }

    pub fn is_paused(&self) -> bool {
        self.flags.lock().map(|f| f.paused).unwrap_or(false)
    }

    fn update(&self, apply: impl FnOnce(&mut Flags)) {
        if let Ok(mut flags) = self.flags.lock() {
            apply(&mut flags);
        }
        self.changed.notify_all();
    }

    /// Blocks while paused. Returns `false` once a stop was requested.
    fn wait_turn(&self, clearing: &mut Clearing) -> bool {
        let Ok(mut flags) = self.flags.lock() else {
            return false;
        };
        if flags.paused && !flags.stopped {
            clearing.pause();
            info!(state = %clearing.state(), "market run paused");
            while flags.paused && !flags.stopped {
                flags = match self.changed.wait(flags) {
                    Ok(f) => f,
                    Err(_) => return false,
                };
            }
            clearing.resume();
        }
        !flags.stopped
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("market worker thread panicked")]
    WorkerPanicked,
}

/// Handle to a run on its worker thread.
pub struct RunHandle {
    worker: JoinHandle<RunReport>,
    control: Arc<RunControl>,
}

impl RunHandle {
    pub fn control(&self) -> &Arc<RunControl> {
        &self.control
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Waits for the worker and returns its report.
    ///
    /// # Errors
    ///
    /// Returns `RunError::WorkerPanicked` if the worker thread panicked.
    pub fn join(self) -> Result<RunReport, RunError> {
        self.worker.join().map_err(|_| RunError::WorkerPanicked)
    }
}

/// Starts `clearing` on a background thread.
pub fn spawn_run(clearing: Clearing, control: Arc<RunControl>) -> RunHandle {
    let worker_control = Arc::clone(&control);
    let worker = thread::spawn(move || {
        let mut clearing = clearing;
        let state = clearing.drive(&worker_control);
        info!(%state, engine = clearing.engine(), "market worker finished");
        clearing.into_report()
    });
    RunHandle { worker, control }
}

/// Polls `handle` every `interval` until the worker finishes.
///
/// Returns `true` when the worker finished and `false` when `cancel` was set
/// first.
pub fn watch(handle: &RunHandle, interval: Duration, cancel: &AtomicBool) -> bool {
    loop {
        if handle.is_finished() {
            return true;
        }
        if cancel.load(Ordering::Relaxed) {
            warn!("stopped watching market run");
            return false;
        }
        thread::sleep(interval);
    }
}

/// Runs `case` to the end on a worker thread and returns the report.
///
/// # Errors
///
/// Returns `RunError::WorkerPanicked` if the worker thread panicked.
pub fn run_case(case: Case) -> Result<RunReport, RunError> {
    spawn_run(Clearing::from_case(case), Arc::new(RunControl::new())).join()
}
