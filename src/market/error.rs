//! Market operation errors.

use std::fmt;

use thiserror::Error;

use crate::solver::SolverError;

/// The stage of the daily cycle an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    UnitCommitment,
    RealTime,
    Rollover,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::UnitCommitment => "unit commitment",
            Stage::RealTime => "real-time",
            Stage::Rollover => "rollover",
        };
        f.write_str(s)
    }
}

/// Failures that stop a market run.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("{stage} solve failed on day {day} hour {hour}: {source}")]
    Solver {
        stage: Stage,
        day: usize,
        hour: usize,
        #[source]
        source: SolverError,
    },
    #[error("step ({day}, {hour}) out of order, expected {}", expected_label(.expected))]
    Sequencing {
        day: usize,
        hour: usize,
        expected: Option<(usize, usize)>,
    },
    #[error("no {kind} load for day {day}")]
    MissingLoad { day: usize, kind: &'static str },
    #[error("{stage} on day {day} has no schedule to work from")]
    MissingSchedule { stage: Stage, day: usize },
}

fn expected_label(expected: &Option<(usize, usize)>) -> String {
    expected.map_or_else(
        || "no further steps".to_string(),
        |(d, h)| format!("({d}, {h})"),
    )
}
