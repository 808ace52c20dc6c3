//! Solver gateway errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// What went wrong on a line of a solver output file.
#[derive(Debug, Error, PartialEq)]
pub enum ParseErrorKind {
    #[error("unexpected line outside any section: {0:?}")]
    UnexpectedLine(String),
    #[error("malformed record in {section}: {line:?}")]
    Malformed { section: &'static str, line: String },
    #[error("unknown key {key:?} in {section}")]
    UnknownKey { section: &'static str, key: String },
    #[error("unknown generator {0:?}")]
    UnknownGenerator(String),
    #[error("bus {bus} out of range 1..={max}")]
    BusOutOfRange { bus: usize, max: usize },
    #[error("hour {hour} out of range 1..={max}")]
    HourOutOfRange { hour: usize, max: usize },
    #[error("value {0:?} is not a number")]
    NotANumber(String),
    #[error("expected 0 or 1, found {0:?}")]
    NotAFlag(String),
    #[error("expected {expected} values, found {found}")]
    WrongCount { expected: usize, found: usize },
    #[error("no block for generator {0}")]
    MissingGenerator(String),
    #[error("record for generator {0} has no hour")]
    MissingHour(String),
    #[error("section {0} is not closed")]
    UnclosedSection(&'static str),
    #[error("section {0} appears more than once")]
    DuplicateSection(&'static str),
    #[error("required section {0} is missing")]
    MissingSection(&'static str),
}

/// A protocol error with its location.
#[derive(Debug, Error, PartialEq)]
#[error("{}:{line}: {kind}", .path.display())]
pub struct ParseError {
    pub path: PathBuf,
    /// 1-based line number; 0 when the error concerns the whole file.
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// Everything that can fail while driving an external solver.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("cannot write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error(
        "cannot start solver {program} (model {}, output {}): {source}",
        .model.display(),
        .output.display()
    )]
    Spawn {
        program: String,
        model: PathBuf,
        output: PathBuf,
        source: io::Error,
    },
    #[error(
        "solver {program} exited with {} (model {}, output {})",
        exit_label(.code),
        .model.display(),
        .output.display()
    )]
    NonZeroExit {
        program: String,
        model: PathBuf,
        output: PathBuf,
        code: Option<i32>,
    },
    #[error("solver produced no output file {}", .path.display())]
    MissingOutput { path: PathBuf },
    #[error(transparent)]
    Parse(#[from] ParseError),
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}"))
}
