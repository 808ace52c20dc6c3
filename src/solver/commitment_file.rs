//! Commitment-vector files: one block per generator, one 0/1 line per hour.
//!
//! ```text
//! GenCo1
//! 	1
//! 	1
//! GenCo2
//! 	0
//! 	1
//! ```
//!
//! The unit-commitment solver writes the same layout back, possibly with a
//! leading interval number on each line (`1 1`) and with more intervals than
//! one day when it optimizes over a look-ahead horizon.

use std::io::{self, Write};
use std::path::Path;

use crate::market::commitment::{CommitmentDecision, ScheduleSet};

use super::error::{ParseError, ParseErrorKind};

/// Writes `schedule` in commitment-file layout.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_commitments(schedule: &ScheduleSet, mut w: impl Write) -> io::Result<()> {
    for d in schedule.decisions() {
        writeln!(w, "{}", d.generator())?;
        for v in d.hours() {
            writeln!(w, "\t{v}")?;
        }
    }
    w.flush()
}

/// Parses a commitment file into a schedule for `hours_per_day` hours.
///
/// `generators` maps names to indices. Intervals past `hours_per_day` in a
/// block are skipped.
///
/// # Errors
///
/// Returns a `ParseError` for an unknown generator, a value that is not 0/1,
/// a value before any generator line, a block with too few intervals or a
/// generator of `generators` without a block.
pub fn parse_commitments(
    text: &str,
    path: &Path,
    generators: &[(&str, usize)],
    hours_per_day: usize,
) -> Result<ScheduleSet, ParseError> {
    let err = |line: usize, kind| ParseError {
        path: path.to_path_buf(),
        line,
        kind,
    };

    // (name, index, values, header line)
    let mut blocks: Vec<(String, usize, Vec<u8>, usize)> = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let lineno = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(&(name, index)) = generators.iter().find(|(n, _)| *n == line) {
            blocks.push((name.to_string(), index, Vec::new(), lineno));
            continue;
        }
        let token = line.split_whitespace().last().unwrap_or(line);
        let value = match token {
            "0" => 0,
            "1" => 1,
            _ if token.parse::<f64>().is_ok() => {
                return Err(err(lineno, ParseErrorKind::NotAFlag(token.to_string())));
            }
            _ => {
                return Err(err(lineno, ParseErrorKind::UnknownGenerator(line.to_string())));
            }
        };
        let Some(block) = blocks.last_mut() else {
            return Err(err(lineno, ParseErrorKind::UnexpectedLine(line.to_string())));
        };
        if block.2.len() < hours_per_day {
            block.2.push(value);
        }
    }

    let mut decisions = Vec::with_capacity(blocks.len());
    for (name, index, values, lineno) in blocks {
        if values.len() != hours_per_day {
            return Err(err(
                lineno,
                ParseErrorKind::WrongCount {
                    expected: hours_per_day,
                    found: values.len(),
                },
            ));
        }
        let decision = CommitmentDecision::new(name, index, values)
            .map_err(|e| err(lineno, ParseErrorKind::Malformed {
                section: "commitment",
                line: e.to_string(),
            }))?;
        decisions.push(decision);
    }

    if let Some((name, _)) = generators
        .iter()
        .find(|(name, _)| !decisions.iter().any(|d| d.generator() == *name))
    {
        return Err(err(0, ParseErrorKind::MissingGenerator((*name).to_string())));
    }

    ScheduleSet::new(hours_per_day, decisions).map_err(|e| {
        err(
            0,
            ParseErrorKind::Malformed {
                section: "commitment",
                line: e.to_string(),
            },
        )
    })
}
