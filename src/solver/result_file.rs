//! Parser for the dispatch solver's section-delimited result file.
//!
//! ```text
//! LMP
//! 1 : 1 : 1200.0            bus : hour : price
//! END_LMP
//! GenCoResults
//! GenCo1
//! Hour: 1	PowerGenerated: 0.8	ProductionCost: 9.5	StartupCost: 0	ShutdownCost: 0
//! END_GenCoResults
//! VOLTAGE_ANGLES
//! Bus2 1 : -0.08            bus hour : radians
//! END_VOLTAGE_ANGLES
//! DAILY_BRANCH_LMP
//! END_DAILY_BRANCH_LMP
//! DAILY_PRICE_SENSITIVE_DEMAND
//! END_DAILY_PRICE_SENSITIVE_DEMAND
//! HAS_SOLUTION
//! 1	1
//! END_HAS_SOLUTION
//! ```
//!
//! Buses and hours are 1-based in the file. Values are per-unit. Any line the
//! grammar does not cover is an error carrying its line number.

use std::path::Path;

use crate::market::matrix::HourlyMatrix;

use super::error::{ParseError, ParseErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Lmp,
    GenCoResults,
    VoltageAngles,
    DailyBranchLmp,
    DailyPriceSensitiveDemand,
    HasSolution,
}

impl Section {
    const ALL: [Section; 6] = [
        Section::Lmp,
        Section::GenCoResults,
        Section::VoltageAngles,
        Section::DailyBranchLmp,
        Section::DailyPriceSensitiveDemand,
        Section::HasSolution,
    ];

    const REQUIRED: [Section; 4] = [
        Section::Lmp,
        Section::GenCoResults,
        Section::VoltageAngles,
        Section::HasSolution,
    ];

    fn name(self) -> &'static str {
        match self {
            Section::Lmp => "LMP",
            Section::GenCoResults => "GenCoResults",
            Section::VoltageAngles => "VOLTAGE_ANGLES",
            Section::DailyBranchLmp => "DAILY_BRANCH_LMP",
            Section::DailyPriceSensitiveDemand => "DAILY_PRICE_SENSITIVE_DEMAND",
            Section::HasSolution => "HAS_SOLUTION",
        }
    }

    fn opening(line: &str) -> Option<Section> {
        Self::ALL.into_iter().find(|s| s.name() == line)
    }

    fn closes(self, line: &str) -> bool {
        line.strip_prefix("END_") == Some(self.name())
    }
}

/// Dispatch results exactly as the solver reported them, in per-unit.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDispatch {
    /// Hour by bus.
    pub lmp: HourlyMatrix,
    /// Hour by bus, radians.
    pub voltage_angles: HourlyMatrix,
    /// Hour by generator.
    pub dispatch: HourlyMatrix,
    pub production_cost: HourlyMatrix,
    pub startup_cost: HourlyMatrix,
    pub shutdown_cost: HourlyMatrix,
    pub has_solution: Vec<bool>,
}

/// Dimensions the result file is checked against.
#[derive(Debug, Clone, Copy)]
pub struct ResultShape<'a> {
    pub hours: usize,
    pub buses: usize,
    pub generators: &'a [(&'a str, usize)],
}

/// Parses a dispatch result file.
///
/// # Errors
///
/// Returns a `ParseError` with the 1-based line number of the first problem,
/// or line 0 when a required section is missing.
pub fn parse_dispatch_results(
    text: &str,
    path: &Path,
    shape: ResultShape<'_>,
) -> Result<RawDispatch, ParseError> {
    let mut parser = Parser::new(path, shape);
    for (i, raw) in text.lines().enumerate() {
        parser.line(i + 1, raw.trim())?;
    }
    parser.finish()
}

struct Parser<'a> {
    path: &'a Path,
    shape: ResultShape<'a>,
    out: RawDispatch,
    open: Option<(Section, usize)>,
    seen: Vec<Section>,
    generator: Option<usize>,
    hour: Option<usize>,
    flags: Vec<bool>,
}

impl<'a> Parser<'a> {
    fn new(path: &'a Path, shape: ResultShape<'a>) -> Self {
        let gens = shape.generators.len();
        let gen_matrix = || HourlyMatrix::zeros(shape.hours, gens);
        Self {
            path,
            shape,
            out: RawDispatch {
                lmp: HourlyMatrix::zeros(shape.hours, shape.buses),
                voltage_angles: HourlyMatrix::zeros(shape.hours, shape.buses),
                dispatch: gen_matrix(),
                production_cost: gen_matrix(),
                startup_cost: gen_matrix(),
                shutdown_cost: gen_matrix(),
                has_solution: Vec::new(),
            },
            open: None,
            seen: Vec::new(),
            generator: None,
            hour: None,
            flags: Vec::new(),
        }
    }

    fn err(&self, line: usize, kind: ParseErrorKind) -> ParseError {
        ParseError {
            path: self.path.to_path_buf(),
            line,
            kind,
        }
    }

    fn line(&mut self, n: usize, line: &str) -> Result<(), ParseError> {
        let Some((section, _)) = self.open else {
            if line.is_empty() || line.starts_with('#') {
                return Ok(());
            }
            let Some(section) = Section::opening(line) else {
                return Err(self.err(n, ParseErrorKind::UnexpectedLine(line.to_string())));
            };
            if self.seen.contains(&section) {
                return Err(self.err(n, ParseErrorKind::DuplicateSection(section.name())));
            }
            self.seen.push(section);
            self.open = Some((section, n));
            self.generator = None;
            self.hour = None;
            return Ok(());
        };

        if section.closes(line) {
            if section == Section::HasSolution {
                self.close_has_solution(n)?;
            }
            self.open = None;
            return Ok(());
        }
        if line.is_empty() {
            return Ok(());
        }

        match section {
            Section::Lmp => self.lmp(n, line),
            Section::GenCoResults => self.genco(n, line),
            Section::VoltageAngles => self.angle(n, line),
            Section::HasSolution => self.has_solution(n, line),
            Section::DailyBranchLmp | Section::DailyPriceSensitiveDemand => Ok(()),
        }
    }

    fn finish(self) -> Result<RawDispatch, ParseError> {
        if let Some((section, opened_at)) = self.open {
            return Err(self.err(opened_at, ParseErrorKind::UnclosedSection(section.name())));
        }
        if let Some(missing) = Section::REQUIRED.into_iter().find(|s| !self.seen.contains(s)) {
            return Err(self.err(0, ParseErrorKind::MissingSection(missing.name())));
        }
        Ok(self.out)
    }

    fn number(&self, n: usize, token: &str) -> Result<f64, ParseError> {
        token
            .trim()
            .parse::<f64>()
            .map_err(|_| self.err(n, ParseErrorKind::NotANumber(token.trim().to_string())))
    }

    fn bus(&self, n: usize, token: &str) -> Result<usize, ParseError> {
        let token = token.trim();
        let digits = token.strip_prefix("Bus").unwrap_or(token);
        let bus = digits
            .parse::<usize>()
            .map_err(|_| self.err(n, ParseErrorKind::NotANumber(token.to_string())))?;
        if bus == 0 || bus > self.shape.buses {
            return Err(self.err(
                n,
                ParseErrorKind::BusOutOfRange {
                    bus,
                    max: self.shape.buses,
                },
            ));
        }
        Ok(bus - 1)
    }

    fn hour(&self, n: usize, token: &str) -> Result<usize, ParseError> {
        let token = token.trim();
        let hour = token
            .parse::<usize>()
            .map_err(|_| self.err(n, ParseErrorKind::NotANumber(token.to_string())))?;
        if hour == 0 || hour > self.shape.hours {
            return Err(self.err(
                n,
                ParseErrorKind::HourOutOfRange {
                    hour,
                    max: self.shape.hours,
                },
            ));
        }
        Ok(hour - 1)
    }

    fn malformed(&self, n: usize, section: Section, line: &str) -> ParseError {
        self.err(
            n,
            ParseErrorKind::Malformed {
                section: section.name(),
                line: line.to_string(),
            },
        )
    }

    fn lmp(&mut self, n: usize, line: &str) -> Result<(), ParseError> {
        let parts: Vec<&str> = line.split(':').collect();
        let [bus, hour, price] = parts[..] else {
            return Err(self.malformed(n, Section::Lmp, line));
        };
        let (bus, hour, price) = (self.bus(n, bus)?, self.hour(n, hour)?, self.number(n, price)?);
        self.out.lmp.set(hour, bus, price);
        Ok(())
    }

    fn angle(&mut self, n: usize, line: &str) -> Result<(), ParseError> {
        let Some((left, angle)) = line.split_once(':') else {
            return Err(self.malformed(n, Section::VoltageAngles, line));
        };
        let keys: Vec<&str> = left.split_whitespace().collect();
        let [bus, hour] = keys[..] else {
            return Err(self.malformed(n, Section::VoltageAngles, line));
        };
        let (bus, hour, angle) = (self.bus(n, bus)?, self.hour(n, hour)?, self.number(n, angle)?);
        self.out.voltage_angles.set(hour, bus, angle);
        Ok(())
    }

    /// A line holds an optional generator label followed by `Key: value`
    /// pairs. `Hour` starts a new record for the current generator.
    fn genco(&mut self, n: usize, line: &str) -> Result<(), ParseError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let mut i = 0;
        if let Some(first) = tokens.first().filter(|t| !t.contains(':')) {
            let Some(&(_, index)) = self.shape.generators.iter().find(|(name, _)| name == first)
            else {
                return Err(self.err(n, ParseErrorKind::UnknownGenerator(first.to_string())));
            };
            self.generator = Some(index);
            self.hour = None;
            i = 1;
        }

        while i < tokens.len() {
            let Some((key, inline)) = tokens[i].split_once(':') else {
                return Err(self.malformed(n, Section::GenCoResults, line));
            };
            let value = if inline.is_empty() {
                i += 1;
                *tokens
                    .get(i)
                    .ok_or_else(|| self.malformed(n, Section::GenCoResults, line))?
            } else {
                inline
            };
            i += 1;
            self.genco_pair(n, line, key, value)?;
        }
        Ok(())
    }

    fn genco_pair(&mut self, n: usize, line: &str, key: &str, value: &str) -> Result<(), ParseError> {
        let Some(generator) = self.generator else {
            return Err(self.malformed(n, Section::GenCoResults, line));
        };
        if key == "Hour" {
            self.hour = Some(self.hour(n, value)?);
            return Ok(());
        }
        let target = match key {
            "PowerGenerated" => &mut self.out.dispatch,
            "ProductionCost" => &mut self.out.production_cost,
            "StartupCost" => &mut self.out.startup_cost,
            "ShutdownCost" => &mut self.out.shutdown_cost,
            _ => {
                return Err(self.err(
                    n,
                    ParseErrorKind::UnknownKey {
                        section: Section::GenCoResults.name(),
                        key: key.to_string(),
                    },
                ));
            }
        };
        let Some(hour) = self.hour else {
            let name = self
                .shape
                .generators
                .iter()
                .find(|(_, i)| *i == generator)
                .map_or_else(|| generator.to_string(), |(name, _)| name.to_string());
            return Err(ParseError {
                path: self.path.to_path_buf(),
                line: n,
                kind: ParseErrorKind::MissingHour(name),
            });
        };
        let v = value
            .trim()
            .parse::<f64>()
            .map_err(|_| ParseError {
                path: self.path.to_path_buf(),
                line: n,
                kind: ParseErrorKind::NotANumber(value.to_string()),
            })?;
        target.set(hour, generator, v);
        Ok(())
    }

    fn has_solution(&mut self, n: usize, line: &str) -> Result<(), ParseError> {
        for token in line.split_whitespace() {
            match token {
                "1" => self.flags.push(true),
                "0" => self.flags.push(false),
                _ => return Err(self.err(n, ParseErrorKind::NotAFlag(token.to_string()))),
            }
        }
        Ok(())
    }

    fn close_has_solution(&mut self, n: usize) -> Result<(), ParseError> {
        if self.flags.len() != self.shape.hours {
            return Err(self.err(
                n,
                ParseErrorKind::WrongCount {
                    expected: self.shape.hours,
                    found: self.flags.len(),
                },
            ));
        }
        self.out.has_solution = std::mem::take(&mut self.flags);
        Ok(())
    }
}
