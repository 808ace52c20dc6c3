//! Unit commitment schedules: per-generator hourly on/off decisions.

use serde::Serialize;
use thiserror::Error;

/// Structural problems in a commitment schedule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("generator {generator}: expected {expected} hourly decisions, found {found}")]
    LengthMismatch {
        generator: String,
        expected: usize,
        found: usize,
    },
    #[error("generator {generator}: hour {hour} has value {value}, expected 0 or 1")]
    InvalidValue {
        generator: String,
        hour: usize,
        value: u8,
    },
    #[error("generator {generator} appears more than once")]
    DuplicateGenerator { generator: String },
    #[error("generator index {index} appears more than once")]
    DuplicateIndex { index: usize },
}

/// Hourly on/off decisions for one generator over one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitmentDecision {
    generator: String,
    index: usize,
    hours: Vec<u8>,
}

impl CommitmentDecision {
    /// Creates a decision, checking that every value is 0 or 1.
    pub fn new(
        generator: impl Into<String>,
        index: usize,
        hours: Vec<u8>,
    ) -> Result<Self, ScheduleError> {
        let generator = generator.into();
        if let Some((hour, &value)) = hours.iter().enumerate().find(|(_, v)| **v > 1) {
            return Err(ScheduleError::InvalidValue {
                generator,
                hour,
                value,
            });
        }
        Ok(Self {
            generator,
            index,
            hours,
        })
    }

    /// A decision committing the generator in every hour.
    pub fn all_on(generator: impl Into<String>, index: usize, hours_per_day: usize) -> Self {
        Self {
            generator: generator.into(),
            index,
            hours: vec![1; hours_per_day],
        }
    }

    pub fn generator(&self) -> &str {
        &self.generator
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn hours(&self) -> &[u8] {
        &self.hours
    }

    pub fn is_on(&self, hour: usize) -> bool {
        self.hours.get(hour).is_some_and(|v| *v == 1)
    }

    /// Number of committed hours.
    pub fn on_hours(&self) -> usize {
        self.hours.iter().filter(|v| **v == 1).count()
    }

    fn force_on(&mut self) {
        self.hours.iter_mut().for_each(|v| *v = 1);
    }
}

/// One day's commitment decisions for every generator, ordered by generator index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSet {
    hours_per_day: usize,
    decisions: Vec<CommitmentDecision>,
}

impl ScheduleSet {
    /// Builds a schedule set, enforcing one decision per generator and
    /// exactly `hours_per_day` values per decision.
    pub fn new(
        hours_per_day: usize,
        mut decisions: Vec<CommitmentDecision>,
    ) -> Result<Self, ScheduleError> {
        for d in &decisions {
            if d.hours.len() != hours_per_day {
                return Err(ScheduleError::LengthMismatch {
                    generator: d.generator.clone(),
                    expected: hours_per_day,
                    found: d.hours.len(),
                });
            }
        }
        decisions.sort_by_key(|d| d.index);
        for pair in decisions.windows(2) {
            if pair[0].index == pair[1].index {
                return Err(ScheduleError::DuplicateIndex {
                    index: pair[0].index,
                });
            }
        }
        for (i, d) in decisions.iter().enumerate() {
            if decisions[..i].iter().any(|o| o.generator == d.generator) {
                return Err(ScheduleError::DuplicateGenerator {
                    generator: d.generator.clone(),
                });
            }
        }
        Ok(Self {
            hours_per_day,
            decisions,
        })
    }

    /// Every generator committed in every hour.
    pub fn all_on<'a>(
        hours_per_day: usize,
        generators: impl IntoIterator<Item = (&'a str, usize)>,
    ) -> Result<Self, ScheduleError> {
        let decisions = generators
            .into_iter()
            .map(|(name, index)| CommitmentDecision::all_on(name, index, hours_per_day))
            .collect();
        Self::new(hours_per_day, decisions)
    }

    pub fn hours_per_day(&self) -> usize {
        self.hours_per_day
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// Decisions in generator-index order.
    pub fn decisions(&self) -> &[CommitmentDecision] {
        &self.decisions
    }

    /// Looks up a decision by generator name.
    pub fn get(&self, generator: &str) -> Option<&CommitmentDecision> {
        self.decisions.iter().find(|d| d.generator == generator)
    }

    /// Looks up a decision by generator index.
    pub fn by_index(&self, index: usize) -> Option<&CommitmentDecision> {
        self.decisions
            .binary_search_by_key(&index, |d| d.index)
            .ok()
            .map(|i| &self.decisions[i])
    }

    /// Whether `index` is committed in `hour`. Unknown generators are off.
    pub fn is_on(&self, index: usize, hour: usize) -> bool {
        self.by_index(index).is_some_and(|d| d.is_on(hour))
    }
}

/// Returns a deep copy of `schedule` with every canary generator committed in
/// every hour.
///
/// `canary` is indexed by generator index; generators past its end are not
/// canaries. Applying the override twice gives the same result as applying it
/// once.
pub fn apply_canary_override(schedule: &ScheduleSet, canary: &[bool]) -> ScheduleSet {
    let mut out = schedule.clone();
    for d in &mut out.decisions {
        if canary.get(d.index).copied().unwrap_or(false) {
            d.force_on();
        }
    }
    out
}
