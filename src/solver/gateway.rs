//! File-based gateway to an external optimization program.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::market::commitment::ScheduleSet;
use crate::units::BasePower;

use super::commitment_file::{parse_commitments, write_commitments};
use super::error::SolverError;
use super::model_file::{ModelSnapshot, write_model};
use super::process::{SolverCommand, SolverFiles};
use super::result_file::{ResultShape, parse_dispatch_results};
use super::{DispatchSolution, EconomicDispatch, UnitCommitment};

/// Settings shared by both gateway instances of a run.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Directory for model, commitment and result files.
    pub work_dir: PathBuf,
    /// Remove the files of a successful solve.
    pub delete_intermediate_files: bool,
    pub base: BasePower,
    pub hours_per_day: usize,
}

/// Writes solver inputs, runs the solver and parses what it writes back.
///
/// One instance drives the unit-commitment program, another the dispatch
/// program; they differ only in command and file prefix. Files of a failed
/// solve stay on disk.
#[derive(Debug, Clone)]
pub struct SolverGateway {
    prefix: &'static str,
    command: SolverCommand,
    settings: GatewaySettings,
}

impl SolverGateway {
    /// Gateway for the unit-commitment solver.
    pub fn unit_commitment(command: SolverCommand, settings: GatewaySettings) -> Self {
        Self {
            prefix: "scuc",
            command,
            settings,
        }
    }

    /// Gateway for the economic-dispatch solver.
    pub fn economic_dispatch(command: SolverCommand, settings: GatewaySettings) -> Self {
        Self {
            prefix: "sced",
            command,
            settings,
        }
    }

    pub fn command(&self) -> &SolverCommand {
        &self.command
    }

    /// Paths used for `day`.
    pub fn files(&self, day: usize, with_commitment: bool) -> SolverFiles {
        let dir = &self.settings.work_dir;
        let name = |suffix: &str| dir.join(format!("{}_day{day}_{suffix}.dat", self.prefix));
        SolverFiles {
            model: name("model"),
            commitment: with_commitment.then(|| name("uc")),
            output: name("out"),
            day,
        }
    }

    fn prepare(&self, files: &SolverFiles) -> Result<(), SolverError> {
        fs::create_dir_all(&self.settings.work_dir).map_err(|source| SolverError::Write {
            path: self.settings.work_dir.clone(),
            source,
        })?;
        // stale output from an earlier run must not be mistaken for this one
        match fs::remove_file(&files.output) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(SolverError::Write {
                path: files.output.clone(),
                source: e,
            }),
            _ => Ok(()),
        }
    }

    fn read_output(&self, files: &SolverFiles) -> Result<String, SolverError> {
        fs::read_to_string(&files.output).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                SolverError::MissingOutput {
                    path: files.output.clone(),
                }
            } else {
                SolverError::Read {
                    path: files.output.clone(),
                    source,
                }
            }
        })
    }

    fn cleanup(&self, files: &SolverFiles) {
        if !self.settings.delete_intermediate_files {
            return;
        }
        for path in files.intermediates() {
            if let Err(e) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "cannot remove solver file");
            }
        }
    }
}

fn write_file(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> Result<(), SolverError> {
    let wrap = |source| SolverError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(wrap)?;
    let mut w = BufWriter::new(file);
    write(&mut w).map_err(wrap)
}

impl UnitCommitment for SolverGateway {
    #[instrument(skip_all, fields(day = model.day, solver = "scuc"))]
    fn solve_commitment(&mut self, model: &ModelSnapshot) -> Result<ScheduleSet, SolverError> {
        let files = self.files(model.day, false);
        self.prepare(&files)?;
        write_file(&files.model, |w| write_model(model, self.settings.base, w))?;

        self.command.run(&files)?;

        let text = self.read_output(&files)?;
        let schedule = parse_commitments(
            &text,
            &files.output,
            &model.generator_keys(),
            self.settings.hours_per_day,
        )?;
        debug!(generators = schedule.len(), "commitment schedule parsed");
        self.cleanup(&files);
        Ok(schedule)
    }
}

impl EconomicDispatch for SolverGateway {
    #[instrument(skip_all, fields(day = model.day, solver = "sced"))]
    fn solve_dispatch(
        &mut self,
        model: &ModelSnapshot,
        schedule: &ScheduleSet,
    ) -> Result<DispatchSolution, SolverError> {
        let files = self.files(model.day, true);
        self.prepare(&files)?;
        write_file(&files.model, |w| write_model(model, self.settings.base, w))?;
        if let Some(path) = &files.commitment {
            write_file(path, |w| write_commitments(schedule, w))?;
        }

        self.command.run(&files)?;

        let text = self.read_output(&files)?;
        let keys = model.generator_keys();
        let raw = parse_dispatch_results(
            &text,
            &files.output,
            ResultShape {
                hours: model.horizon_hours,
                buses: model.grid.buses,
                generators: &keys,
            },
        )?;
        let solution = DispatchSolution::from_raw(raw, &model.grid, self.settings.base);
        debug!(
            solved_hours = solution.has_solution.iter().filter(|s| **s).count(),
            "dispatch parsed"
        );
        self.cleanup(&files);
        Ok(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> SolverGateway {
        SolverGateway::economic_dispatch(
            SolverCommand::new("psst", Vec::new()),
            GatewaySettings {
                work_dir: PathBuf::from("work"),
                delete_intermediate_files: true,
                base: BasePower::default(),
                hours_per_day: 24,
            },
        )
    }

    #[test]
    fn file_names_carry_prefix_and_day() {
        let f = gateway().files(3, true);
        assert_eq!(f.model, PathBuf::from("work/sced_day3_model.dat"));
        assert_eq!(f.commitment, Some(PathBuf::from("work/sced_day3_uc.dat")));
        assert_eq!(f.output, PathBuf::from("work/sced_day3_out.dat"));
    }

    #[test]
    fn commitment_solve_has_no_commitment_file() {
        let g = SolverGateway::unit_commitment(
            SolverCommand::new("psst", Vec::new()),
            gateway().settings,
        );
        let f = g.files(1, false);
        assert_eq!(f.commitment, None);
        assert_eq!(f.model, PathBuf::from("work/scuc_day1_model.dat"));
    }
}
