//! Running the external solver as a child process.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use tracing::{debug, info};

use super::error::SolverError;

/// Files involved in one solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverFiles {
    pub model: PathBuf,
    pub commitment: Option<PathBuf>,
    pub output: PathBuf,
    pub day: usize,
}

impl SolverFiles {
    /// Every path that exists only for this solve.
    pub fn intermediates(&self) -> impl Iterator<Item = &Path> {
        [Some(&self.model), self.commitment.as_ref(), Some(&self.output)]
            .into_iter()
            .flatten()
            .map(PathBuf::as_path)
    }
}

/// Program plus argument template.
///
/// Arguments may contain `{model}`, `{commitment}`, `{output}` and `{day}`,
/// which are replaced for each solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Directory the solver runs in; the caller's directory when `None`.
    pub working_dir: Option<PathBuf>,
}

impl SolverCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    /// Arguments with placeholders filled in from `files`.
    pub fn render(&self, files: &SolverFiles) -> Vec<String> {
        let commitment = files
            .commitment
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        self.args
            .iter()
            .map(|a| {
                a.replace("{model}", &files.model.display().to_string())
                    .replace("{commitment}", &commitment)
                    .replace("{output}", &files.output.display().to_string())
                    .replace("{day}", &files.day.to_string())
            })
            .collect()
    }

    /// Runs the solver to completion.
    ///
    /// Stdout and stderr are drained while the child runs, stderr on a
    /// helper thread, and logged line by line at debug level. There is no
    /// timeout and no retry.
    ///
    /// # Errors
    ///
    /// Returns `SolverError::Spawn` if the program cannot be started and
    /// `SolverError::NonZeroExit` if it exits unsuccessfully.
    pub fn run(&self, files: &SolverFiles) -> Result<(), SolverError> {
        let args = self.render(files);
        info!(program = %self.program, ?args, day = files.day, "starting solver");

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        let spawn_err = |source| SolverError::Spawn {
            program: self.program.clone(),
            model: files.model.clone(),
            output: files.output.clone(),
            source,
        };
        let mut child = cmd.spawn().map_err(spawn_err)?;

        let stderr = child.stderr.take();
        let stderr_drain = thread::spawn(move || {
            if let Some(stderr) = stderr {
                drain("stderr", stderr);
            }
        });
        if let Some(stdout) = child.stdout.take() {
            drain("stdout", stdout);
        }
        let status = child.wait().map_err(spawn_err)?;
        // the drain thread only logs; a panic there must not mask the exit status
        let _ = stderr_drain.join();

        if status.success() {
            info!(program = %self.program, day = files.day, "solver finished");
            Ok(())
        } else {
            Err(SolverError::NonZeroExit {
                program: self.program.clone(),
                model: files.model.clone(),
                output: files.output.clone(),
                code: status.code(),
            })
        }
    }
}

fn drain(stream: &'static str, source: impl Read) {
    for line in BufReader::new(source).lines().map_while(Result::ok) {
        debug!(target: "iso_sim::solver", stream, "{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files() -> SolverFiles {
        SolverFiles {
            model: PathBuf::from("work/sced_day2_model.dat"),
            commitment: Some(PathBuf::from("work/sced_day2_uc.dat")),
            output: PathBuf::from("work/sced_day2_out.dat"),
            day: 2,
        }
    }

    #[test]
    fn renders_dispatch_call() {
        let cmd = SolverCommand::new(
            "psst",
            ["sced", "--uc", "{commitment}", "--data", "{model}", "--output", "{output}"]
                .map(String::from)
                .to_vec(),
        );
        assert_eq!(
            cmd.render(&files()),
            vec![
                "sced",
                "--uc",
                "work/sced_day2_uc.dat",
                "--data",
                "work/sced_day2_model.dat",
                "--output",
                "work/sced_day2_out.dat",
            ]
        );
    }

    #[test]
    fn renders_day_and_missing_commitment() {
        let cmd = SolverCommand::new("solve", vec!["--day={day}".into(), "{commitment}".into()]);
        let mut f = files();
        f.commitment = None;
        assert_eq!(cmd.render(&f), vec!["--day=2", ""]);
    }

    #[test]
    fn intermediates_skip_missing_commitment() {
        let mut f = files();
        assert_eq!(f.intermediates().count(), 3);
        f.commitment = None;
        assert_eq!(f.intermediates().count(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn zero_exit_succeeds_and_nonzero_fails() {
        let ok = SolverCommand::new("sh", vec!["-c".into(), "echo out; echo err >&2".into()]);
        assert!(ok.run(&files()).is_ok());

        let bad = SolverCommand::new("sh", vec!["-c".into(), "exit 3".into()]);
        let Err(SolverError::NonZeroExit { code, output, .. }) = bad.run(&files()) else {
            panic!("expected a non-zero exit");
        };
        assert_eq!(code, Some(3));
        assert_eq!(output, PathBuf::from("work/sced_day2_out.dat"));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let cmd = SolverCommand::new("iso-sim-no-such-solver", Vec::new());
        assert!(matches!(cmd.run(&files()), Err(SolverError::Spawn { .. })));
    }
}
