//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use iso_sim::config::{Case, CaseConfig};

/// Commitment output committing both generators in both hours.
pub const SCUC_ALL_ON: &str = "GenCo1\n\t1\n\t1\nGenCo2\n\t1\n\t1\n";

/// Dispatch output for the two-bus case (per-unit on a 100 MVA base).
///
/// Hour 1: 80 MW and 40 MW at 15 $/MWh, 40 MW on the line.
/// Hour 2: 60 MW and 20 MW at 14 $/MWh, 20 MW on the line.
pub const SCED_SOLVED: &str = "\
LMP
1 : 1 : 1500.0
2 : 1 : 1500.0
1 : 2 : 1400.0
2 : 2 : 1400.0
END_LMP
GenCoResults
GenCo1
Hour: 1\tPowerGenerated: 0.8\tProductionCost: 860.0\tStartupCost: 0\tShutdownCost: 0
Hour: 2\tPowerGenerated: 0.6\tProductionCost: 640.0\tStartupCost: 0\tShutdownCost: 0
GenCo2
Hour: 1\tPowerGenerated: 0.4\tProductionCost: 1030.0\tStartupCost: 20\tShutdownCost: 0
Hour: 2\tPowerGenerated: 0.2\tProductionCost: 508.0\tStartupCost: 0\tShutdownCost: 0
END_GenCoResults
VOLTAGE_ANGLES
1 1 : 0.0
2 1 : -0.04
1 2 : 0.0
2 2 : -0.02
END_VOLTAGE_ANGLES
HAS_SOLUTION
1 1
END_HAS_SOLUTION
";

/// Fresh, empty directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("iso-sim-{name}-{}", std::process::id()));
    fs::remove_dir_all(&dir).ok();
    fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("cannot create {}: {e}", dir.display()));
    dir
}

/// Writes a fake solver script that records its call in `calls.log` and
/// writes `output` to the path given as its first argument.
pub fn solver_script(dir: &Path, name: &str, output: &str) -> PathBuf {
    let log = dir.join("calls.log");
    let body = format!(
        "echo \"{name} $2\" >> '{}'\ncat > \"$1\" <<'ISO_SIM_EOF'\n{output}ISO_SIM_EOF\n",
        log.display()
    );
    write_script(dir, name, &body)
}

/// Writes a fake solver script with an arbitrary body.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(format!("{name}.sh"));
    fs::write(&path, body).unwrap_or_else(|e| panic!("cannot write {}: {e}", path.display()));
    path
}

/// Lines of `calls.log`, one per solver call.
pub fn solver_calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Two buses, one line, two generators, one load-serving entity and a
/// two-hour day.
pub fn two_bus_config(days: usize) -> CaseConfig {
    let toml = format!(
        r#"
[simulation]
days = {days}
hours_per_day = 2
seed = 7

[load]
noise_std = 0.0

[[branch]]
from = 1
to = 2
limit_mw = 150.0
reactance = 0.1

[[generator]]
name = "GenCo1"
bus = 1
a = 10.0
b = 0.01
cap_max_mw = 200.0
initial_power_mw = 100.0
initial_status_hours = 4

[[generator]]
name = "GenCo2"
bus = 2
a = 25.0
b = 0.02
cap_min_mw = 10.0
cap_max_mw = 120.0
canary = true
initial_status_hours = -2

[[lse]]
name = "LSE1"
bus = 2
profile = [120.0, 80.0]
"#
    );
    CaseConfig::from_toml_str(&toml).unwrap_or_else(|e| panic!("{e}"))
}

/// The two-bus configuration wired to `sh` scripts as its external solvers,
/// with solver files in `dir/work`.
pub fn external_config(dir: &Path, days: usize, scuc: &Path, sced: &Path) -> CaseConfig {
    let mut cfg = two_bus_config(days);
    cfg.solver.engine = "external".into();
    cfg.solver.program = "sh".into();
    cfg.solver.scuc_args = vec![scuc.display().to_string(), "{output}".into(), "{day}".into()];
    cfg.solver.sced_args = vec![sced.display().to_string(), "{output}".into(), "{day}".into()];
    cfg.solver.work_dir = dir.join("work");
    cfg
}

/// [`external_config`] built into a case that keeps its solver files after
/// a successful solve.
pub fn external_case(dir: &Path, days: usize, scuc: &Path, sced: &Path) -> Case {
    let mut cfg = external_config(dir, days, scuc, sced);
    cfg.solver.delete_intermediate_files = false;
    cfg.build().unwrap_or_else(|e| panic!("{e:?}"))
}

/// The two-bus case on the built-in engines.
pub fn builtin_case(days: usize) -> Case {
    two_bus_config(days)
        .build()
        .unwrap_or_else(|e| panic!("{e:?}"))
}
