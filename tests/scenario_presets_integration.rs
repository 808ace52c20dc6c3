use std::fs;
use std::process::{Command, Output};

#[test]
fn scenario_files_run_via_cli_and_produce_distinct_prices() {
    let two_bus = run_and_parse_summary(&["--case", "scenarios/two_bus.toml"]);
    let five_bus = run_and_parse_summary(&["--case", "scenarios/five_bus.toml"]);

    assert_eq!(two_bus.days_cleared, 3.0);
    assert_eq!(five_bus.days_cleared, 3.0);
    assert_eq!(two_bus.no_solution_hours, 0.0);
    assert_eq!(five_bus.no_solution_hours, 0.0);

    assert!(
        five_bus.mean_lmp - two_bus.mean_lmp > 5.0,
        "expected the five-bus system to clear higher: two_bus={:.3}, five_bus={:.3}",
        two_bus.mean_lmp,
        five_bus.mean_lmp
    );
    assert!(five_bus.total_cost > two_bus.total_cost);
}

#[test]
fn presets_match_scenario_files() {
    for name in ["two_bus", "five_bus"] {
        let preset = run_and_parse_summary(&["--preset", name]);
        let file = run_and_parse_summary(&["--case", &format!("scenarios/{name}.toml")]);
        assert_eq!(preset.mean_lmp, file.mean_lmp, "{name}");
        assert_eq!(preset.total_cost, file.total_cost, "{name}");
    }
}

#[test]
fn seed_override_changes_actual_load() {
    let a = run_and_parse_summary(&["--preset", "two_bus", "--seed", "1"]);
    let b = run_and_parse_summary(&["--preset", "two_bus", "--seed", "2"]);
    let again = run_and_parse_summary(&["--preset", "two_bus", "--seed", "1"]);
    assert_ne!(a.total_cost, b.total_cost);
    assert_eq!(a.total_cost, again.total_cost);
}

#[test]
fn export_dir_receives_csv_files() {
    let dir = std::env::temp_dir().join(format!("iso-sim-cli-export-{}", std::process::id()));
    fs::remove_dir_all(&dir).ok();
    let dir_arg = dir.display().to_string();
    run_and_parse_summary(&["--preset", "two_bus", "--days", "2", "--export-dir", &dir_arg]);

    let lmp = fs::read_to_string(dir.join("lmp.csv")).unwrap_or_default();
    // header + 24 hours x 2 buses for the one dispatched day
    assert_eq!(lmp.lines().count(), 1 + 24 * 2);
    assert!(dir.join("dispatch.csv").exists());
    assert!(dir.join("branch_flow.csv").exists());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn invalid_case_exits_non_zero() {
    let output = run(&["--preset", "two_bus", "--days", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("simulation.days"), "{stderr}");

    let output = run(&["--preset", "nine_bus"]);
    assert!(!output.status.success());
}

#[test]
fn failing_solver_exits_non_zero() {
    // the default solver program is not installed here, so the first solve fails
    let work = std::env::temp_dir().join(format!("iso-sim-cli-fail-{}", std::process::id()));
    fs::create_dir_all(&work).ok();
    let output = Command::new(env!("CARGO_BIN_EXE_iso-sim"))
        .args(["--preset", "two_bus", "--days", "2", "--engine", "external"])
        .env("RUST_LOG", "off")
        .current_dir(&work)
        .output();
    fs::remove_dir_all(&work).ok();
    let output = output.unwrap_or_else(|e| panic!("iso-sim process should run: {e}"));
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("failed at (day 1, hour 1)"), "{stdout}");
}

#[derive(Debug)]
struct Summary {
    days_cleared: f64,
    total_cost: f64,
    mean_lmp: f64,
    no_solution_hours: f64,
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_iso-sim"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap_or_else(|e| panic!("iso-sim process should run: {e}"))
}

fn run_and_parse_summary(args: &[&str]) -> Summary {
    let output = run(args);
    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={} ",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);

    Summary {
        days_cleared: parse_metric(&stdout, "Days cleared:", ""),
        total_cost: parse_metric(&stdout, "Total cost:", "$"),
        mean_lmp: parse_metric(&stdout, "Mean LMP:", "$/MWh"),
        no_solution_hours: parse_metric(&stdout, "No-solution hours:", ""),
    }
}

fn parse_metric(stdout: &str, label: &str, unit: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing summary line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid summary format for line `{line}`"));

    let numeric = raw.strip_suffix(unit).unwrap_or(raw).trim();
    numeric
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("failed parsing `{numeric}` from summary line `{line}`"))
}
