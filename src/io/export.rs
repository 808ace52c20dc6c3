//! CSV export of market results.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use crate::market::accumulator::ResultAccumulator;
use crate::market::grid::GridModel;

const LMP_HEADER: [&str; 5] = ["day", "hour", "bus", "lmp_per_mwh", "has_solution"];

const DISPATCH_HEADER: [&str; 8] = [
    "day",
    "hour",
    "generator",
    "committed",
    "dispatch_mw",
    "production_cost",
    "startup_cost",
    "shutdown_cost",
];

const BRANCH_FLOW_HEADER: [&str; 5] = ["day", "hour", "branch", "flow_mw", "has_solution"];

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_default()
}

/// Writes `lmp.csv`, `dispatch.csv` and `branch_flow.csv` into `dir`,
/// creating it if needed.
///
/// Values of hours without a solution are left empty.
///
/// # Errors
///
/// Returns an `io::Error` if the directory or a file cannot be written.
pub fn export_csv(results: &ResultAccumulator, grid: &GridModel, dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let create = |name: &str| File::create(dir.join(name)).map(io::BufWriter::new);
    write_lmp_csv(results, create("lmp.csv")?)?;
    write_dispatch_csv(results, create("dispatch.csv")?)?;
    write_branch_flow_csv(results, grid, create("branch_flow.csv")?)
}

/// One row per (day, hour, bus) of real-time prices.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_lmp_csv(results: &ResultAccumulator, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(LMP_HEADER)?;

    for day in results.real_time_days() {
        let Some(r) = results.real_time(day) else {
            continue;
        };
        for hour in 0..r.solution.hours() {
            let solved = results.has_solution(day, hour).unwrap_or(false);
            for bus in 1..=r.solution.lmp.entities() {
                wtr.write_record(&[
                    day.to_string(),
                    hour.to_string(),
                    GridModel::bus_name(bus),
                    cell(results.lmp(day, hour, bus)),
                    solved.to_string(),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

/// One row per (day, hour, generator) of commitment, output and cost.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_dispatch_csv(results: &ResultAccumulator, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(DISPATCH_HEADER)?;

    for day in results.real_time_days() {
        let Some(r) = results.real_time(day) else {
            continue;
        };
        for d in r.schedule.decisions() {
            let g = d.index();
            let costs = r.costs(g);
            for hour in 0..r.solution.hours() {
                let cost = |series: &[f64]| format!("{:.4}", series.get(hour).copied().unwrap_or(0.0));
                wtr.write_record(&[
                    day.to_string(),
                    hour.to_string(),
                    d.generator().to_string(),
                    u8::from(d.is_on(hour)).to_string(),
                    cell(results.dispatch(day, hour, g)),
                    cost(&costs.production),
                    cost(&costs.startup),
                    cost(&costs.shutdown),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

/// One row per (day, hour, branch) of line flow.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_branch_flow_csv(
    results: &ResultAccumulator,
    grid: &GridModel,
    writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(BRANCH_FLOW_HEADER)?;

    let names = grid.branch_names();
    for day in results.real_time_days() {
        let Some(r) = results.real_time(day) else {
            continue;
        };
        for hour in 0..r.solution.hours() {
            let solved = results.has_solution(day, hour).unwrap_or(false);
            for (branch, name) in names.iter().enumerate() {
                wtr.write_record(&[
                    day.to_string(),
                    hour.to_string(),
                    name.clone(),
                    cell(results.branch_flow(day, hour, branch)),
                    solved.to_string(),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
