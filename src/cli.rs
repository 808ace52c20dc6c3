//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::config::CaseConfig;

/// Wholesale power market simulator: day-ahead commitment and real-time
/// dispatch over a multi-day horizon.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Load the case from a TOML file.
    #[clap(long, conflicts_with = "preset", env = "ISO_SIM_CASE")]
    pub case: Option<PathBuf>,

    /// Use a built-in case (two_bus, five_bus).
    #[clap(long)]
    pub preset: Option<String>,

    /// Override the number of simulated days.
    #[clap(long)]
    pub days: Option<usize>,

    /// Override the random seed.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Override the clearing engine (builtin, external).
    #[clap(long)]
    pub engine: Option<String>,

    /// Write lmp.csv, dispatch.csv and branch_flow.csv into this directory.
    #[clap(long)]
    pub export_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset.
    #[clap(long, default_value = "info", env = "ISO_SIM_LOG")]
    pub log_level: String,

    /// Emit logs as JSON.
    #[clap(long)]
    pub json_logs: bool,

    /// Serve the results over HTTP once the run ends.
    #[cfg(feature = "api")]
    #[clap(long)]
    pub serve: bool,

    /// API server port.
    #[cfg(feature = "api")]
    #[clap(long, default_value = "3000")]
    pub port: u16,
}

impl Args {
    /// Loads the selected case (file, preset or `two_bus`) and applies the
    /// command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns the loader's message when the file or preset cannot be loaded.
    pub fn load_case(&self) -> Result<CaseConfig, String> {
        let mut cfg = if let Some(path) = &self.case {
            CaseConfig::from_toml_file(path).map_err(|e| e.to_string())?
        } else if let Some(name) = &self.preset {
            CaseConfig::from_preset(name).map_err(|e| e.to_string())?
        } else {
            CaseConfig::two_bus()
        };

        if let Some(days) = self.days {
            cfg.simulation.days = days;
        }
        if let Some(seed) = self.seed {
            cfg.simulation.seed = seed;
        }
        if let Some(engine) = &self.engine {
            cfg.solver.engine = engine.clone();
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("iso-sim").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_to_two_bus() {
        let args = parse(&[]).unwrap_or_else(|e| panic!("{e}"));
        let cfg = args.load_case().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(cfg.bus_count(), 2);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn overrides_apply() {
        let args = parse(&[
            "--preset", "five_bus", "--days", "2", "--seed", "9", "--engine", "external",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        let cfg = args.load_case().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(cfg.bus_count(), 5);
        assert_eq!(cfg.simulation.days, 2);
        assert_eq!(cfg.simulation.seed, 9);
        assert_eq!(cfg.solver.engine, "external");
    }

    #[test]
    fn case_and_preset_conflict() {
        assert!(parse(&["--case", "a.toml", "--preset", "two_bus"]).is_err());
    }

    #[test]
    fn unknown_preset_is_reported() {
        let args = parse(&["--preset", "nine_bus"]).unwrap_or_else(|e| panic!("{e}"));
        let msg = args.load_case().err().unwrap_or_default();
        assert!(msg.contains("five_bus"), "{msg}");
    }
}
