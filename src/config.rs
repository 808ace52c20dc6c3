//! TOML-based case configuration and preset definitions.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::market::genco::GenCo;
use crate::market::grid::{Branch, GeneratorParams, GridModel, Lse, SupplyOffer};
use crate::market::load::SyntheticLoadScenario;
use crate::market::types::{MarketConfig, MarketModel};
use crate::units::BasePower;

/// Top-level case configuration parsed from TOML.
///
/// Every section has defaults; a case file only needs the network
/// (`[[branch]]`, `[[generator]]`, `[[lse]]`). Load from TOML with
/// [`CaseConfig::from_toml_file`] or pick a built-in preset with
/// [`CaseConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseConfig {
    /// Run length and global parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Clearing engine selection and external solver invocation.
    #[serde(default)]
    pub solver: SolverConfig,
    /// Load perturbation and reserve.
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default, rename = "branch")]
    pub branches: Vec<BranchConfig>,
    #[serde(default, rename = "generator")]
    pub generators: Vec<GeneratorConfig>,
    #[serde(default, rename = "lse")]
    pub lses: Vec<LseConfig>,
}

/// Run length and global parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of simulated days (must be > 0).
    pub days: usize,
    /// Hours per simulated day (must be >= 2).
    pub hours_per_day: usize,
    /// Per-unit base (MVA).
    pub base_power_mva: f64,
    /// Master random seed.
    pub seed: u64,
    /// Offer price ceiling for the adequacy check ($/MWh).
    pub price_cap: f64,
    /// Share of installed capacity counted as available (0.0-1.0].
    pub ri_min_c: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            days: 4,
            hours_per_day: 24,
            base_power_mva: 100.0,
            seed: 42,
            price_cap: 1000.0,
            ri_min_c: 1.0,
        }
    }
}

/// Clearing engine: `"builtin"` runs in-process, `"external"` calls a solver.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub engine: String,
    /// Solver executable for the external engine.
    pub program: String,
    /// Unit-commitment arguments; `{model}`, `{output}` and `{day}` are filled in.
    pub scuc_args: Vec<String>,
    /// Dispatch arguments; `{commitment}` is filled in as well.
    pub sced_args: Vec<String>,
    /// Directory for solver input and output files.
    pub work_dir: PathBuf,
    /// Remove solver files after a successful solve.
    pub delete_intermediate_files: bool,
    /// Unit-commitment horizon; one day when unset.
    pub uc_horizon_hours: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let args = |a: &[&str]| a.iter().map(|s| s.to_string()).collect();
        Self {
            engine: "builtin".to_string(),
            program: "psst".to_string(),
            scuc_args: args(&["scuc", "{model}", "--output", "{output}"]),
            sced_args: args(&[
                "sced",
                "{model}",
                "--uc",
                "{commitment}",
                "--output",
                "{output}",
            ]),
            work_dir: PathBuf::from("solver-work"),
            delete_intermediate_files: true,
            uc_horizon_hours: None,
        }
    }
}

/// Load perturbation and reserve.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Relative standard deviation of actual load around the forecast.
    pub noise_std: f64,
    /// System reserve requirement per hour (MW).
    pub reserve_requirement_mw: f64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            noise_std: 0.02,
            reserve_requirement_mw: 0.0,
        }
    }
}

/// A transmission line between two 1-based buses.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BranchConfig {
    pub from: usize,
    pub to: usize,
    /// Thermal limit (MW).
    pub limit_mw: f64,
    /// Reactance (per-unit).
    pub reactance: f64,
}

/// A generator and its reported supply offer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub name: String,
    pub bus: usize,
    /// Linear cost coefficient ($/MWh).
    pub a: f64,
    /// Quadratic cost coefficient ($/MW²h).
    pub b: f64,
    pub cap_min_mw: f64,
    pub cap_max_mw: f64,
    /// Forced on in every real-time hour.
    pub canary: bool,
    pub min_up_hours: u32,
    pub min_down_hours: u32,
    /// Ramp limits (MW/h); the maximum capacity when unset.
    pub ramp_up_mw: Option<f64>,
    pub ramp_down_mw: Option<f64>,
    pub startup_ramp_mw: Option<f64>,
    pub shutdown_ramp_mw: Option<f64>,
    pub cold_start_cost: f64,
    pub hot_start_cost: f64,
    pub shutdown_cost: f64,
    pub no_load_cost: f64,
    /// Output before the first hour (MW).
    pub initial_power_mw: f64,
    /// Hours on (> 0) or off (< 0) before the first hour.
    pub initial_status_hours: i32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus: 1,
            a: 0.0,
            b: 0.0,
            cap_min_mw: 0.0,
            cap_max_mw: 0.0,
            canary: false,
            min_up_hours: 1,
            min_down_hours: 1,
            ramp_up_mw: None,
            ramp_down_mw: None,
            startup_ramp_mw: None,
            shutdown_ramp_mw: None,
            cold_start_cost: 0.0,
            hot_start_cost: 0.0,
            shutdown_cost: 0.0,
            no_load_cost: 0.0,
            initial_power_mw: 0.0,
            initial_status_hours: 1,
        }
    }
}

/// A load-serving entity and its base hourly profile (MW).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LseConfig {
    pub name: String,
    pub bus: usize,
    /// Repeated or truncated to `hours_per_day`.
    pub profile: Vec<f64>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.days"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Everything a run needs, built from a validated [`CaseConfig`].
pub struct Case {
    pub market: MarketConfig,
    pub model: MarketModel,
    pub gencos: Vec<GenCo>,
    pub load: SyntheticLoadScenario,
    pub base: BasePower,
    pub solver: SolverConfig,
}

/// Solver files separate fields with whitespace and `:`, skip `#` lines and
/// read bare numbers as values.
fn is_solver_label(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| c.is_whitespace() || c == ':')
        && !name.starts_with('#')
        && name.parse::<f64>().is_err()
}

fn gen_config(name: &str, bus: usize, a: f64, b: f64, cap_max_mw: f64) -> GeneratorConfig {
    GeneratorConfig {
        name: name.to_string(),
        bus,
        a,
        b,
        cap_max_mw,
        initial_power_mw: cap_max_mw / 2.0,
        initial_status_hours: 24,
        ..GeneratorConfig::default()
    }
}

fn branch(from: usize, to: usize, limit_mw: f64, reactance: f64) -> BranchConfig {
    BranchConfig {
        from,
        to,
        limit_mw,
        reactance,
    }
}

fn lse(name: &str, bus: usize, profile: &[f64]) -> LseConfig {
    LseConfig {
        name: name.to_string(),
        bus,
        profile: profile.to_vec(),
    }
}

impl CaseConfig {
    /// Two buses, one line, a cheap unit at bus 1 and a canary peaker at bus 2.
    pub fn two_bus() -> Self {
        Self {
            branches: vec![branch(1, 2, 150.0, 0.1)],
            generators: vec![
                GeneratorConfig {
                    hot_start_cost: 50.0,
                    shutdown_cost: 10.0,
                    no_load_cost: 5.0,
                    ..gen_config("GenCo1", 1, 10.0, 0.01, 200.0)
                },
                GeneratorConfig {
                    cap_min_mw: 10.0,
                    canary: true,
                    hot_start_cost: 20.0,
                    initial_power_mw: 10.0,
                    ..gen_config("GenCo2", 2, 25.0, 0.02, 120.0)
                },
            ],
            lses: vec![lse(
                "LSE1",
                2,
                &[
                    110.0, 104.0, 100.0, 98.0, 97.0, 99.0, 108.0, 122.0, 136.0, 145.0, 150.0,
                    153.0, 155.0, 154.0, 152.0, 150.0, 152.0, 160.0, 165.0, 160.0, 150.0, 138.0,
                    125.0, 116.0,
                ],
            )],
            ..Self::default()
        }
    }

    /// The classic five-bus test system: five generators, six lines and three
    /// load-serving entities.
    pub fn five_bus() -> Self {
        Self {
            load: LoadConfig {
                reserve_requirement_mw: 50.0,
                ..LoadConfig::default()
            },
            branches: vec![
                branch(1, 2, 250.0, 0.0281),
                branch(1, 4, 150.0, 0.0304),
                branch(1, 5, 400.0, 0.0064),
                branch(2, 3, 350.0, 0.0108),
                branch(3, 4, 240.0, 0.0297),
                branch(4, 5, 240.0, 0.0297),
            ],
            generators: vec![
                gen_config("GenCo1", 1, 14.0, 0.005, 110.0),
                gen_config("GenCo2", 1, 15.0, 0.006, 100.0),
                gen_config("GenCo3", 3, 25.0, 0.01, 520.0),
                gen_config("GenCo4", 4, 30.0, 0.012, 200.0),
                gen_config("GenCo5", 5, 10.0, 0.007, 600.0),
            ],
            lses: vec![
                lse(
                    "LSE1",
                    2,
                    &[
                        350.00, 322.93, 305.04, 296.02, 287.16, 291.59, 296.02, 314.07, 358.86,
                        394.80, 403.82, 408.25, 403.82, 394.80, 390.37, 390.37, 408.25, 448.62,
                        430.73, 426.14, 421.71, 412.69, 390.37, 363.46,
                    ],
                ),
                lse(
                    "LSE2",
                    3,
                    &[
                        300.00, 276.80, 261.47, 253.73, 246.13, 249.93, 253.73, 269.20, 307.60,
                        338.40, 346.13, 349.93, 346.13, 338.40, 334.60, 334.60, 349.93, 384.53,
                        369.20, 365.26, 361.47, 353.73, 334.60, 311.53,
                    ],
                ),
                lse(
                    "LSE3",
                    4,
                    &[
                        250.00, 230.66, 217.89, 211.44, 205.11, 208.28, 211.44, 224.33, 256.33,
                        282.00, 288.44, 291.61, 288.44, 282.00, 278.83, 278.83, 291.61, 320.44,
                        307.67, 304.39, 301.22, 294.78, 278.83, 259.61,
                    ],
                ),
            ],
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["two_bus", "five_bus"];

    /// Loads a case from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "two_bus" => Ok(Self::two_bus()),
            "five_bus" => Ok(Self::five_bus()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a case from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "case".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a case from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Highest bus number referenced anywhere in the case.
    pub fn bus_count(&self) -> usize {
        let branch_buses = self.branches.iter().flat_map(|b| [b.from, b.to]);
        let gen_buses = self.generators.iter().map(|g| g.bus);
        let lse_buses = self.lses.iter().map(|l| l.bus);
        branch_buses.chain(gen_buses).chain(lse_buses).max().unwrap_or(0)
    }

    /// Unit-commitment horizon in hours.
    pub fn uc_horizon_hours(&self) -> usize {
        self.solver
            .uc_horizon_hours
            .unwrap_or(self.simulation.hours_per_day)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut push = |field: String, message: &str| {
            errors.push(ConfigError {
                field,
                message: message.to_string(),
            });
        };

        let s = &self.simulation;
        if s.days == 0 {
            push("simulation.days".into(), "must be > 0");
        }
        if s.hours_per_day < 2 {
            push("simulation.hours_per_day".into(), "must be >= 2");
        }
        if !(s.base_power_mva.is_finite() && s.base_power_mva > 0.0) {
            push("simulation.base_power_mva".into(), "must be > 0");
        }
        if !(s.price_cap > 0.0) {
            push("simulation.price_cap".into(), "must be > 0");
        }
        if !(s.ri_min_c > 0.0 && s.ri_min_c <= 1.0) {
            push("simulation.ri_min_c".into(), "must be in (0.0, 1.0]");
        }

        let sv = &self.solver;
        match sv.engine.as_str() {
            "builtin" => {}
            "external" => {
                if sv.program.trim().is_empty() {
                    push("solver.program".into(), "must name an executable");
                }
            }
            _ => push("solver.engine".into(), "must be \"builtin\" or \"external\""),
        }
        if let Some(h) = sv.uc_horizon_hours {
            if h < s.hours_per_day {
                push(
                    "solver.uc_horizon_hours".into(),
                    "must be >= simulation.hours_per_day",
                );
            }
        }

        let l = &self.load;
        if !(l.noise_std >= 0.0) {
            push("load.noise_std".into(), "must be >= 0");
        }
        if !(l.reserve_requirement_mw >= 0.0) {
            push("load.reserve_requirement_mw".into(), "must be >= 0");
        }

        for (i, b) in self.branches.iter().enumerate() {
            if b.from == 0 || b.to == 0 {
                push(format!("branch[{i}]"), "buses are numbered from 1");
            }
            if b.from == b.to {
                push(format!("branch[{i}]"), "must connect two different buses");
            }
            if !(b.reactance > 0.0) {
                push(format!("branch[{i}].reactance"), "must be > 0");
            }
            if !(b.limit_mw > 0.0) {
                push(format!("branch[{i}].limit_mw"), "must be > 0");
            }
        }

        if self.generators.is_empty() {
            push("generator".into(), "at least one generator is required");
        }
        let mut names = HashSet::new();
        for (i, g) in self.generators.iter().enumerate() {
            if g.name.trim().is_empty() {
                push(format!("generator[{i}].name"), "must not be empty");
            } else if !is_solver_label(&g.name) {
                push(
                    format!("generator[{i}].name"),
                    "must be a single token without ':', a leading '#' or a numeric value",
                );
            } else if !names.insert(g.name.as_str()) {
                push(format!("generator[{i}].name"), "must be unique");
            }
            if g.bus == 0 {
                push(format!("generator[{i}].bus"), "buses are numbered from 1");
            }
            if !(g.cap_min_mw >= 0.0 && g.cap_min_mw <= g.cap_max_mw) {
                push(
                    format!("generator[{i}].cap_min_mw"),
                    "must be in [0, cap_max_mw]",
                );
            }
            if !(g.b >= 0.0) {
                push(format!("generator[{i}].b"), "must be >= 0");
            }
        }

        if self.lses.is_empty() {
            push("lse".into(), "at least one load-serving entity is required");
        }
        for (i, l) in self.lses.iter().enumerate() {
            if l.bus == 0 {
                push(format!("lse[{i}].bus"), "buses are numbered from 1");
            }
            if l.profile.is_empty() {
                push(format!("lse[{i}].profile"), "must not be empty");
            }
            if l.profile.iter().any(|v| !(*v >= 0.0)) {
                push(format!("lse[{i}].profile"), "values must be >= 0");
            }
        }

        errors
    }

    /// Validates the case and assembles the runtime objects.
    ///
    /// # Errors
    ///
    /// Returns every validation error when the case is invalid.
    pub fn build(&self) -> Result<Case, Vec<ConfigError>> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        let s = &self.simulation;

        let market = MarketConfig {
            days: s.days,
            hours_per_day: s.hours_per_day,
            uc_horizon_hours: self.uc_horizon_hours(),
            reserve_requirement_mw: self.load.reserve_requirement_mw,
            ri_min_c: s.ri_min_c,
            price_cap: s.price_cap,
        };

        let branches = self
            .branches
            .iter()
            .map(|b| Branch {
                from_bus: b.from,
                to_bus: b.to,
                limit_mw: b.limit_mw,
                reactance: b.reactance,
            })
            .collect();
        let model = MarketModel {
            grid: GridModel::new(self.bus_count(), branches),
            lses: self
                .lses
                .iter()
                .map(|l| Lse {
                    name: l.name.clone(),
                    bus: l.bus,
                })
                .collect(),
        };

        let gencos = self
            .generators
            .iter()
            .enumerate()
            .map(|(index, g)| {
                let params = GeneratorParams {
                    name: g.name.clone(),
                    index,
                    bus: g.bus,
                    canary: g.canary,
                    min_up_hours: g.min_up_hours,
                    min_down_hours: g.min_down_hours,
                    ramp_up_mw: g.ramp_up_mw.unwrap_or(g.cap_max_mw),
                    ramp_down_mw: g.ramp_down_mw.unwrap_or(g.cap_max_mw),
                    startup_ramp_mw: g.startup_ramp_mw.unwrap_or(g.cap_max_mw),
                    shutdown_ramp_mw: g.shutdown_ramp_mw.unwrap_or(g.cap_max_mw),
                    cold_start_cost: g.cold_start_cost,
                    hot_start_cost: g.hot_start_cost,
                    shutdown_cost: g.shutdown_cost,
                    no_load_cost: g.no_load_cost,
                    initial_power_mw: g.initial_power_mw,
                    initial_status_hours: g.initial_status_hours,
                };
                let offer = SupplyOffer {
                    a: g.a,
                    b: g.b,
                    cap_min_mw: g.cap_min_mw,
                    cap_max_mw: g.cap_max_mw,
                };
                GenCo::new(params, offer)
            })
            .collect();

        let profiles: Vec<Vec<f64>> = self.lses.iter().map(|l| l.profile.clone()).collect();
        let load = SyntheticLoadScenario::new(
            &profiles,
            s.hours_per_day,
            s.days,
            self.load.noise_std,
            s.seed,
        );

        Ok(Case {
            market,
            model,
            gencos,
            load,
            base: BasePower::new(s.base_power_mva),
            solver: self.solver.clone(),
        })
    }
}
