//! Reference-model data file handed to the solver.
//!
//! The file is a set/param data file in per-unit. Only the writer lives here;
//! the solver owns the reading side.

use std::io::{self, Write};

use serde::Serialize;
use tracing::warn;

use crate::market::grid::{GeneratorParams, GridModel, Lse, SupplyOffer};
use crate::market::matrix::HourlyMatrix;
use crate::units::BasePower;

/// A generator as seen by one solve: static parameters, the offer in force
/// and the initial conditions carried over from the previous day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratorSnapshot {
    pub params: GeneratorParams,
    pub offer: SupplyOffer,
    pub power_t0_mw: f64,
    pub unit_on_t0: i32,
}

/// Everything a solver needs to clear one day, in SI units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSnapshot {
    /// Day being cleared.
    pub day: usize,
    /// Number of time periods in the model, at least one day.
    pub horizon_hours: usize,
    pub grid: GridModel,
    pub generators: Vec<GeneratorSnapshot>,
    pub lses: Vec<Lse>,
    /// Demand (MW), `horizon_hours` by LSE.
    pub demand: HourlyMatrix,
    pub reserve_requirement_mw: f64,
}

impl ModelSnapshot {
    /// Total demand at `bus` in `hour` (MW).
    pub fn bus_demand(&self, hour: usize, bus: usize) -> f64 {
        self.lses
            .iter()
            .enumerate()
            .filter(|(_, l)| l.bus == bus)
            .map(|(i, _)| self.demand.get(hour, i))
            .sum()
    }

    /// Generator names paired with their indices.
    pub fn generator_keys(&self) -> Vec<(&str, usize)> {
        self.generators
            .iter()
            .map(|g| (g.params.name.as_str(), g.params.index))
            .collect()
    }
}

/// Writes `snapshot` as a per-unit model data file.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_model(
    snapshot: &ModelSnapshot,
    base: BasePower,
    mut w: impl Write,
) -> io::Result<()> {
    let grid = &snapshot.grid;
    writeln!(
        w,
        "# Reference model for day {}, per-unit on a {} MVA base",
        snapshot.day,
        base.mva()
    )?;
    writeln!(w)?;

    let buses: Vec<String> = (1..=grid.buses).map(GridModel::bus_name).collect();
    writeln!(w, "set Buses := {} ;", buses.join(" "))?;
    writeln!(w)?;

    let lines = grid.branch_names();
    writeln!(w, "set TransmissionLines := {} ;", lines.join(" "))?;
    writeln!(w)?;
    writeln!(w, "param NumTransmissionLines := {} ;", grid.branches.len())?;
    writeln!(w)?;
    writeln!(w, "param: BusFrom BusTo ThermalLimit Reactance :=")?;
    for (name, b) in lines.iter().zip(&grid.branches) {
        writeln!(
            w,
            "{name} Bus{} Bus{} {} {}",
            b.from_bus,
            b.to_bus,
            base.power_to_pu(b.limit_mw),
            b.reactance
        )?;
    }
    writeln!(w, ";")?;
    writeln!(w)?;

    let gens: Vec<&str> = snapshot
        .generators
        .iter()
        .map(|g| g.params.name.as_str())
        .collect();
    writeln!(w, "set ThermalGenerators := {} ;", gens.join(" "))?;
    writeln!(w)?;
    for bus in 1..=grid.buses {
        let at_bus: Vec<&str> = snapshot
            .generators
            .iter()
            .filter(|g| g.params.bus == bus)
            .map(|g| g.params.name.as_str())
            .collect();
        writeln!(
            w,
            "set ThermalGeneratorsAtBus[Bus{bus}] := {} ;",
            at_bus.join(" ")
        )?;
    }
    writeln!(w)?;
    writeln!(w, "param NumTimePeriods := {} ;", snapshot.horizon_hours)?;
    writeln!(w)?;

    writeln!(
        w,
        "param: PowerGeneratedT0 UnitOnT0State MinimumPowerOutput MaximumPowerOutput \
         MinimumUpTime MinimumDownTime NominalRampUpLimit NominalRampDownLimit \
         StartupRampLimit ShutdownRampLimit ColdStartCost HotStartCost \
         ShutdownCostCoefficient :="
    )?;
    for g in &snapshot.generators {
        let p = &g.params;
        let o = &g.offer;
        let power_t0 = clamp_power_t0(g);
        writeln!(
            w,
            "{} {} {} {} {} {} {} {} {} {} {} {} {} {}",
            p.name,
            base.power_to_pu(power_t0),
            g.unit_on_t0,
            base.power_to_pu(o.cap_min_mw),
            base.power_to_pu(o.cap_max_mw),
            p.min_up_hours,
            p.min_down_hours,
            base.power_to_pu(p.ramp_up_mw),
            base.power_to_pu(p.ramp_down_mw),
            base.power_to_pu(p.startup_ramp_mw),
            base.power_to_pu(p.shutdown_ramp_mw),
            p.cold_start_cost,
            p.hot_start_cost,
            p.shutdown_cost
        )?;
    }
    writeln!(w, ";")?;
    writeln!(w)?;

    writeln!(w, "param: Demand :=")?;
    for bus in 1..=grid.buses {
        for h in 0..snapshot.horizon_hours {
            writeln!(
                w,
                "Bus{bus} {} {}",
                h + 1,
                base.power_to_pu(snapshot.bus_demand(h, bus))
            )?;
        }
    }
    writeln!(w, ";")?;
    writeln!(w)?;

    writeln!(w, "param: ReserveRequirement :=")?;
    let reserve = base.power_to_pu(snapshot.reserve_requirement_mw);
    for h in 0..snapshot.horizon_hours {
        writeln!(w, "{} {reserve}", h + 1)?;
    }
    writeln!(w, ";")?;
    writeln!(w)?;

    writeln!(
        w,
        "param: ProductionCostA0 ProductionCostA1 ProductionCostA2 :="
    )?;
    for g in &snapshot.generators {
        writeln!(
            w,
            "{} {} {} {}",
            g.params.name,
            g.params.no_load_cost,
            base.price_to_pu(g.offer.a),
            base.quadratic_to_pu(g.offer.b)
        )?;
    }
    writeln!(w, ";")?;
    w.flush()
}

fn clamp_power_t0(g: &GeneratorSnapshot) -> f64 {
    let (lo, hi) = (g.offer.cap_min_mw, g.offer.cap_max_mw);
    if g.power_t0_mw < lo || g.power_t0_mw > hi {
        let clamped = g.power_t0_mw.clamp(lo, hi);
        warn!(
            generator = %g.params.name,
            power_t0_mw = g.power_t0_mw,
            clamped_mw = clamped,
            "initial output outside operating range, clamping"
        );
        return clamped;
    }
    g.power_t0_mw
}
