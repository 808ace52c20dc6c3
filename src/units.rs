//! Per-unit conversion against the system base power.
//!
//! Solver inputs are written in per-unit and solver outputs are read back in
//! per-unit. The core keeps everything in SI (MW, $/MWh) and converts at the
//! solver boundary with a single [`BasePower`] for the whole run.

use serde::Serialize;

/// System base power in MVA.
///
/// # Examples
///
/// ```
/// use iso_sim::units::BasePower;
///
/// let base = BasePower::new(100.0);
/// assert_eq!(base.power_to_pu(250.0), 2.5);
/// assert_eq!(base.price_to_si(2500.0), 25.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BasePower(f64);

impl BasePower {
    /// Creates a base power value.
    ///
    /// # Panics
    ///
    /// Panics if `mva` is not strictly positive and finite.
    pub fn new(mva: f64) -> Self {
        assert!(mva.is_finite() && mva > 0.0, "base power must be > 0");
        Self(mva)
    }

    /// Base value in MVA.
    pub fn mva(self) -> f64 {
        self.0
    }

    /// MW to per-unit.
    pub fn power_to_pu(self, mw: f64) -> f64 {
        mw / self.0
    }

    /// Per-unit to MW.
    pub fn power_to_si(self, pu: f64) -> f64 {
        pu * self.0
    }

    /// $/MWh to $/pu-h. A price per-unit is larger by the base factor.
    pub fn price_to_pu(self, per_mwh: f64) -> f64 {
        per_mwh * self.0
    }

    /// $/pu-h to $/MWh.
    pub fn price_to_si(self, per_pu: f64) -> f64 {
        per_pu / self.0
    }

    /// Quadratic cost coefficient ($/MW²h) to per-unit.
    pub fn quadratic_to_pu(self, per_mw2: f64) -> f64 {
        per_mw2 * self.0 * self.0
    }
}

impl Default for BasePower {
    fn default() -> Self {
        Self(100.0)
    }
}
