//! Capacity adequacy checks against forecast load.
//!
//! Findings are advisory: the caller logs them and the run goes on.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use super::grid::SupplyOffer;
use super::matrix::HourlyMatrix;
use super::types::MarketConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FeasibilityWarning {
    /// Minimum output of the fleet exceeds the load.
    MinimumOutputAboveLoad { hour: usize, minimum_mw: f64, load_mw: f64 },
    /// Capacity scaled by `ri_min_c` is below the load.
    ReserveShort { hour: usize, capacity_mw: f64, load_mw: f64 },
    /// Capacity offered at or under the price cap is below the load.
    PriceCapShort { hour: usize, capacity_mw: f64, load_mw: f64 },
}

impl fmt::Display for FeasibilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinimumOutputAboveLoad {
                hour,
                minimum_mw,
                load_mw,
            } => write!(
                f,
                "hour {hour}: minimum output {minimum_mw:.2} MW exceeds load {load_mw:.2} MW"
            ),
            Self::ReserveShort {
                hour,
                capacity_mw,
                load_mw,
            } => write!(
                f,
                "hour {hour}: derated capacity {capacity_mw:.2} MW below load {load_mw:.2} MW"
            ),
            Self::PriceCapShort {
                hour,
                capacity_mw,
                load_mw,
            } => write!(
                f,
                "hour {hour}: capacity under the price cap {capacity_mw:.2} MW below load {load_mw:.2} MW"
            ),
        }
    }
}

/// Output at which the offer's marginal cost reaches `price_cap`, or zero if
/// the unit cannot run at or under the cap.
fn capacity_under_cap(offer: &SupplyOffer, price_cap: f64) -> f64 {
    if offer.marginal_cost(offer.cap_min_mw) > price_cap {
        return 0.0;
    }
    if offer.b > 0.0 {
        ((price_cap - offer.a) / (2.0 * offer.b)).clamp(offer.cap_min_mw, offer.cap_max_mw)
    } else {
        offer.cap_max_mw
    }
}

/// Checks every hour of `load` (hour by LSE) against the offered fleet.
pub fn check_capacity(
    offers: &[SupplyOffer],
    load: &HourlyMatrix,
    config: &MarketConfig,
) -> Vec<FeasibilityWarning> {
    let minimum: f64 = offers.iter().map(|o| o.cap_min_mw).sum();
    let derated: f64 = offers.iter().map(|o| config.ri_min_c * o.cap_max_mw).sum();
    let capped: f64 = offers
        .iter()
        .map(|o| capacity_under_cap(o, config.price_cap))
        .sum();

    let mut out = Vec::new();
    for hour in 0..load.hours() {
        let load_mw = load.row_sum(hour);
        if minimum > load_mw {
            out.push(FeasibilityWarning::MinimumOutputAboveLoad {
                hour,
                minimum_mw: minimum,
                load_mw,
            });
        }
        if derated < load_mw {
            out.push(FeasibilityWarning::ReserveShort {
                hour,
                capacity_mw: derated,
                load_mw,
            });
        }
        if capped < load_mw {
            out.push(FeasibilityWarning::PriceCapShort {
                hour,
                capacity_mw: capped,
                load_mw,
            });
        }
    }
    out
}

/// Runs [`check_capacity`] and logs each finding for `day`.
pub fn warn_on_shortfall(
    day: usize,
    offers: &[SupplyOffer],
    load: &HourlyMatrix,
    config: &MarketConfig,
) -> usize {
    let findings = check_capacity(offers, load, config);
    for w in &findings {
        warn!(day, %w, "capacity adequacy");
    }
    findings.len()
}
