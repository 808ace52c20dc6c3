//! Generator company records: offers in, schedules, dispatch and costs out.
//!
//! Bidding and learning live outside this crate. A [`GenCo`] holds what the
//! market posts back to a generator each day, and exposes the reported
//! [`SupplyOffer`] the market reads when it assembles a snapshot.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::grid::{GeneratorParams, SupplyOffer};

/// Dispatch above this level in an uncommitted hour is a sanity violation (MW).
pub const SANITY_TOLERANCE_MW: f64 = 1e-4;

/// Hourly cost breakdown for one generator over one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCosts {
    pub startup: Vec<f64>,
    pub production: Vec<f64>,
    pub shutdown: Vec<f64>,
}

impl DailyCosts {
    pub fn total(&self) -> f64 {
        self.startup.iter().sum::<f64>()
            + self.production.iter().sum::<f64>()
            + self.shutdown.iter().sum::<f64>()
    }
}

/// Output produced in an hour where the unit was not committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanityViolation {
    pub generator: String,
    pub day: usize,
    pub hour: usize,
    pub dispatch_mw: f64,
}

impl fmt::Display for SanityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} produced {:.3} MW on day {} hour {} while uncommitted",
            self.generator, self.dispatch_mw, self.day, self.hour
        )
    }
}

/// One generator's market-facing record.
#[derive(Debug, Clone)]
pub struct GenCo {
    params: GeneratorParams,
    offer: SupplyOffer,
    commitments: BTreeMap<usize, Vec<u8>>,
    dispatch: BTreeMap<usize, Vec<f64>>,
    costs: BTreeMap<usize, DailyCosts>,
}

impl GenCo {
    pub fn new(params: GeneratorParams, offer: SupplyOffer) -> Self {
        Self {
            params,
            offer,
            commitments: BTreeMap::new(),
            dispatch: BTreeMap::new(),
            costs: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.params.name
    }

    pub fn index(&self) -> usize {
        self.params.index
    }

    pub fn is_canary(&self) -> bool {
        self.params.canary
    }

    pub fn params(&self) -> &GeneratorParams {
        &self.params
    }

    /// The offer this generator reports to the market.
    pub fn supply_offer(&self) -> SupplyOffer {
        self.offer
    }

    /// Replaces the reported offer (set by an external bidding agent).
    pub fn set_supply_offer(&mut self, offer: SupplyOffer) {
        self.offer = offer;
    }

    /// Stores the commitment for `day`. The slice is copied.
    pub fn add_commitment_for_day(&mut self, day: usize, hours: &[u8]) {
        self.commitments.insert(day, hours.to_vec());
    }

    pub fn add_actual_dispatch(&mut self, day: usize, dispatch_mw: Vec<f64>) {
        self.dispatch.insert(day, dispatch_mw);
    }

    pub fn add_daily_costs(&mut self, day: usize, costs: DailyCosts) {
        self.costs.insert(day, costs);
    }

    pub fn commitment(&self, day: usize) -> Option<&[u8]> {
        self.commitments.get(&day).map(Vec::as_slice)
    }

    pub fn actual_dispatch(&self, day: usize) -> Option<&[f64]> {
        self.dispatch.get(&day).map(Vec::as_slice)
    }

    pub fn daily_costs(&self, day: usize) -> Option<&DailyCosts> {
        self.costs.get(&day)
    }

    /// Output at the end of the day before `day` (MW).
    pub fn power_t0(&self, day: usize) -> f64 {
        day.checked_sub(1)
            .and_then(|prev| self.dispatch.get(&prev))
            .and_then(|d| d.last().copied())
            .unwrap_or(self.params.initial_power_mw)
    }

    /// Signed count of consecutive on (> 0) or off (< 0) hours at the end of
    /// the day before `day`.
    pub fn unit_on_t0_state(&self, day: usize) -> i32 {
        let Some(prev) = day.checked_sub(1).and_then(|p| self.commitments.get(&p)) else {
            return self.params.initial_status_hours;
        };
        let Some(&last) = prev.last() else {
            return self.params.initial_status_hours;
        };
        let run = prev.iter().rev().take_while(|v| **v == last).count() as i32;
        if last == 1 { run } else { -run }
    }

    /// Hours of `day` in which the unit produced power without being committed.
    ///
    /// Returns nothing when either the commitment or the dispatch for `day`
    /// is missing.
    pub fn sanity_check(&self, day: usize) -> Vec<SanityViolation> {
        let (Some(committed), Some(dispatch)) =
            (self.commitments.get(&day), self.dispatch.get(&day))
        else {
            return Vec::new();
        };
        committed
            .iter()
            .zip(dispatch)
            .enumerate()
            .filter(|(_, (on, p))| **on == 0 && **p > SANITY_TOLERANCE_MW)
            .map(|(hour, (_, p))| SanityViolation {
                generator: self.params.name.clone(),
                day,
                hour,
                dispatch_mw: *p,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genco() -> GenCo {
        GenCo::new(
            GeneratorParams {
                name: "GenCo1".into(),
                index: 0,
                bus: 1,
                canary: false,
                min_up_hours: 1,
                min_down_hours: 1,
                ramp_up_mw: 100.0,
                ramp_down_mw: 100.0,
                startup_ramp_mw: 100.0,
                shutdown_ramp_mw: 100.0,
                cold_start_cost: 0.0,
                hot_start_cost: 0.0,
                shutdown_cost: 0.0,
                no_load_cost: 0.0,
                initial_power_mw: 40.0,
                initial_status_hours: 5,
            },
            SupplyOffer {
                a: 10.0,
                b: 0.01,
                cap_min_mw: 0.0,
                cap_max_mw: 100.0,
            },
        )
    }

    #[test]
    fn initial_conditions_fall_back_to_params() {
        let g = genco();
        assert_eq!(g.power_t0(1), 40.0);
        assert_eq!(g.unit_on_t0_state(1), 5);
    }

    #[test]
    fn initial_conditions_follow_previous_day() {
        let mut g = genco();
        g.add_commitment_for_day(2, &[1, 1, 0, 0, 0]);
        g.add_actual_dispatch(2, vec![30.0, 20.0, 0.0, 0.0, 0.0]);
        assert_eq!(g.power_t0(3), 0.0);
        assert_eq!(g.unit_on_t0_state(3), -3);

        g.add_commitment_for_day(3, &[0, 1, 1, 1, 1]);
        assert_eq!(g.unit_on_t0_state(4), 4);
    }

    #[test]
    fn commitment_is_copied() {
        let mut g = genco();
        let mut hours = vec![1, 0, 1];
        g.add_commitment_for_day(2, &hours);
        hours[1] = 1;
        assert_eq!(g.commitment(2), Some(&[1, 0, 1][..]));
    }

    #[test]
    fn sanity_flags_uncommitted_output() {
        let mut g = genco();
        g.add_commitment_for_day(2, &[1, 0, 0]);
        g.add_actual_dispatch(2, vec![50.0, 0.0, 12.5]);
        let v = g.sanity_check(2);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].hour, 2);
        assert_eq!(v[0].dispatch_mw, 12.5);
        assert!(g.sanity_check(3).is_empty());
    }

    #[test]
    fn daily_cost_total() {
        let c = DailyCosts {
            startup: vec![5.0, 0.0],
            production: vec![100.0, 120.0],
            shutdown: vec![0.0, 2.0],
        };
        assert_eq!(c.total(), 227.0);
    }
}
