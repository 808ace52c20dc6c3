//! Load scenarios: forecast and realized demand per LSE.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::forecast::NaiveForecast;

use super::matrix::HourlyMatrix;

/// Source of per-day load profiles, hour by LSE, in MW.
///
/// `forecast` is what the day-ahead market clears against; `actual` is what
/// the real-time market sees. Days are 1-based. `None` means the scenario has
/// no data for that day.
pub trait LoadScenario {
    fn forecast(&self, day: usize) -> Option<HourlyMatrix>;
    fn actual(&self, day: usize) -> Option<HourlyMatrix>;
}

/// Fixed per-day profiles.
#[derive(Debug, Clone)]
pub struct TableLoadScenario {
    forecast: Vec<HourlyMatrix>,
    actual: Vec<HourlyMatrix>,
}

impl TableLoadScenario {
    /// `forecast[d - 1]` and `actual[d - 1]` hold day `d`.
    pub fn new(forecast: Vec<HourlyMatrix>, actual: Vec<HourlyMatrix>) -> Self {
        Self { forecast, actual }
    }
}

impl LoadScenario for TableLoadScenario {
    fn forecast(&self, day: usize) -> Option<HourlyMatrix> {
        day.checked_sub(1)
            .and_then(|d| self.forecast.get(d))
            .cloned()
    }

    fn actual(&self, day: usize) -> Option<HourlyMatrix> {
        day.checked_sub(1).and_then(|d| self.actual.get(d)).cloned()
    }
}

/// Forecast repeats a base profile every day; actual load perturbs it with
/// seeded relative Gaussian noise.
///
/// Every day's actual profile is drawn up front, so the same seed always
/// yields the same loads no matter which days are queried.
#[derive(Debug, Clone)]
pub struct SyntheticLoadScenario {
    table: TableLoadScenario,
}

impl SyntheticLoadScenario {
    /// # Arguments
    ///
    /// * `base_profiles` - One hourly profile per LSE (MW), fitted to `hours_per_day`
    /// * `hours_per_day` - Hours in a simulated day
    /// * `days` - Number of days to generate
    /// * `noise_std` - Relative standard deviation of the actual-load perturbation
    /// * `seed` - RNG seed
    pub fn new(
        base_profiles: &[Vec<f64>],
        hours_per_day: usize,
        days: usize,
        noise_std: f64,
        seed: u64,
    ) -> Self {
        let columns: Vec<Vec<f64>> = base_profiles
            .iter()
            .map(|p| NaiveForecast.forecast(p, hours_per_day))
            .collect();
        let forecast = HourlyMatrix::from_columns(&columns, hours_per_day)
            .unwrap_or_else(|| HourlyMatrix::zeros(hours_per_day, columns.len()));

        let mut rng = StdRng::seed_from_u64(seed);
        let mut actual = Vec::with_capacity(days);
        for _ in 0..days {
            let mut day = forecast.clone();
            day.map_in_place(|mw| (mw * (1.0 + gaussian_noise(&mut rng, noise_std))).max(0.0));
            actual.push(day);
        }

        Self {
            table: TableLoadScenario::new(vec![forecast; days], actual),
        }
    }
}

impl LoadScenario for SyntheticLoadScenario {
    fn forecast(&self, day: usize) -> Option<HourlyMatrix> {
        self.table.forecast(day)
    }

    fn actual(&self, day: usize) -> Option<HourlyMatrix> {
        self.table.actual(day)
    }
}

/// Gaussian noise with mean 0 via the Box-Muller transform.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}
