//! Load forecasting utilities.

use crate::market::matrix::HourlyMatrix;

/// Naive "tomorrow is today" forecaster.
///
/// Copies the provided baseline and repeats or truncates it to match the
/// requested horizon.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaiveForecast;

impl NaiveForecast {
    /// Produce a naive forecast for the given horizon.
    ///
    /// # Arguments
    ///
    /// * `baseline` - Values used as the forecast template
    /// * `horizon` - Number of hours to forecast
    ///
    /// # Returns
    ///
    /// A vector of forecast values with length equal to `horizon`.
    pub fn forecast(&self, baseline: &[f64], horizon: usize) -> Vec<f64> {
        if baseline.is_empty() {
            return vec![0.0; horizon];
        }
        baseline.iter().copied().cycle().take(horizon).collect()
    }

    /// Extends a one-day load matrix to `horizon` hours.
    ///
    /// Hours past the first day come from `lookahead` when it is given,
    /// otherwise the first day is repeated.
    pub fn extend(
        &self,
        day: &HourlyMatrix,
        lookahead: Option<&HourlyMatrix>,
        horizon: usize,
    ) -> HourlyMatrix {
        let columns: Vec<Vec<f64>> = (0..day.entities())
            .map(|e| {
                let mut series = day.column(e);
                if let Some(next) = lookahead {
                    series.extend(next.column(e));
                }
                self.forecast(&series, horizon)
            })
            .collect();
        HourlyMatrix::from_columns(&columns, horizon)
            .unwrap_or_else(|| HourlyMatrix::zeros(horizon, day.entities()))
    }
}
