//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use crate::market::grid::GridModel;
use crate::market::real_time::DailyRealTime;
use crate::runner::RunReport;

use super::AppState;
use super::types::{
    BusPrice, DispatchQuery, DispatchRecord, ErrorResponse, LmpQuery, LmpResponse,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: String) -> ApiError {
    (status, Json(ErrorResponse { error: message }))
}

fn require(value: Option<usize>, name: &str) -> Result<usize, ApiError> {
    value.ok_or_else(|| {
        error(
            StatusCode::BAD_REQUEST,
            format!("missing query parameter `{name}`"),
        )
    })
}

fn dispatched_day(state: &AppState, day: usize) -> Result<&DailyRealTime, ApiError> {
    state.report.accumulator.real_time(day).ok_or_else(|| {
        error(
            StatusCode::NOT_FOUND,
            format!("no real-time results for day {day}"),
        )
    })
}

/// `GET /state` → 200 + `RunReport` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<RunReport> {
    Json(state.report.clone())
}

/// `GET /lmp?day=D&hour=H` → 200 + `LmpResponse`
/// Missing parameters or an hour past the end of the day → 400;
/// a day without real-time results → 404.
pub async fn get_lmp(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LmpQuery>,
) -> Result<Json<LmpResponse>, ApiError> {
    let day = require(query.day, "day")?;
    let hour = require(query.hour, "hour")?;
    let r = dispatched_day(&state, day)?;
    if hour >= r.solution.hours() {
        return Err(error(
            StatusCode::BAD_REQUEST,
            format!("`hour` ({hour}) must be < {}", r.solution.hours()),
        ));
    }

    let acc = &state.report.accumulator;
    let prices = acc
        .lmp_row(day, hour)
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(i, p)| BusPrice {
                    bus: GridModel::bus_name(i + 1),
                    lmp_per_mwh: *p,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Json(LmpResponse {
        day,
        hour,
        has_solution: acc.has_solution(day, hour).unwrap_or(false),
        prices,
    }))
}

/// `GET /dispatch?day=D` → 200 + `Vec<DispatchRecord>`
/// Missing `day` → 400; a day without real-time results → 404.
pub async fn get_dispatch(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DispatchQuery>,
) -> Result<Json<Vec<DispatchRecord>>, ApiError> {
    let day = require(query.day, "day")?;
    let r = dispatched_day(&state, day)?;
    let acc = &state.report.accumulator;

    let mut records = Vec::new();
    for d in r.schedule.decisions() {
        let costs = r.costs(d.index());
        for hour in 0..r.solution.hours() {
            let at = |series: &[f64]| series.get(hour).copied().unwrap_or(0.0);
            records.push(DispatchRecord {
                hour,
                generator: d.generator().to_string(),
                committed: d.is_on(hour),
                dispatch_mw: acc.dispatch(day, hour, d.index()),
                production_cost: at(&costs.production),
                startup_cost: at(&costs.startup),
                shutdown_cost: at(&costs.shutdown),
            });
        }
    }
    Ok(Json(records))
}
