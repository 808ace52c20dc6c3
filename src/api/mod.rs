//! REST API over a finished market run.
//!
//! Provides three GET endpoints:
//! - `/state`: engine, final state, stage counters and run summary
//! - `/lmp?day=D&hour=H`: bus prices of one hour
//! - `/dispatch?day=D`: per-generator commitment, output and cost of one day

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::runner::RunReport;

pub use types::{BusPrice, DispatchRecord, ErrorResponse, LmpResponse};

/// Immutable application state shared across all request handlers.
///
/// Built once after the run finishes; the data is read-only.
pub struct AppState {
    pub report: RunReport,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/lmp", get(handlers::get_lmp))
        .route("/dispatch", get(handlers::get_dispatch))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
