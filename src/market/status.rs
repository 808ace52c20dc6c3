//! Hourly status announcements.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::debug;

/// Which load a [`StatusEvent`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusKind {
    ForecastLoad,
    ActualLoad,
}

/// Per-LSE load for one hour (MW).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEvent {
    pub day: usize,
    pub hour: usize,
    pub kind: StatusKind,
    pub loads: Vec<f64>,
}

/// Receives the scheduler's hourly announcements.
pub trait StatusObserver {
    fn notify(&mut self, event: &StatusEvent);
}

/// Logs every announcement at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StatusObserver for TracingObserver {
    fn notify(&mut self, event: &StatusEvent) {
        let total: f64 = event.loads.iter().sum();
        debug!(
            day = event.day,
            hour = event.hour,
            kind = ?event.kind,
            total_mw = total,
            "load announced"
        );
    }
}

/// Keeps every announcement in memory.
///
/// Clones share the same log, so a handle kept by the caller sees what the
/// scheduler's copy records.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Arc<Mutex<Vec<StatusEvent>>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl StatusObserver for EventLog {
    fn notify(&mut self, event: &StatusEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
