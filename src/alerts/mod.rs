// src/alerts/mod.rs
//
// Alert path: candidate → AlertGate (cooldown) → notification, event log,
// and a background snapshot via SnapshotDispatcher.

pub mod alert_gate;
pub mod event_log;
pub mod snapshot;

pub use alert_gate::AlertGate;
pub use event_log::EventLogger;
pub use snapshot::SnapshotDispatcher;

use serde::Serialize;

pub const FIRE_EVENT: &str = "FIRE";
pub const WEAPON_EVENT: &str = "WEAPON";
pub const LOITERING_EVENT: &str = "LOITERING";
pub const RUNNING_EVENT: &str = "RUNNING";

/// An alert request before the cooldown gate has ruled on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertCandidate {
    pub event_type: String,
    pub details: String,
}

impl AlertCandidate {
    pub fn new(event_type: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            details: details.into(),
        }
    }
}
