// src/alerts/alert_gate.rs
//
// Debounce gate: one accepted alert per event type per cooldown window.
//
// The check and the timestamp update happen under a single lock, so two
// callers racing on the same event type cannot both see "no recent alert".
// One cooldown applies to every event type.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

pub struct AlertGate {
    cooldown_ms: f64,
    last_triggered_ms: Mutex<HashMap<String, f64>>,
}

impl AlertGate {
    pub fn new(cooldown_seconds: f64) -> Self {
        Self {
            cooldown_ms: cooldown_seconds * 1000.0,
            last_triggered_ms: Mutex::new(HashMap::new()),
        }
    }

    /// Accept (true) when the event type has never fired or its last
    /// accepted alert is at least one cooldown old. Acceptance records
    /// `now_ms` as the new last-trigger time.
    pub fn try_trigger(&self, event_type: &str, now_ms: f64) -> bool {
        let mut last = self.last_triggered_ms.lock();

        if let Some(&prev_ms) = last.get(event_type) {
            let elapsed_ms = now_ms - prev_ms;
            if elapsed_ms < self.cooldown_ms {
                debug!(
                    "🔕 {} suppressed ({:.0}ms into {:.0}ms cooldown)",
                    event_type, elapsed_ms, self.cooldown_ms
                );
                return false;
            }
        }

        last.insert(event_type.to_string(), now_ms);
        true
    }

    /// Number of event types that have fired at least once.
    pub fn event_type_count(&self) -> usize {
        self.last_triggered_ms.lock().len()
    }
}
