// src/pipeline/event_bus.rs
//
// Decoupled event system. The pipeline publishes what happened on a
// frame; sinks (event log, console) drain it without touching pipeline
// state.

use super::frame_context::AcceptedAlert;
use crate::analysis::TrackId;
use std::collections::VecDeque;
use tracing::warn;

#[derive(Debug, Clone)]
pub enum PipelineEvent {
    AlertAccepted(AcceptedAlert),

    TrackEvicted {
        track_id: TrackId,
        timestamp_ms: f64,
    },

    MalformedDetections {
        frame_id: u64,
        count: usize,
    },
}

pub struct EventBus {
    events: VecDeque<PipelineEvent>,
    max_pending: usize,
}

impl EventBus {
    pub fn new(max_pending: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending: max_pending.max(1),
        }
    }

    pub fn publish(&mut self, event: PipelineEvent) {
        if self.events.len() >= self.max_pending {
            warn!(
                "Event bus full ({} events), dropping oldest",
                self.max_pending
            );
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<PipelineEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_bus_drops_oldest() {
        let mut bus = EventBus::new(2);
        for id in 1..=3 {
            bus.publish(PipelineEvent::TrackEvicted {
                track_id: id,
                timestamp_ms: 0.0,
            });
        }
        let drained = bus.drain();
        assert_eq!(drained.len(), 2);
        assert!(matches!(
            drained[0],
            PipelineEvent::TrackEvicted { track_id: 2, .. }
        ));
        assert_eq!(bus.pending_count(), 0);
    }
}
