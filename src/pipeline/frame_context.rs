// src/pipeline/frame_context.rs
//
// Everything the pipeline concluded about one frame. Renderers and sinks
// read from this instead of reaching into the store or the gate.

use crate::analysis::{ActivityResult, TrackId};
use crate::detection::Detection;
use crate::types::Frame;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AcceptedAlert {
    pub event_type: String,
    pub details: String,
    pub frame_id: u64,
    pub timestamp_ms: f64,
    pub frame: Arc<Frame>,
}

#[derive(Debug, Clone)]
pub struct FrameContext {
    pub frame_id: u64,
    pub timestamp_ms: f64,
    pub frame: Arc<Frame>,
    pub detections: Vec<Detection>,
    pub activities: Vec<ActivityResult>,
    pub accepted_alerts: Vec<AcceptedAlert>,
    pub suppressed_alerts: usize,
    pub evicted_tracks: Vec<TrackId>,
    pub active_tracks: usize,
}

impl FrameContext {
    pub fn new(frame_id: u64, timestamp_ms: f64, frame: Arc<Frame>) -> Self {
        Self {
            frame_id,
            timestamp_ms,
            frame,
            detections: Vec::new(),
            activities: Vec::new(),
            accepted_alerts: Vec::new(),
            suppressed_alerts: 0,
            evicted_tracks: Vec::new(),
            active_tracks: 0,
        }
    }

    pub fn has_alerts(&self) -> bool {
        !self.accepted_alerts.is_empty()
    }

    /// Was this event type accepted on this frame?
    pub fn accepted(&self, event_type: &str) -> bool {
        self.accepted_alerts
            .iter()
            .any(|a| a.event_type == event_type)
    }
}
