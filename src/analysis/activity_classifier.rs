// src/analysis/activity_classifier.rs
//
// Heuristic behavior labels from track history.
//
//   LOITERING: buffer spans more than loiter_time_threshold while the net
//              first→last displacement stays under stationary_threshold.
//              Net displacement ignores detector jitter around a fixed spot.
//   RUNNING:   speed between the sample 5 back and the latest one exceeds
//              run_speed_threshold. Uses wall-clock deltas, so the
//              threshold holds under variable frame rate.
//
// Labels are independent; one track can carry both in the same pass.

use super::track_history::{TrackHistoryStore, TrackId, TrackRecord};
use crate::alerts::{LOITERING_EVENT, RUNNING_EVENT};
use crate::types::ActivityConfig;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Samples spanned by the running-speed window (latest plus 4 before it).
pub const RUN_WINDOW_SAMPLES: usize = 5;

/// Keeps the speed finite when two samples share a timestamp.
const SPEED_EPSILON_SECONDS: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ActivityLabel {
    Loitering,
    Running,
}

impl ActivityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loitering => "loitering",
            Self::Running => "running",
        }
    }

    /// Alert gate key for this label.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Loitering => LOITERING_EVENT,
            Self::Running => RUNNING_EVENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityResult {
    pub track_id: TrackId,
    pub label: ActivityLabel,
    /// Heuristic labels are binary; always 1.0.
    pub confidence: f32,
}

pub type ActivityMap = BTreeMap<TrackId, BTreeSet<ActivityLabel>>;

pub struct ActivityClassifier {
    config: ActivityConfig,
}

impl ActivityClassifier {
    pub fn new(config: ActivityConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, store: &TrackHistoryStore) -> ActivityMap {
        let mut results = ActivityMap::new();

        for record in store.records() {
            let labels = self.classify(record);
            if !labels.is_empty() {
                results.insert(record.track_id, labels);
            }
        }

        results
    }

    /// Labels for a single track; empty when history is too short.
    pub fn classify(&self, record: &TrackRecord) -> BTreeSet<ActivityLabel> {
        let mut labels = BTreeSet::new();
        if record.len() < self.config.min_samples_for_analysis {
            return labels;
        }

        let samples = record.samples();
        let (Some(first), Some(curr)) = (samples.front(), samples.back()) else {
            return labels;
        };

        let duration_s = curr.seconds_since(first);
        let displacement = curr.distance_to(first);
        if duration_s > self.config.loiter_time_threshold_seconds
            && displacement < self.config.stationary_threshold_px
        {
            debug!(
                "🧍 Track {} loitering: {:.1}s, moved {:.1}px",
                record.track_id, duration_s, displacement
            );
            labels.insert(ActivityLabel::Loitering);
        }

        if samples.len() >= RUN_WINDOW_SAMPLES {
            let prev = &samples[samples.len() - RUN_WINDOW_SAMPLES];
            let speed = curr.distance_to(prev) / (curr.seconds_since(prev) + SPEED_EPSILON_SECONDS);
            if speed > self.config.run_speed_threshold_px_per_sec {
                debug!(
                    "🏃 Track {} running: {:.0}px/s",
                    record.track_id, speed
                );
                labels.insert(ActivityLabel::Running);
            }
        }

        labels
    }
}

/// Flatten to `{track_id, label}` pairs in track-id order.
pub fn flatten(map: &ActivityMap) -> Vec<ActivityResult> {
    map.iter()
        .flat_map(|(tid, labels)| {
            labels.iter().map(move |label| ActivityResult {
                track_id: *tid,
                label: *label,
                confidence: 1.0,
            })
        })
        .collect()
}
