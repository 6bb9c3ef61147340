// src/analysis/track_history.rs
//
// Per-track bounded position history.
//
// Design:
//   - One VecDeque ring per tracking id, capped at max_history samples
//   - Position sample = integer bbox centroid, stamped with the frame time
//   - Ids the external tracker stops reporting are evicted after the
//     inactivity window so the map cannot grow without bound
//   - Detections without a tracking id are ignored

use crate::detection::Detection;
use crate::types::TrackingConfig;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

pub type TrackId = u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSample {
    pub position: (i32, i32),
    pub observed_at_ms: f64,
}

impl TrackSample {
    pub fn distance_to(&self, other: &TrackSample) -> f64 {
        let dx = self.position.0 as f64 - other.position.0 as f64;
        let dy = self.position.1 as f64 - other.position.1 as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Seconds elapsed from `earlier` to this sample.
    pub fn seconds_since(&self, earlier: &TrackSample) -> f64 {
        (self.observed_at_ms - earlier.observed_at_ms) / 1000.0
    }
}

#[derive(Debug, Clone)]
pub struct TrackRecord {
    pub track_id: TrackId,
    samples: VecDeque<TrackSample>,
    last_seen_ms: f64,
}

impl TrackRecord {
    fn new(track_id: TrackId, capacity: usize) -> Self {
        Self {
            track_id,
            samples: VecDeque::with_capacity(capacity),
            last_seen_ms: f64::NEG_INFINITY,
        }
    }

    fn push(&mut self, position: (i32, i32), now_ms: f64, capacity: usize) {
        // Never let a clock step backwards break chronological order.
        let observed_at_ms = now_ms.max(self.last_seen_ms);
        if observed_at_ms > now_ms {
            debug!(
                "Track {}: clamped sample time {:.1}ms -> {:.1}ms",
                self.track_id, now_ms, observed_at_ms
            );
        }

        self.samples.push_back(TrackSample {
            position,
            observed_at_ms,
        });
        while self.samples.len() > capacity {
            self.samples.pop_front();
        }
        self.last_seen_ms = observed_at_ms;
    }

    pub fn samples(&self) -> &VecDeque<TrackSample> {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&TrackSample> {
        self.samples.front()
    }

    pub fn latest(&self) -> Option<&TrackSample> {
        self.samples.back()
    }

    pub fn last_seen_ms(&self) -> f64 {
        self.last_seen_ms
    }

    /// Time span covered by the buffer, in milliseconds
    pub fn history_duration_ms(&self) -> f64 {
        match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) => last.observed_at_ms - first.observed_at_ms,
            _ => 0.0,
        }
    }
}

pub struct TrackHistoryStore {
    records: HashMap<TrackId, TrackRecord>,
    max_history: usize,
    inactivity_window_ms: f64,
}

impl TrackHistoryStore {
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            records: HashMap::new(),
            max_history: config.max_history.max(1),
            inactivity_window_ms: config.inactivity_eviction_seconds * 1000.0,
        }
    }

    /// Append one sample per tracked detection, then evict stale tracks.
    /// Returns the ids evicted by this call.
    pub fn update(&mut self, detections: &[Detection], now_ms: f64) -> Vec<TrackId> {
        let mut touched: HashSet<TrackId> = HashSet::new();

        for det in detections {
            let Some(tid) = det.track_id else {
                continue;
            };
            touched.insert(tid);

            let capacity = self.max_history;
            self.records
                .entry(tid)
                .or_insert_with(|| {
                    debug!("🆕 Track {} started", tid);
                    TrackRecord::new(tid, capacity)
                })
                .push(det.centroid_px(), now_ms, capacity);
        }

        let cutoff_ms = now_ms - self.inactivity_window_ms;
        let mut evicted: Vec<TrackId> = self
            .records
            .iter()
            .filter(|(tid, rec)| !touched.contains(*tid) && rec.last_seen_ms < cutoff_ms)
            .map(|(tid, _)| *tid)
            .collect();
        evicted.sort_unstable();

        for tid in &evicted {
            if let Some(rec) = self.records.remove(tid) {
                debug!(
                    "🗑️  Track {} evicted (last seen {:.0}ms ago, {} samples)",
                    tid,
                    now_ms - rec.last_seen_ms,
                    rec.len()
                );
            }
        }

        evicted
    }

    pub fn get(&self, track_id: TrackId) -> Option<&TrackRecord> {
        self.records.get(&track_id)
    }

    pub fn records(&self) -> impl Iterator<Item = &TrackRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
