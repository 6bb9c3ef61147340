// src/pipeline/metrics.rs
//
// Counters shared between the ingestion loop and background snapshot
// tasks. Cloning shares the same counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub tracked_detections: Arc<AtomicU64>,
    pub malformed_detections: Arc<AtomicU64>,
    pub active_tracks: Arc<AtomicU64>,
    pub tracks_evicted: Arc<AtomicU64>,
    pub activities_detected: Arc<AtomicU64>,
    pub alerts_accepted: Arc<AtomicU64>,
    pub alerts_suppressed: Arc<AtomicU64>,
    pub snapshots_saved: Arc<AtomicU64>,
    pub snapshot_failures: Arc<AtomicU64>,
    pub frame_time_us: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            tracked_detections: Arc::new(AtomicU64::new(0)),
            malformed_detections: Arc::new(AtomicU64::new(0)),
            active_tracks: Arc::new(AtomicU64::new(0)),
            tracks_evicted: Arc::new(AtomicU64::new(0)),
            activities_detected: Arc::new(AtomicU64::new(0)),
            alerts_accepted: Arc::new(AtomicU64::new(0)),
            alerts_suppressed: Arc::new(AtomicU64::new(0)),
            snapshots_saved: Arc::new(AtomicU64::new(0)),
            snapshot_failures: Arc::new(AtomicU64::new(0)),
            frame_time_us: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn set(&self, gauge: &AtomicU64, value: u64) {
        gauge.store(value, Ordering::Relaxed);
    }

    pub fn get(&self, counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.get(&self.total_frames),
            fps: self.fps(),
            tracked_detections: self.get(&self.tracked_detections),
            malformed_detections: self.get(&self.malformed_detections),
            active_tracks: self.get(&self.active_tracks),
            tracks_evicted: self.get(&self.tracks_evicted),
            activities_detected: self.get(&self.activities_detected),
            alerts_accepted: self.get(&self.alerts_accepted),
            alerts_suppressed: self.get(&self.alerts_suppressed),
            snapshots_saved: self.get(&self.snapshots_saved),
            snapshot_failures: self.get(&self.snapshot_failures),
            last_frame_us: self.get(&self.frame_time_us),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub fps: f64,
    pub tracked_detections: u64,
    pub malformed_detections: u64,
    pub active_tracks: u64,
    pub tracks_evicted: u64,
    pub activities_detected: u64,
    pub alerts_accepted: u64,
    pub alerts_suppressed: u64,
    pub snapshots_saved: u64,
    pub snapshot_failures: u64,
    pub last_frame_us: u64,
    pub elapsed_secs: f64,
}
