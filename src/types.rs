// src/types.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracking: TrackingConfig,
    pub activity: ActivityConfig,
    pub alerts: AlertConfig,
    pub detection: DetectionConfig,
    pub source: SourceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Samples retained per track before the oldest is dropped
    pub max_history: usize,
    /// Tracks not reported for longer than this are evicted
    pub inactivity_eviction_seconds: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            max_history: 30,
            inactivity_eviction_seconds: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Net movement radius (px) under which a dwelling track counts as stationary
    pub stationary_threshold_px: f64,
    /// Dwell time (s) a stationary track needs before it is loitering
    pub loiter_time_threshold_seconds: f64,
    /// Trailing-window speed (px/s) above which a track is running
    pub run_speed_threshold_px_per_sec: f64,
    /// Tracks with fewer samples are skipped
    pub min_samples_for_analysis: usize,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            stationary_threshold_px: 20.0,
            loiter_time_threshold_seconds: 5.0,
            run_speed_threshold_px_per_sec: 200.0,
            min_samples_for_analysis: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Minimum spacing between two accepted alerts of the same event type
    pub cooldown_seconds: f64,
    pub snapshot_dir: String,
    pub snapshot_jpeg_quality: u8,
    pub event_log_path: String,
    /// Upper bound on how long shutdown waits for in-flight snapshots
    pub shutdown_drain_seconds: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 5.0,
            snapshot_dir: "snapshots".to_string(),
            snapshot_jpeg_quality: 90,
            event_log_path: "events.log".to_string(),
            shutdown_drain_seconds: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// COCO class ids that raise a WEAPON alert (43 = knife)
    pub weapon_class_ids: Vec<u32>,
    /// COCO class id of a person, used to discard fire regions on people
    pub person_class_id: u32,
    /// Drop fire regions whose center lies inside a person box
    pub suppress_fire_on_persons: bool,
    pub class_names: HashMap<u32, String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        let mut class_names = HashMap::new();
        class_names.insert(0, "Person".to_string());
        class_names.insert(43, "Knife".to_string());
        Self {
            weapon_class_ids: vec![43],
            person_class_id: 0,
            suppress_fire_on_persons: true,
            class_names,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON-lines file with one detection record per frame
    pub detections_path: String,
    /// Video file or camera index (only read with the `opencv` feature)
    pub video: Option<String>,
    /// Size of the blank frames synthesized when no video is attached
    pub frame_width: usize,
    pub frame_height: usize,
    /// Frame rate assumed for records that carry no timestamp
    pub fps: f64,
    /// Stamp frames with real time instead of the record timestamps
    pub use_wall_clock: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            detections_path: "detections.jsonl".to_string(),
            video: None,
            frame_width: 640,
            frame_height: 480,
            fps: 30.0,
            use_wall_clock: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "security_monitor=info".to_string(),
        }
    }
}

/// Raw RGB8 frame. Opaque to tracking and alert gating; only snapshots
/// and the overlay look at the pixels.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub timestamp_ms: f64,
}

impl Frame {
    pub fn blank(width: usize, height: usize, timestamp_ms: f64) -> Self {
        Self {
            data: vec![0u8; width * height * 3],
            width,
            height,
            timestamp_ms,
        }
    }
}
