use crate::error::{MonitorError, Result};
use crate::types::Config;
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tracking.max_history == 0 {
            return Err(MonitorError::config("tracking.max_history must be > 0"));
        }
        if self.tracking.inactivity_eviction_seconds < 0.0 {
            return Err(MonitorError::config(
                "tracking.inactivity_eviction_seconds must be >= 0",
            ));
        }
        // The running heuristic looks 5 samples back.
        if self.activity.min_samples_for_analysis < 5 {
            return Err(MonitorError::config(
                "activity.min_samples_for_analysis must be >= 5",
            ));
        }
        if self.activity.min_samples_for_analysis > self.tracking.max_history {
            return Err(MonitorError::config(format!(
                "activity.min_samples_for_analysis ({}) exceeds tracking.max_history ({})",
                self.activity.min_samples_for_analysis, self.tracking.max_history
            )));
        }
        if self.activity.loiter_time_threshold_seconds < 0.0
            || self.activity.stationary_threshold_px < 0.0
            || self.activity.run_speed_threshold_px_per_sec < 0.0
        {
            return Err(MonitorError::config("activity thresholds must be >= 0"));
        }
        if self.alerts.cooldown_seconds < 0.0 {
            return Err(MonitorError::config("alerts.cooldown_seconds must be >= 0"));
        }
        if self.alerts.snapshot_jpeg_quality == 0 || self.alerts.snapshot_jpeg_quality > 100 {
            return Err(MonitorError::config(
                "alerts.snapshot_jpeg_quality must be in 1..=100",
            ));
        }
        if self.source.fps <= 0.0 {
            return Err(MonitorError::config("source.fps must be > 0"));
        }
        Ok(())
    }
}
