// src/alerts/event_log.rs
//
// Append-only CSV record of accepted alerts: Timestamp, Event Type, Details.

use crate::error::Result;
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::info;

const HEADER: [&str; 3] = ["Timestamp", "Event Type", "Details"];

pub struct EventLogger {
    path: PathBuf,
}

impl EventLogger {
    /// Opens `path`, writing the header row if the file is new.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        if !path.exists() {
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(HEADER)?;
            writer.flush()?;
            info!("📝 Created event log {}", path.display());
        }
        Ok(Self { path })
    }

    pub fn log(&self, event_type: &str, details: &str) -> Result<()> {
        self.log_at(&Local::now(), event_type, details)
    }

    pub fn log_at(&self, at: &DateTime<Local>, event_type: &str, details: &str) -> Result<()> {
        let file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        let timestamp = at.format("%Y-%m-%d %H:%M:%S").to_string();
        writer.write_record([timestamp.as_str(), event_type, details])?;
        writer.flush()?;
        Ok(())
    }
}
