// src/error.rs

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Error, Debug)]
pub enum MonitorError {
    /// A single detection record that cannot be attributed or located.
    /// Callers skip the record and keep processing the frame.
    #[error("Malformed detection: {0}")]
    MalformedDetection(String),

    #[error("Snapshot write failed for {path}: {source}")]
    SnapshotWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot encoding failed: {0}")]
    ImageEncode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),
}

impl MonitorError {
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedDetection(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn encode<S: Into<String>>(msg: S) -> Self {
        Self::ImageEncode(msg.into())
    }
}
