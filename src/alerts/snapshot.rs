// src/alerts/snapshot.rs
//
// Fire-and-forget snapshot persistence for accepted alerts.
//
// dispatch() stamps the trigger time, hands JPEG encoding and the disk
// write to tokio's blocking pool and returns at once. Outcomes are only
// visible in logs and metrics; a failed write is logged and dropped.
//
// File name: {event_type}_{YYYYMMDD_HHMMSS}.jpg, stamped with local wall
// time at dispatch, the same clock the CSV event log uses. In replay mode
// the gate runs on record time, so names reflect when the replay ran, not
// the frame timestamp. Two alerts of one type in the same second
// overwrite each other.

use crate::error::{MonitorError, Result};
use crate::pipeline::PipelineMetrics;
use crate::types::Frame;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{error, info};

pub struct SnapshotDispatcher {
    dir: PathBuf,
    jpeg_quality: u8,
    runtime: Handle,
    in_flight: Arc<AtomicUsize>,
    metrics: PipelineMetrics,
}

/// Decrements the in-flight count even if the task panics.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SnapshotDispatcher {
    /// Creates `dir` if needed. Must be given a handle to a running
    /// multi-thread runtime.
    pub fn new(
        dir: impl Into<PathBuf>,
        jpeg_quality: u8,
        runtime: Handle,
        metrics: PipelineMetrics,
    ) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        info!("📁 Snapshot directory: {}", dir.display());

        Ok(Self {
            dir,
            jpeg_quality: jpeg_quality.clamp(1, 100),
            runtime,
            in_flight: Arc::new(AtomicUsize::new(0)),
            metrics,
        })
    }

    pub fn dispatch(&self, frame: Arc<Frame>, event_type: &str) {
        let path = snapshot_path(&self.dir, event_type, &Local::now());
        let quality = self.jpeg_quality;
        let metrics = self.metrics.clone();

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(self.in_flight.clone());

        // Detached: the JoinHandle is dropped on purpose.
        self.runtime.spawn_blocking(move || {
            let _guard = guard;
            match write_snapshot(&frame, &path, quality) {
                Ok(()) => {
                    metrics.inc(&metrics.snapshots_saved);
                    info!("📸 Snapshot saved: {}", path.display());
                }
                Err(e) => {
                    metrics.inc(&metrics.snapshot_failures);
                    error!("❌ Snapshot dropped: {}", e);
                }
            }
        });
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Wait up to `timeout` for queued snapshots to finish.
    /// Returns true when nothing is left in flight.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight() > 0 {
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        true
    }
}

pub fn snapshot_path(dir: &Path, event_type: &str, at: &DateTime<Local>) -> PathBuf {
    let safe: String = event_type
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.join(format!("{}_{}.jpg", safe, at.format("%Y%m%d_%H%M%S")))
}

fn write_snapshot(frame: &Frame, path: &Path, quality: u8) -> Result<()> {
    let jpeg = encode_rgb_to_jpeg(&frame.data, frame.width, frame.height, quality)?;
    std::fs::write(path, jpeg).map_err(|source| MonitorError::SnapshotWrite {
        path: path.display().to_string(),
        source,
    })
}

/// Encode raw RGB bytes into a JPEG.
fn encode_rgb_to_jpeg(rgb_data: &[u8], width: usize, height: usize, quality: u8) -> Result<Vec<u8>> {
    use image::{ImageBuffer, RgbImage};

    let expected_len = width * height * 3;
    if width == 0 || height == 0 || rgb_data.len() < expected_len {
        return Err(MonitorError::encode(format!(
            "frame {}x{} needs {} bytes, got {}",
            width,
            height,
            expected_len,
            rgb_data.len()
        )));
    }

    let img: RgbImage =
        ImageBuffer::from_raw(width as u32, height as u32, rgb_data[..expected_len].to_vec())
            .ok_or_else(|| MonitorError::encode("frame buffer does not match dimensions"))?;

    let mut buf = std::io::Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| MonitorError::encode(e.to_string()))?;

    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn frame(width: usize, height: usize) -> Arc<Frame> {
        Arc::new(Frame {
            data: vec![128u8; width * height * 3],
            width,
            height,
            timestamp_ms: 0.0,
        })
    }

    #[test]
    fn test_snapshot_path_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let path = snapshot_path(Path::new("snaps"), "LOITERING", &at);
        assert_eq!(path, PathBuf::from("snaps/LOITERING_20240309_140507.jpg"));
    }

    #[test]
    fn test_snapshot_path_sanitizes_event_type() {
        let at = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let path = snapshot_path(Path::new("s"), "../FIRE alarm", &at);
        assert_eq!(path, PathBuf::from("s/___FIRE_alarm_20240101_000000.jpg"));
    }

    #[test]
    fn test_encode_rejects_short_buffer() {
        let err = encode_rgb_to_jpeg(&[0u8; 10], 4, 4, 90).unwrap_err();
        assert!(matches!(err, MonitorError::ImageEncode(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_dispatch_writes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = PipelineMetrics::new();
        let dispatcher =
            SnapshotDispatcher::new(dir.path(), 80, Handle::current(), metrics.clone()).unwrap();

        dispatcher.dispatch(frame(32, 24), "FIRE");
        assert!(dispatcher.drain(Duration::from_secs(5)).await);

        assert_eq!(metrics.get(&metrics.snapshots_saved), 1);
        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().to_string_lossy().to_string();
        assert!(name.starts_with("FIRE_") && name.ends_with(".jpg"));
        let bytes = std::fs::read(files[0].path()).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_write_failure_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = PipelineMetrics::new();
        let snap_dir = dir.path().join("snaps");
        let dispatcher =
            SnapshotDispatcher::new(&snap_dir, 80, Handle::current(), metrics.clone()).unwrap();

        // Directory vanishes after startup
        std::fs::remove_dir_all(&snap_dir).unwrap();
        dispatcher.dispatch(frame(8, 8), "WEAPON");
        assert!(dispatcher.drain(Duration::from_secs(5)).await);

        assert_eq!(metrics.get(&metrics.snapshots_saved), 0);
        assert_eq!(metrics.get(&metrics.snapshot_failures), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_bad_frame_counts_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = PipelineMetrics::new();
        let dispatcher =
            SnapshotDispatcher::new(dir.path(), 80, Handle::current(), metrics.clone()).unwrap();

        let broken = Arc::new(Frame {
            data: vec![0u8; 5],
            width: 8,
            height: 8,
            timestamp_ms: 0.0,
        });
        dispatcher.dispatch(broken, "FIRE");
        assert!(dispatcher.drain(Duration::from_secs(5)).await);
        assert_eq!(metrics.get(&metrics.snapshot_failures), 1);
    }
}
