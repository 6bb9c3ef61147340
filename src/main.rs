// src/main.rs

use anyhow::{Context, Result};
use security_monitor::alerts::{EventLogger, SnapshotDispatcher};
use security_monitor::clock::{Clock, ManualClock, SystemClock};
use security_monitor::pipeline::{FrameContext, MonitorPipeline, PipelineEvent, PipelineMetrics};
use security_monitor::source::DetectionStream;
use security_monitor::types::{Config, Frame};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "opencv")]
use security_monitor::{overlay, video_processor::VideoSource};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path =
        std::env::var("MONITOR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = if Path::new(&config_path).exists() {
        Config::load(&config_path)
            .with_context(|| format!("failed to load configuration from {}", config_path))?
    } else {
        Config::default()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🛡️  Security Monitor Starting");
    if Path::new(&config_path).exists() {
        info!("✓ Configuration loaded from {}", config_path);
    } else {
        warn!("{} not found, using built-in defaults", config_path);
    }
    info!(
        "Thresholds: stationary={:.0}px, loiter={:.1}s, run={:.0}px/s, cooldown={:.1}s",
        config.activity.stationary_threshold_px,
        config.activity.loiter_time_threshold_seconds,
        config.activity.run_speed_threshold_px_per_sec,
        config.alerts.cooldown_seconds
    );

    let metrics = PipelineMetrics::new();
    let dispatcher = SnapshotDispatcher::new(
        &config.alerts.snapshot_dir,
        config.alerts.snapshot_jpeg_quality,
        Handle::current(),
        metrics.clone(),
    )
    .context("failed to prepare snapshot directory")?;
    let event_logger =
        EventLogger::new(&config.alerts.event_log_path).context("failed to open event log")?;

    let replay_clock = Arc::new(ManualClock::new(0.0));
    let clock: Arc<dyn Clock> = if config.source.use_wall_clock {
        info!("⏱️  Using wall-clock time");
        Arc::new(SystemClock::new())
    } else {
        replay_clock.clone()
    };

    let mut pipeline = MonitorPipeline::new(&config, clock, dispatcher, metrics.clone());
    let mut stream = DetectionStream::open(&config.source.detections_path, config.source.fps)
        .with_context(|| {
            format!(
                "failed to open detection stream {}",
                config.source.detections_path
            )
        })?;

    #[cfg(feature = "opencv")]
    let mut video = match config.source.video.as_deref() {
        Some(source) => Some(VideoSource::open(source)?),
        None => None,
    };
    #[cfg(not(feature = "opencv"))]
    if let Some(source) = &config.source.video {
        warn!(
            "Video source {} ignored: built without the `opencv` feature",
            source
        );
    }

    let blank = Arc::new(Frame::blank(
        config.source.frame_width,
        config.source.frame_height,
        0.0,
    ));

    while let Some(record) = stream.next_record()? {
        let timestamp_ms = stream.timestamp_ms(&record);
        replay_clock.set(timestamp_ms);

        #[cfg(feature = "opencv")]
        let (frame, mut display) = match video.as_mut() {
            Some(src) => match src.read_frame()? {
                Some((mat, frame)) => (Arc::new(frame), Some(mat)),
                None => {
                    info!("Video ended at frame {}", record.frame_id);
                    break;
                }
            },
            None => (blank.clone(), None),
        };
        #[cfg(not(feature = "opencv"))]
        let frame = blank.clone();

        let ctx = pipeline.process_record(record, frame);
        report_frame(&ctx);

        for event in pipeline.drain_events() {
            match event {
                PipelineEvent::AlertAccepted(alert) => {
                    if let Err(e) = event_logger.log(&alert.event_type, &alert.details) {
                        error!("Failed to write event log: {}", e);
                    }
                }
                PipelineEvent::TrackEvicted {
                    track_id,
                    timestamp_ms,
                } => {
                    debug!("Track {} evicted at {:.0}ms", track_id, timestamp_ms);
                }
                PipelineEvent::MalformedDetections { frame_id, count } => {
                    debug!("Frame {}: {} malformed detection(s)", frame_id, count);
                }
            }
        }

        #[cfg(feature = "opencv")]
        if let Some(mat) = display.as_mut() {
            use opencv::highgui;

            overlay::draw_detections(mat, &ctx.detections, &config.detection.class_names)?;
            overlay::draw_activities(mat, &ctx.activities)?;
            highgui::imshow("Security Monitor", mat)?;
            if highgui::wait_key(1)? == 'q' as i32 {
                info!("Quit requested");
                break;
            }
        }
    }

    if stream.skipped_lines() > 0 {
        warn!("Skipped {} unreadable line(s)", stream.skipped_lines());
    }

    let drain_timeout = Duration::from_secs_f64(config.alerts.shutdown_drain_seconds.max(0.0));
    if !pipeline.dispatcher().drain(drain_timeout).await {
        warn!(
            "{} snapshot(s) still pending after {:.1}s",
            pipeline.dispatcher().in_flight(),
            drain_timeout.as_secs_f64()
        );
    }

    let summary = metrics.summary();
    info!("\n========================================");
    info!("✓ Stream processed");
    info!("  Frames: {} ({:.1} FPS)", summary.total_frames, summary.fps);
    info!("  Tracks evicted: {}", summary.tracks_evicted);
    info!(
        "  Alerts: {} accepted, {} suppressed",
        summary.alerts_accepted, summary.alerts_suppressed
    );
    info!(
        "  Snapshots: {} saved, {} failed",
        summary.snapshots_saved, summary.snapshot_failures
    );
    info!("========================================\n");

    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

fn report_frame(ctx: &FrameContext) {
    if ctx.frame_id % 150 == 0 {
        info!(
            "Frame {}: {} active track(s), {} detection(s)",
            ctx.frame_id,
            ctx.active_tracks,
            ctx.detections.len()
        );
    }
    for activity in &ctx.activities {
        debug!(
            "Track {}: {} ({:.2})",
            activity.track_id,
            activity.label.as_str(),
            activity.confidence
        );
    }
}
