// src/pipeline/orchestrator.rs
//
// Per-frame driver. Single entry point: process_frame() (or
// process_record() for raw detector output), one frame at a time.
//
//   detections → TrackHistoryStore.update → ActivityClassifier.analyze
//              → candidates (FIRE, WEAPON, activity labels)
//              → AlertGate.try_trigger → notify + snapshot + event
//
// The clock is sampled once per frame; every component sees the same
// timestamp for that frame.

use super::event_bus::{EventBus, PipelineEvent};
use super::frame_context::{AcceptedAlert, FrameContext};
use super::metrics::PipelineMetrics;
use crate::alerts::{AlertCandidate, AlertGate, SnapshotDispatcher};
use crate::analysis::{flatten, ActivityClassifier, TrackHistoryStore};
use crate::clock::Clock;
use crate::detection::{external_alerts, parse_detections, Detection, FrameRecord};
use crate::types::{Config, DetectionConfig, Frame};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

const MAX_PENDING_EVENTS: usize = 256;

pub struct MonitorPipeline {
    store: TrackHistoryStore,
    classifier: ActivityClassifier,
    gate: Arc<AlertGate>,
    dispatcher: SnapshotDispatcher,
    clock: Arc<dyn Clock>,
    detection_config: DetectionConfig,
    bus: EventBus,
    metrics: PipelineMetrics,
}

impl MonitorPipeline {
    pub fn new(
        config: &Config,
        clock: Arc<dyn Clock>,
        dispatcher: SnapshotDispatcher,
        metrics: PipelineMetrics,
    ) -> Self {
        Self {
            store: TrackHistoryStore::new(&config.tracking),
            classifier: ActivityClassifier::new(config.activity.clone()),
            gate: Arc::new(AlertGate::new(config.alerts.cooldown_seconds)),
            dispatcher,
            clock,
            detection_config: config.detection.clone(),
            bus: EventBus::new(MAX_PENDING_EVENTS),
            metrics,
        }
    }

    /// Parse raw detector output, skipping malformed entries, then process.
    pub fn process_record(&mut self, record: FrameRecord, frame: Arc<Frame>) -> FrameContext {
        let parsed = parse_detections(record.detections);
        if parsed.malformed > 0 {
            warn!(
                "Frame {}: skipped {} malformed detection(s)",
                record.frame_id, parsed.malformed
            );
            self.metrics
                .add(&self.metrics.malformed_detections, parsed.malformed as u64);
            self.bus.publish(PipelineEvent::MalformedDetections {
                frame_id: record.frame_id,
                count: parsed.malformed,
            });
        }
        self.process_frame(record.frame_id, frame, parsed.detections)
    }

    pub fn process_frame(
        &mut self,
        frame_id: u64,
        frame: Arc<Frame>,
        detections: Vec<Detection>,
    ) -> FrameContext {
        let started = Instant::now();
        let now_ms = self.clock.now_ms();
        let mut ctx = FrameContext::new(frame_id, now_ms, frame);

        // 1. History
        let tracked = detections.iter().filter(|d| d.track_id.is_some()).count();
        ctx.evicted_tracks = self.store.update(&detections, now_ms);
        ctx.active_tracks = self.store.len();
        for &track_id in &ctx.evicted_tracks {
            self.bus.publish(PipelineEvent::TrackEvicted {
                track_id,
                timestamp_ms: now_ms,
            });
        }

        // 2. Behavior
        ctx.activities = flatten(&self.classifier.analyze(&self.store));

        // 3. Candidates, in priority order
        let mut candidates = external_alerts(&detections, &self.detection_config);
        candidates.extend(ctx.activities.iter().map(|a| {
            AlertCandidate::new(a.label.event_type(), format!("Track ID {}", a.track_id))
        }));

        // 4. Gate
        for candidate in candidates {
            if !self.gate.try_trigger(&candidate.event_type, now_ms) {
                ctx.suppressed_alerts += 1;
                continue;
            }

            warn!(
                "🚨 [ALERT] Detected: {} - {} (frame {}, t={:.2}s)",
                candidate.event_type,
                candidate.details,
                frame_id,
                now_ms / 1000.0
            );
            self.dispatcher
                .dispatch(ctx.frame.clone(), &candidate.event_type);

            let alert = AcceptedAlert {
                event_type: candidate.event_type,
                details: candidate.details,
                frame_id,
                timestamp_ms: now_ms,
                frame: ctx.frame.clone(),
            };
            self.bus.publish(PipelineEvent::AlertAccepted(alert.clone()));
            ctx.accepted_alerts.push(alert);
        }

        let m = &self.metrics;
        m.inc(&m.total_frames);
        m.add(&m.tracked_detections, tracked as u64);
        m.add(&m.tracks_evicted, ctx.evicted_tracks.len() as u64);
        m.add(&m.activities_detected, ctx.activities.len() as u64);
        m.add(&m.alerts_accepted, ctx.accepted_alerts.len() as u64);
        m.add(&m.alerts_suppressed, ctx.suppressed_alerts as u64);
        m.set(&m.active_tracks, ctx.active_tracks as u64);
        m.set(&m.frame_time_us, started.elapsed().as_micros() as u64);

        debug!(
            "Frame {}: {} dets, {} tracks, {} activities, {} alerts ({} suppressed)",
            frame_id,
            detections.len(),
            ctx.active_tracks,
            ctx.activities.len(),
            ctx.accepted_alerts.len(),
            ctx.suppressed_alerts
        );

        ctx.detections = detections;
        ctx
    }

    pub fn drain_events(&mut self) -> Vec<PipelineEvent> {
        self.bus.drain()
    }

    /// Shared handle for callers outside the ingestion loop.
    pub fn gate(&self) -> Arc<AlertGate> {
        self.gate.clone()
    }

    pub fn dispatcher(&self) -> &SnapshotDispatcher {
        &self.dispatcher
    }

    pub fn store(&self) -> &TrackHistoryStore {
        &self.store
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{FIRE_EVENT, LOITERING_EVENT, RUNNING_EVENT, WEAPON_EVENT};
    use crate::analysis::ActivityLabel;
    use crate::clock::ManualClock;
    use crate::detection::ClassId;
    use serde_json::json;
    use std::time::Duration;
    use tokio::runtime::Handle;

    struct Harness {
        pipeline: MonitorPipeline,
        clock: Arc<ManualClock>,
        frame: Arc<Frame>,
        _dir: tempfile::TempDir,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut config = Config::default();
            config.alerts.snapshot_dir = dir.path().join("snaps").display().to_string();

            let metrics = PipelineMetrics::new();
            let dispatcher = SnapshotDispatcher::new(
                &config.alerts.snapshot_dir,
                80,
                Handle::current(),
                metrics.clone(),
            )
            .unwrap();
            let clock = Arc::new(ManualClock::new(0.0));
            let pipeline = MonitorPipeline::new(&config, clock.clone(), dispatcher, metrics);

            Self {
                pipeline,
                clock,
                frame: Arc::new(Frame::blank(16, 12, 0.0)),
                _dir: dir,
            }
        }

        fn step(&mut self, frame_id: u64, t_ms: f64, dets: Vec<Detection>) -> FrameContext {
            self.clock.set(t_ms);
            self.pipeline
                .process_frame(frame_id, self.frame.clone(), dets)
        }
    }

    fn person(track_id: u32, x: i32, y: i32) -> Detection {
        Detection {
            class_id: ClassId::Coco(0),
            bbox: [
                (x - 20) as f32,
                (y - 50) as f32,
                (x + 20) as f32,
                (y + 50) as f32,
            ],
            confidence: 0.9,
            track_id: Some(track_id),
        }
    }

    const JITTER: [(i32, i32); 8] = [
        (0, 0),
        (5, 3),
        (-6, 4),
        (8, -5),
        (-3, -9),
        (10, 2),
        (-7, -7),
        (2, 11),
    ];

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_loitering_scenario_end_to_end() {
        let mut h = Harness::new();
        let mut accepted_at: Vec<f64> = Vec::new();
        let mut saw_loitering = false;

        // Track 7 hovers around (100,100): every 500ms up to t=5s (dwell
        // not yet over threshold), then sparser reports through t=11s.
        let mut times: Vec<f64> = (0..=10).map(|i| i as f64 * 500.0).collect();
        times.extend([6000.0, 6500.0, 8000.0, 9500.0, 11000.0]);

        for (i, &t_ms) in times.iter().enumerate() {
            let (dx, dy) = JITTER[i % JITTER.len()];
            let ctx = h.step(i as u64, t_ms, vec![person(7, 100 + dx, 100 + dy)]);

            if ctx
                .activities
                .iter()
                .any(|a| a.track_id == 7 && a.label == ActivityLabel::Loitering)
            {
                saw_loitering = true;
            }
            assert!(!ctx.accepted(RUNNING_EVENT), "jitter must not read as running");
            if ctx.accepted(LOITERING_EVENT) {
                accepted_at.push(t_ms);
            }
            if t_ms == 6500.0 {
                assert!(ctx.suppressed_alerts >= 1, "duplicate at 6.5s must be suppressed");
            }
        }

        assert!(saw_loitering);
        // First eligible at 6s (dwell > 5s), next once the 5s cooldown lapses
        assert_eq!(accepted_at, vec![6000.0, 11000.0]);

        let events = h.pipeline.drain_events();
        let alerts = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::AlertAccepted(_)))
            .count();
        assert_eq!(alerts, 2);

        assert!(h
            .pipeline
            .dispatcher()
            .drain(Duration::from_secs(5))
            .await);
        let m = h.pipeline.metrics();
        assert_eq!(m.get(&m.snapshots_saved), 2);
        assert_eq!(m.get(&m.alerts_accepted), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_fire_and_weapon_share_frame_but_not_cooldown() {
        let mut h = Harness::new();
        let fire = Detection {
            class_id: ClassId::Named("fire".into()),
            bbox: [300.0, 300.0, 340.0, 340.0],
            confidence: 1.0,
            track_id: None,
        };
        let knife = Detection {
            class_id: ClassId::Coco(43),
            bbox: [10.0, 10.0, 20.0, 30.0],
            confidence: 0.7,
            track_id: None,
        };

        let ctx = h.step(1, 0.0, vec![fire.clone(), knife.clone()]);
        assert!(ctx.accepted(FIRE_EVENT));
        assert!(ctx.accepted(WEAPON_EVENT));
        assert_eq!(ctx.accepted_alerts[1].details, "Knife detected");

        let ctx = h.step(2, 1000.0, vec![fire.clone(), knife]);
        assert!(!ctx.has_alerts());
        assert_eq!(ctx.suppressed_alerts, 2);

        let ctx = h.step(3, 5000.0, vec![fire]);
        assert!(ctx.accepted(FIRE_EVENT));
        h.pipeline.dispatcher().drain(Duration::from_secs(5)).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_malformed_entries_skipped_frame_still_processed() {
        let mut h = Harness::new();
        let record: FrameRecord = serde_json::from_value(json!({
            "frame_id": 4,
            "timestamp_ms": 0.0,
            "detections": [
                {"class_id": 0, "bbox": [0, 0, 40, 100], "conf": 0.9, "track_id": 1},
                {"class_id": 0, "bbox": "nope", "track_id": 2},
                {"class_id": 0, "conf": 0.3}
            ]
        }))
        .unwrap();

        h.clock.set(0.0);
        let frame = h.frame.clone();
        let ctx = h.pipeline.process_record(record, frame);
        assert_eq!(ctx.detections.len(), 1);
        assert_eq!(ctx.active_tracks, 1);

        let m = h.pipeline.metrics();
        assert_eq!(m.get(&m.malformed_detections), 2);
        let events = h.pipeline.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            PipelineEvent::MalformedDetections { frame_id: 4, count: 2 }
        )));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_evicted_track_published() {
        let mut h = Harness::new();
        h.step(1, 0.0, vec![person(3, 50, 50)]);
        let ctx = h.step(2, 6000.0, vec![person(4, 200, 200)]);
        assert_eq!(ctx.evicted_tracks, vec![3]);
        assert_eq!(ctx.active_tracks, 1);
        assert!(h
            .pipeline
            .drain_events()
            .iter()
            .any(|e| matches!(e, PipelineEvent::TrackEvicted { track_id: 3, .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_background_caller_shares_gate() {
        let mut h = Harness::new();
        let gate = h.pipeline.gate();
        let other = std::thread::spawn(move || gate.try_trigger(RUNNING_EVENT, 0.0));
        assert!(other.join().unwrap());

        // A sprinter at t≈0.5s: the gate already fired for RUNNING at t=0
        for i in 0..10u64 {
            let x = if i == 9 { 400 } else { 0 };
            let ctx = h.step(i, i as f64 * 50.0, vec![person(8, x, 0)]);
            if i == 9 {
                assert!(ctx
                    .activities
                    .iter()
                    .any(|a| a.label == ActivityLabel::Running));
                assert!(!ctx.accepted(RUNNING_EVENT));
            }
        }
    }
}
