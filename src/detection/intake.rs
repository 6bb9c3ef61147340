// src/detection/intake.rs
//
// Turns raw per-frame detector output into validated detections and the
// externally sourced alert candidates (FIRE, WEAPON).
//
// Malformed entries are skipped one at a time; a frame is never dropped
// because of a single bad record.

use super::types::{ClassId, Detection, RawDetection};
use crate::alerts::{AlertCandidate, FIRE_EVENT, WEAPON_EVENT};
use crate::error::{MonitorError, Result};
use crate::types::DetectionConfig;
use tracing::debug;

#[derive(Debug, Default)]
pub struct ParsedDetections {
    pub detections: Vec<Detection>,
    pub malformed: usize,
}

pub fn validate(raw: RawDetection) -> Result<Detection> {
    if raw.bbox.len() != 4 {
        return Err(MonitorError::malformed(format!(
            "bbox has {} values, expected 4",
            raw.bbox.len()
        )));
    }
    if raw.bbox.iter().any(|v| !v.is_finite()) {
        return Err(MonitorError::malformed("bbox contains a non-finite value"));
    }
    if raw
        .bbox
        .iter()
        .any(|v| *v < i32::MIN as f64 || *v > i32::MAX as f64)
    {
        return Err(MonitorError::malformed(format!(
            "bbox {:?} outside pixel coordinate range",
            raw.bbox
        )));
    }
    let (x1, y1, x2, y2) = (raw.bbox[0], raw.bbox[1], raw.bbox[2], raw.bbox[3]);
    if x2 < x1 || y2 < y1 {
        return Err(MonitorError::malformed(format!(
            "inverted bbox [{}, {}, {}, {}]",
            x1, y1, x2, y2
        )));
    }

    let track_id = match raw.track_id {
        None => None,
        Some(id) => Some(
            u32::try_from(id)
                .map_err(|_| MonitorError::malformed(format!("track_id {} out of range", id)))?,
        ),
    };

    Ok(Detection {
        class_id: raw.class_id,
        bbox: [x1 as f32, y1 as f32, x2 as f32, y2 as f32],
        confidence: raw.conf,
        track_id,
    })
}

pub fn parse_detections(values: Vec<serde_json::Value>) -> ParsedDetections {
    let mut parsed = ParsedDetections::default();

    for value in values {
        let result = serde_json::from_value::<RawDetection>(value)
            .map_err(|e| MonitorError::malformed(e.to_string()))
            .and_then(validate);

        match result {
            Ok(det) => parsed.detections.push(det),
            Err(e) => {
                debug!("Skipping detection: {}", e);
                parsed.malformed += 1;
            }
        }
    }

    parsed
}

/// Fire regions, minus those centred on a person (skin and clothing
/// tones trip the color threshold).
pub fn fire_regions<'a>(detections: &'a [Detection], cfg: &DetectionConfig) -> Vec<&'a Detection> {
    let persons: Vec<&Detection> = detections
        .iter()
        .filter(|d| d.class_id == ClassId::Coco(cfg.person_class_id))
        .collect();

    detections
        .iter()
        .filter(|d| d.class_id.is_fire())
        .filter(|fire| {
            if !cfg.suppress_fire_on_persons {
                return true;
            }
            let (cx, cy) = fire.center();
            !persons.iter().any(|p| p.contains(cx, cy))
        })
        .collect()
}

/// FIRE and WEAPON candidates for this frame. At most one FIRE candidate;
/// one WEAPON candidate per weapon detection (the gate collapses them).
pub fn external_alerts(detections: &[Detection], cfg: &DetectionConfig) -> Vec<AlertCandidate> {
    let mut candidates = Vec::new();

    if !fire_regions(detections, cfg).is_empty() {
        candidates.push(AlertCandidate::new(
            FIRE_EVENT,
            "Fire detected via color analysis",
        ));
    }

    for det in detections {
        let Some(cid) = det.class_id.coco() else {
            continue;
        };
        if cfg.weapon_class_ids.contains(&cid) {
            let label = cfg
                .class_names
                .get(&cid)
                .map(String::as_str)
                .unwrap_or("Weapon");
            candidates.push(AlertCandidate::new(
                WEAPON_EVENT,
                format!("{} detected", label),
            ));
        }
    }

    candidates
}
