use serde::{Deserialize, Serialize};
use std::fmt;

/// Detector class: a COCO index from the object model, or a name for
/// heuristic sources such as the color-threshold fire detector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassId {
    Coco(u32),
    Named(String),
}

impl ClassId {
    pub fn is_fire(&self) -> bool {
        matches!(self, Self::Named(name) if name.eq_ignore_ascii_case("fire"))
    }

    pub fn coco(&self) -> Option<u32> {
        match self {
            Self::Coco(id) => Some(*id),
            Self::Named(_) => None,
        }
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coco(id) => write!(f, "{}", id),
            Self::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A validated detection for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_id: ClassId,
    pub bbox: [f32; 4], // [x1, y1, x2, y2] pixels
    pub confidence: f32,
    pub track_id: Option<u32>,
}

impl Detection {
    pub fn center(&self) -> (f32, f32) {
        (
            (self.bbox[0] + self.bbox[2]) * 0.5,
            (self.bbox[1] + self.bbox[3]) * 0.5,
        )
    }

    /// Integer pixel centroid used as a track position sample.
    pub fn centroid_px(&self) -> (i32, i32) {
        let (cx, cy) = self.center();
        (cx.floor() as i32, cy.floor() as i32)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.bbox[0] && x <= self.bbox[2] && y >= self.bbox[1] && y <= self.bbox[3]
    }
}

/// Detection as it arrives on the wire, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDetection {
    pub class_id: ClassId,
    pub bbox: Vec<f64>,
    #[serde(default, alias = "confidence")]
    pub conf: f32,
    #[serde(default)]
    pub track_id: Option<i64>,
}

/// One line of the detection stream.
#[derive(Debug, Clone, Deserialize)]
pub struct FrameRecord {
    pub frame_id: u64,
    #[serde(default)]
    pub timestamp_ms: Option<f64>,
    /// Kept as loose JSON so one bad entry does not reject the whole frame.
    #[serde(default)]
    pub detections: Vec<serde_json::Value>,
}
