// src/detection/mod.rs

mod intake;
mod types;

pub use intake::{external_alerts, fire_regions, parse_detections, validate, ParsedDetections};
pub use types::{ClassId, Detection, FrameRecord, RawDetection};
