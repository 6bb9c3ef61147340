// src/analysis/mod.rs
//
// Signal flow:
//   Tracked detections → track_history → activity_classifier → ActivityMap
//
// The store owns every track record; the classifier only reads them.

pub mod activity_classifier;
pub mod track_history;

pub use activity_classifier::{
    flatten, ActivityClassifier, ActivityLabel, ActivityMap, ActivityResult,
};
pub use track_history::{TrackHistoryStore, TrackId, TrackRecord, TrackSample};
