// src/lib.rs

pub mod alerts;
pub mod analysis;
pub mod clock;
pub mod config;
pub mod detection;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod types;

#[cfg(feature = "opencv")]
pub mod overlay;
#[cfg(feature = "opencv")]
pub mod video_processor;
