// src/video_processor.rs
//
// Frame source for live runs: a video file or a camera index.
// Only built with the `opencv` feature.

use crate::error::{MonitorError, Result};
use crate::types::Frame;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTraitConst},
};
use tracing::info;

pub struct VideoSource {
    cap: VideoCapture,
    pub fps: f64,
    pub width: i32,
    pub height: i32,
    pub current_frame: u64,
}

impl VideoSource {
    /// `source` is either a camera index ("0") or a file path.
    pub fn open(source: &str) -> Result<Self> {
        let cap = match source.parse::<i32>() {
            Ok(index) => {
                info!("Opening camera {}", index);
                VideoCapture::new(index, videoio::CAP_ANY)?
            }
            Err(_) => {
                info!("Opening video: {}", source);
                VideoCapture::from_file(source, videoio::CAP_ANY)?
            }
        };

        if !cap.is_opened()? {
            return Err(MonitorError::config(format!(
                "could not open video source {}",
                source
            )));
        }

        let fps = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FPS)?;
        let width = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_HEIGHT)? as i32;

        info!("Video properties: {}x{} @ {:.1} FPS", width, height, fps);

        Ok(Self {
            cap,
            fps: if fps > 0.0 { fps } else { 30.0 },
            width,
            height,
            current_frame: 0,
        })
    }

    /// Next frame as (BGR mat for display, RGB frame for snapshots).
    /// `None` when the stream ends.
    pub fn read_frame(&mut self) -> Result<Option<(Mat, Frame)>> {
        use opencv::videoio::VideoCaptureTrait;

        let mut mat = Mat::default();
        if !VideoCaptureTrait::read(&mut self.cap, &mut mat)? || mat.empty() {
            return Ok(None);
        }

        self.current_frame += 1;
        let timestamp_ms = (self.current_frame as f64 / self.fps) * 1000.0;

        let mut rgb_mat = Mat::default();
        imgproc::cvt_color(&mat, &mut rgb_mat, imgproc::COLOR_BGR2RGB, 0)?;

        let frame = Frame {
            data: rgb_mat.data_bytes()?.to_vec(),
            width: mat.cols() as usize,
            height: mat.rows() as usize,
            timestamp_ms,
        };

        Ok(Some((mat, frame)))
    }
}
