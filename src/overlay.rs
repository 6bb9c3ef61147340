// src/overlay.rs
//
// On-screen annotation: detection boxes plus one warning line per active
// behavior label. Only built with the `opencv` feature.

use crate::analysis::ActivityResult;
use crate::detection::Detection;
use crate::error::Result;
use opencv::{core, imgproc, prelude::*};
use std::collections::HashMap;

fn red() -> core::Scalar {
    core::Scalar::new(0.0, 0.0, 255.0, 0.0)
}

fn green() -> core::Scalar {
    core::Scalar::new(0.0, 255.0, 0.0, 0.0)
}

pub fn draw_detections(
    frame: &mut Mat,
    detections: &[Detection],
    class_names: &HashMap<u32, String>,
) -> Result<()> {
    for det in detections {
        let (label, color) = if det.class_id.is_fire() {
            (format!("FIRE {:.2}", det.confidence), red())
        } else {
            let name = det
                .class_id
                .coco()
                .and_then(|cid| class_names.get(&cid).cloned())
                .unwrap_or_else(|| format!("ID {}", det.class_id));
            let mut label = format!("{} {:.2}", name, det.confidence);
            if let Some(tid) = det.track_id {
                label.push_str(&format!(" ID:{}", tid));
            }
            (label, green())
        };

        let [x1, y1, x2, y2] = det.bbox;
        imgproc::rectangle(
            frame,
            core::Rect::new(x1 as i32, y1 as i32, (x2 - x1) as i32, (y2 - y1) as i32),
            color,
            2,
            imgproc::LINE_8,
            0,
        )?;
        imgproc::put_text(
            frame,
            &label,
            core::Point::new(x1 as i32, y1 as i32 - 10),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.5,
            color,
            2,
            imgproc::LINE_8,
            false,
        )?;
    }
    Ok(())
}

pub fn draw_activities(frame: &mut Mat, activities: &[ActivityResult]) -> Result<()> {
    let mut y = 30;
    for act in activities {
        let text = format!(
            "WARNING: {} - ID {}",
            act.label.as_str().to_uppercase(),
            act.track_id
        );
        imgproc::put_text(
            frame,
            &text,
            core::Point::new(10, y),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.7,
            red(),
            2,
            imgproc::LINE_8,
            false,
        )?;
        y += 30;
    }
    Ok(())
}
