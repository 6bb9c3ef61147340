// src/source.rs
//
// Detection stream reader. The external detector/tracker writes one JSON
// object per frame:
//
//   {"frame_id": 12, "timestamp_ms": 400.0,
//    "detections": [{"class_id": 0, "bbox": [x1,y1,x2,y2], "conf": 0.8, "track_id": 3}]}
//
// Lines that are not valid frame records are skipped with a warning.

use crate::detection::FrameRecord;
use crate::error::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

pub struct DetectionStream<R> {
    reader: R,
    fps: f64,
    line_no: u64,
    skipped_lines: u64,
}

impl DetectionStream<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>, fps: f64) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        info!("Reading detections from {}", path.display());
        Ok(Self::from_reader(BufReader::new(file), fps))
    }
}

impl<R: BufRead> DetectionStream<R> {
    pub fn from_reader(reader: R, fps: f64) -> Self {
        Self {
            reader,
            fps,
            line_no: 0,
            skipped_lines: 0,
        }
    }

    /// Next frame record, or `None` at end of stream.
    pub fn next_record(&mut self) -> Result<Option<FrameRecord>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<FrameRecord>(trimmed) {
                Ok(record) => return Ok(Some(record)),
                Err(e) => {
                    self.skipped_lines += 1;
                    warn!("Skipping line {}: {}", self.line_no, e);
                }
            }
        }
    }

    /// Record timestamp, or one derived from the frame number.
    pub fn timestamp_ms(&self, record: &FrameRecord) -> f64 {
        record
            .timestamp_ms
            .unwrap_or_else(|| (record.frame_id as f64 / self.fps) * 1000.0)
    }

    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_records_and_skips_bad_lines() {
        let input = concat!(
            "{\"frame_id\": 1, \"timestamp_ms\": 33.0, \"detections\": []}\n",
            "\n",
            "not json\n",
            "{\"frame_id\": 2, \"detections\": [{\"class_id\": 0, \"bbox\": [0,0,1,1]}]}\n",
        );
        let mut stream = DetectionStream::from_reader(Cursor::new(input), 30.0);

        let first = stream.next_record().unwrap().unwrap();
        assert_eq!(first.frame_id, 1);
        assert_eq!(stream.timestamp_ms(&first), 33.0);

        let second = stream.next_record().unwrap().unwrap();
        assert_eq!(second.frame_id, 2);
        assert_eq!(second.detections.len(), 1);
        assert!((stream.timestamp_ms(&second) - 66.666).abs() < 0.01);

        assert!(stream.next_record().unwrap().is_none());
        assert_eq!(stream.skipped_lines(), 1);
    }

    #[test]
    fn test_open_missing_file_errors() {
        assert!(DetectionStream::open("/definitely/not/here.jsonl", 30.0).is_err());
    }
}
