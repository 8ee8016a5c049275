//! Defect detection seam.
//!
//! The object-detection model is an external capability: given a frame it
//! returns boxes above a confidence threshold, and given a frame plus a prior
//! result it returns an annotated frame. `Detector` is the narrow trait the
//! gate consumes; nothing in the core assumes a concrete inference library's
//! result shape beyond `Detections`.

mod stub;

pub use stub::{ScriptedDetector, StubDetector};

use anyhow::Result;
use std::collections::BTreeMap;

use crate::frame::Frame;

/// Confidence threshold applied inside detector backends; the core never
/// re-filters results.
pub const DEFAULT_CONF_THRESHOLD: f32 = 0.25;

/// One detection box in pixel coordinates.
#[derive(Clone, Debug)]
pub struct DetectedBox {
    pub class_id: u32,
    pub confidence: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Detection output: boxes plus the backend's class-id to raw-label table.
#[derive(Clone, Debug, Default)]
pub struct Detections {
    pub boxes: Vec<DetectedBox>,
    pub names: BTreeMap<u32, String>,
}

impl Detections {
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Raw label for a class id; falls back to a numeric label when the
    /// backend did not supply a name.
    pub fn label(&self, class_id: u32) -> String {
        self.names
            .get(&class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{class_id}"))
    }

    /// Append a box by raw label, interning the label into the name table.
    /// Convenience for stub backends and tests.
    pub fn push(&mut self, label: &str, confidence: f32, bbox: [f32; 4]) {
        let class_id = self
            .names
            .iter()
            .find(|(_, name)| name.as_str() == label)
            .map(|(id, _)| *id)
            .unwrap_or_else(|| {
                let id = self.names.keys().next_back().map_or(0, |id| id + 1);
                self.names.insert(id, label.to_string());
                id
            });
        self.boxes.push(DetectedBox {
            class_id,
            confidence,
            x1: bbox[0],
            y1: bbox[1],
            x2: bbox[2],
            y2: bbox[3],
        });
    }
}

/// Detector backend trait.
///
/// Implementations must be deterministic for identical input frames: Mark and
/// Save re-run detection against the cached frame and expect the same result
/// the triggering tick saw.
pub trait Detector: Send {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    /// Run detection on a frame. The threshold is the backend's concern.
    fn detect(&mut self, frame: &Frame) -> Result<Detections>;

    /// Draw the detection boxes onto a copy of the frame.
    fn annotate(&self, frame: &Frame, detections: &Detections) -> Frame {
        let mut annotated = frame.clone();
        for b in &detections.boxes {
            draw_box(&mut annotated, b);
        }
        annotated
    }
}

/// Fixed defect-class vocabulary -> operator-facing display label.
/// Unknown classes pass through their raw label unchanged.
pub fn display_label(raw: &str) -> &str {
    match raw {
        "damage" => "damage",
        "misplace" => "misplace",
        "rough" => "rough",
        "discard" => "discard",
        "lowandhigh" => "uneven height",
        "asymmetric" => "asymmetric",
        "scratch" => "scratch",
        other => other,
    }
}

const BOX_COLOR: [u8; 3] = [0, 255, 0];

fn draw_box(frame: &mut Frame, b: &DetectedBox) {
    let width = frame.width() as i64;
    let height = frame.height() as i64;
    let x1 = (b.x1 as i64).clamp(0, width.saturating_sub(1));
    let y1 = (b.y1 as i64).clamp(0, height.saturating_sub(1));
    let x2 = (b.x2 as i64).clamp(0, width.saturating_sub(1));
    let y2 = (b.y2 as i64).clamp(0, height.saturating_sub(1));

    for x in x1..=x2 {
        put_pixel(frame, x, y1);
        put_pixel(frame, x, y2);
    }
    for y in y1..=y2 {
        put_pixel(frame, x1, y);
        put_pixel(frame, x2, y);
    }
}

fn put_pixel(frame: &mut Frame, x: i64, y: i64) {
    let width = frame.width() as i64;
    let offset = ((y * width + x) * 3) as usize;
    let pixels = frame.pixels_mut();
    if offset + 2 < pixels.len() {
        pixels[offset..offset + 3].copy_from_slice(&BOX_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_interns_labels_once() {
        let mut d = Detections::default();
        d.push("scratch", 0.8, [0.0, 0.0, 4.0, 4.0]);
        d.push("damage", 0.6, [1.0, 1.0, 2.0, 2.0]);
        d.push("scratch", 0.9, [2.0, 2.0, 3.0, 3.0]);

        assert_eq!(d.boxes.len(), 3);
        assert_eq!(d.names.len(), 2);
        assert_eq!(d.boxes[0].class_id, d.boxes[2].class_id);
        assert_eq!(d.label(d.boxes[1].class_id), "damage");
    }

    #[test]
    fn unknown_class_labels_pass_through() {
        assert_eq!(display_label("lowandhigh"), "uneven height");
        assert_eq!(display_label("dent"), "dent");
    }

    #[test]
    fn annotate_does_not_touch_the_original() {
        let frame = Frame::solid(8, 8, [10, 10, 10]);
        let mut d = Detections::default();
        d.push("scratch", 0.9, [1.0, 1.0, 6.0, 6.0]);

        let detector = StubDetector::new();
        let annotated = detector.annotate(&frame, &d);

        assert_ne!(annotated.content_hash(), frame.content_hash());
        assert_eq!(frame, Frame::solid(8, 8, [10, 10, 10]));
    }
}
