//! Defect aggregation and operator-facing summaries.
//!
//! `summarize` folds one slot's detections into per-class stats, preserving
//! first-encountered order (not alphabetical, not by confidence). `combine`
//! renders the cross-slot message shown when the line halts.

use std::collections::BTreeMap;

use crate::detect::{display_label, Detections};

const DIVIDER_WIDTH: usize = 30;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClassStats {
    pub count: u32,
    pub max_confidence: f32,
}

/// Per-slot defect breakdown: display label -> stats, in scan order.
#[derive(Clone, Debug, Default)]
pub struct DefectSummary {
    entries: Vec<(String, ClassStats)>,
}

impl DefectSummary {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, ClassStats)] {
        &self.entries
    }

    /// Bullet list, one line per defect class.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(label, stats)| {
                format!(
                    "• {}: {} (confidence: {:.2})",
                    label, stats.count, stats.max_confidence
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn record(&mut self, label: &str, confidence: f32) {
        if let Some((_, stats)) = self.entries.iter_mut().find(|(l, _)| l == label) {
            stats.count += 1;
            if confidence > stats.max_confidence {
                stats.max_confidence = confidence;
            }
        } else {
            self.entries.push((
                label.to_string(),
                ClassStats {
                    count: 1,
                    max_confidence: confidence,
                },
            ));
        }
    }
}

/// Group one slot's detections by display label.
pub fn summarize(detections: &Detections) -> DefectSummary {
    let mut summary = DefectSummary::default();
    for b in &detections.boxes {
        let raw = detections.label(b.class_id);
        summary.record(display_label(&raw), b.confidence);
    }
    summary
}

/// Render the halting-tick message across all flagged slots.
///
/// Slots are named 1-based for the operator. `flagged` carries the triggering
/// tick's scan order, which is ascending slot id.
pub fn combine(flagged: &[usize], summaries: &BTreeMap<usize, DefectSummary>) -> String {
    if flagged.is_empty() {
        return "No defect detected".to_string();
    }

    if let [slot] = flagged {
        let body = summaries
            .get(slot)
            .map(DefectSummary::render)
            .unwrap_or_default();
        return format!(
            "Camera {} detected a defect!\n\nDetected defect types:\n{}",
            slot + 1,
            body
        );
    }

    let mut message = format!(
        "{} cameras detected defects at the same time!\n\n",
        flagged.len()
    );
    for (i, slot) in flagged.iter().enumerate() {
        let body = summaries
            .get(slot)
            .map(DefectSummary::render)
            .unwrap_or_default();
        message.push_str(&format!("Camera {}:\n{}", slot + 1, body));
        if i + 1 < flagged.len() {
            message.push_str(&format!("\n{}\n", "-".repeat(DIVIDER_WIDTH)));
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detections(entries: &[(&str, f32)]) -> Detections {
        let mut d = Detections::default();
        for (label, conf) in entries {
            d.push(label, *conf, [0.0, 0.0, 10.0, 10.0]);
        }
        d
    }

    #[test]
    fn summary_preserves_first_encountered_order() {
        let d = detections(&[("scratch", 0.5), ("damage", 0.9), ("scratch", 0.7)]);
        let summary = summarize(&d);

        let labels: Vec<_> = summary.entries().iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["scratch", "damage"]);

        let (_, scratch) = &summary.entries()[0];
        assert_eq!(scratch.count, 2);
        assert!((scratch.max_confidence - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn summary_maps_vocabulary_to_display_labels() {
        let d = detections(&[("lowandhigh", 0.4), ("dent", 0.6)]);
        let rendered = summarize(&d).render();

        assert!(rendered.contains("• uneven height: 1 (confidence: 0.40)"));
        assert!(rendered.contains("• dent: 1 (confidence: 0.60)"));
    }

    #[test]
    fn single_slot_message_uses_one_based_camera_numbers() {
        let mut summaries = BTreeMap::new();
        summaries.insert(2usize, summarize(&detections(&[("scratch", 0.81)])));

        let message = combine(&[2], &summaries);
        assert!(message.starts_with("Camera 3 detected a defect!"));
        assert!(message.contains("• scratch: 1 (confidence: 0.81)"));
    }

    #[test]
    fn multi_slot_message_lists_slots_in_flag_order() {
        let mut summaries = BTreeMap::new();
        summaries.insert(0usize, summarize(&detections(&[("damage", 0.9)])));
        summaries.insert(3usize, summarize(&detections(&[("rough", 0.3)])));

        let message = combine(&[0, 3], &summaries);
        assert!(message.starts_with("2 cameras detected defects at the same time!"));
        let camera1 = message.find("Camera 1:").expect("camera 1 section");
        let camera4 = message.find("Camera 4:").expect("camera 4 section");
        assert!(camera1 < camera4);
        assert!(message.contains(&"-".repeat(30)));
    }
}
