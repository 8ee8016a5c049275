//! Stub detector backends.

use anyhow::Result;
use std::collections::HashMap;

use super::{Detections, Detector};
use crate::frame::Frame;

/// Detector that never reports a defect. Default backend for builds without
/// a model; the inspection loop runs end to end but never halts the line.
pub struct StubDetector;

impl StubDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StubDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Detections> {
        Ok(Detections::default())
    }
}

/// Deterministic detector keyed on frame content.
///
/// Tests register the exact detections a given frame should produce; any
/// unregistered frame yields an empty result. Re-running detection on the
/// same frame always returns the same answer, which is the contract Mark and
/// Save depend on.
pub struct ScriptedDetector {
    by_content: HashMap<[u8; 32], Detections>,
}

impl ScriptedDetector {
    pub fn new() -> Self {
        Self {
            by_content: HashMap::new(),
        }
    }

    /// Register the result for a frame's content.
    pub fn when(mut self, frame: &Frame, detections: Detections) -> Self {
        self.by_content.insert(frame.content_hash(), detections);
        self
    }
}

impl Default for ScriptedDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Detections> {
        Ok(self
            .by_content
            .get(&frame.content_hash())
            .cloned()
            .unwrap_or_default())
    }
}
