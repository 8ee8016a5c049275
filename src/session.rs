//! Process-wide inspection session state.

use std::collections::BTreeMap;

use crate::aggregate::DefectSummary;

/// Mutable session state for one app lifetime. Owned by the gate; operator
/// actions observe and mutate it through the gate's lock.
#[derive(Debug, Default)]
pub struct Session {
    /// Whether the polling timer is driving ticks.
    pub running: bool,
    /// Slot 0 is a looping video file; slots 1..3 are inert and defects
    /// never halt the feed.
    pub video_mode: bool,
    /// Latch: set by the first halting tick, cleared only by Continue.
    pub defect_detected: bool,
    /// Slot ids that flagged in the triggering tick, in scan order (0..3).
    pub flagged_slots: Vec<usize>,
    /// Per-slot defect breakdown for the triggering tick.
    pub summaries: BTreeMap<usize, DefectSummary>,
}

impl Session {
    /// Clear the latch and all per-cycle defect bookkeeping.
    pub fn clear_defects(&mut self) {
        self.defect_detected = false;
        self.flagged_slots.clear();
        self.summaries.clear();
    }

    /// Reset for a fresh run.
    pub fn begin_run(&mut self, video_mode: bool) {
        self.running = true;
        self.video_mode = video_mode;
        self.clear_defects();
    }

    /// Full stop.
    pub fn end_run(&mut self) {
        self.running = false;
        self.video_mode = false;
        self.clear_defects();
    }
}
