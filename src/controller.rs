//! Operator action controller.
//!
//! Exposes the operator verbs (start, stop, mark, save, continue,
//! select-video) over a shared gate. Every verb enforces its own
//! precondition against the gate state, regardless of whether a UI element
//! also encodes it: a disabled verb is an explicit error, never undefined
//! behavior. The lone exception is Save with nothing to save, which the
//! product treats as an operator warning.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::gate::{DetectionGate, GateState};
use crate::source::SLOT_COUNT;
use crate::storage;
use crate::ui::MessageKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    Mark,
    Save,
    Continue,
    SelectVideo,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Start,
        Action::Stop,
        Action::Mark,
        Action::Save,
        Action::Continue,
        Action::SelectVideo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Mark => "mark",
            Action::Save => "save",
            Action::Continue => "continue",
            Action::SelectVideo => "select-video",
        }
    }
}

/// Whether an action is available in a gate state.
pub fn action_enabled(state: GateState, action: Action) -> bool {
    match state {
        GateState::Idle => matches!(action, Action::Start | Action::SelectVideo),
        GateState::Scanning => matches!(action, Action::Stop | Action::SelectVideo),
        GateState::Halted => matches!(
            action,
            Action::Stop | Action::Mark | Action::Save | Action::Continue | Action::SelectVideo
        ),
        GateState::VideoScanning => matches!(
            action,
            Action::Stop | Action::Mark | Action::Save | Action::SelectVideo
        ),
    }
}

/// Outcome of a Save action.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SaveReport {
    /// Paths actually written, in slot order.
    pub written: Vec<PathBuf>,
    /// 1-based camera numbers that were written.
    pub cameras: Vec<usize>,
}

#[derive(Clone)]
pub struct ActionController {
    gate: Arc<Mutex<DetectionGate>>,
    save_root: PathBuf,
}

impl ActionController {
    pub fn new(gate: Arc<Mutex<DetectionGate>>, save_root: impl Into<PathBuf>) -> Self {
        Self {
            gate,
            save_root: save_root.into(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DetectionGate> {
        self.gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_enabled(gate: &DetectionGate, action: Action) -> Result<()> {
        let state = gate.state();
        if !action_enabled(state, action) {
            bail!(
                "action '{}' is not available in state {:?}",
                action.name(),
                state
            );
        }
        Ok(())
    }

    /// Drive one polling cycle. Called by the scheduler.
    pub fn tick(&self) -> Result<()> {
        self.lock().tick()
    }

    pub fn state(&self) -> GateState {
        self.lock().state()
    }

    pub fn start(&self) -> Result<()> {
        let mut gate = self.lock();
        Self::ensure_enabled(&gate, Action::Start)?;
        if let Err(e) = gate.start() {
            gate.presenter()
                .show_message(MessageKind::Error, &format!("{e:#}"));
            return Err(e);
        }
        Ok(())
    }

    pub fn stop(&self) -> Result<()> {
        let mut gate = self.lock();
        Self::ensure_enabled(&gate, Action::Stop)?;
        gate.stop();
        Ok(())
    }

    pub fn continue_detection(&self) -> Result<()> {
        let mut gate = self.lock();
        Self::ensure_enabled(&gate, Action::Continue)?;
        gate.continue_scan()
    }

    pub fn select_video(&self, path: &Path) -> Result<()> {
        let mut gate = self.lock();
        Self::ensure_enabled(&gate, Action::SelectVideo)?;
        if let Err(e) = gate.select_video(path) {
            gate.presenter()
                .show_message(MessageKind::Error, &format!("{e:#}"));
            return Err(e);
        }
        Ok(())
    }

    /// Re-evaluate cached frames and display annotations for slots whose
    /// re-detection still finds a defect; clean frames display plain.
    pub fn mark(&self) -> Result<()> {
        let mut gate = self.lock();
        Self::ensure_enabled(&gate, Action::Mark)?;

        let video = gate.session().video_mode;
        let eligible = if video { 1 } else { SLOT_COUNT };
        for id in 0..eligible {
            if !video && !gate.slot(id).is_open() {
                continue;
            }
            let Some((frame, detections)) = gate.detect_cached(id)? else {
                continue;
            };
            if detections.is_empty() {
                gate.presenter().show_frame(id, &frame);
            } else {
                let marked = gate.annotate(&frame, &detections);
                gate.presenter().show_frame(id, &marked);
            }
        }
        Ok(())
    }

    /// Persist annotated frames for the flagged slots (or slot 0 in video
    /// mode) under `defects/<YYYYMMDD>/`.
    pub fn save(&self) -> Result<SaveReport> {
        let mut gate = self.lock();
        Self::ensure_enabled(&gate, Action::Save)?;

        let mut report = SaveReport::default();
        if gate.session().video_mode {
            match Self::save_slot(&mut gate, &self.save_root, 0, "video")? {
                Some(path) => {
                    report.written.push(path);
                    report.cameras.push(1);
                    gate.presenter().show_message(
                        MessageKind::Info,
                        &format!(
                            "Saved the video frame defect image to {}",
                            storage::dated_dir(&self.save_root).display()
                        ),
                    );
                }
                None => {
                    gate.presenter().show_message(
                        MessageKind::Warning,
                        "No frame available, nothing was saved",
                    );
                    log::warn!("save skipped: no cached frame in video mode");
                }
            }
            return Ok(report);
        }

        let flagged = gate.session().flagged_slots.clone();
        if !gate.session().defect_detected || flagged.is_empty() {
            gate.presenter().show_message(
                MessageKind::Warning,
                "No defect detected, the image was not saved",
            );
            log::warn!("save skipped: no defect context");
            return Ok(report);
        }

        for id in flagged {
            let prefix = format!("camera_{}", id + 1);
            if let Some(path) = Self::save_slot(&mut gate, &self.save_root, id, &prefix)? {
                report.written.push(path);
                report.cameras.push(id + 1);
            }
        }

        if report.cameras.is_empty() {
            gate.presenter().show_message(
                MessageKind::Warning,
                "No defect detected, the image was not saved",
            );
        } else {
            let cameras = report
                .cameras
                .iter()
                .map(|n| format!("camera {n}"))
                .collect::<Vec<_>>()
                .join(", ");
            gate.presenter().show_message(
                MessageKind::Info,
                &format!(
                    "Saved defect images from {} to {}",
                    cameras,
                    storage::dated_dir(&self.save_root).display()
                ),
            );
        }
        Ok(report)
    }

    /// Save one slot's annotated cached frame. Returns `None` when the slot
    /// has no frame or its re-detection no longer finds a defect (outside
    /// video mode).
    fn save_slot(
        gate: &mut DetectionGate,
        root: &Path,
        id: usize,
        prefix: &str,
    ) -> Result<Option<PathBuf>> {
        let Some((frame, detections)) = gate.detect_cached(id)? else {
            return Ok(None);
        };
        if detections.is_empty() && !gate.session().video_mode {
            return Ok(None);
        }
        let marked = gate.annotate(&frame, &detections);
        let path = storage::save_annotated(root, prefix, &marked)?;
        log::info!("saved defect image {}", path.display());
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enablement_follows_the_state_machine() {
        assert!(action_enabled(GateState::Idle, Action::Start));
        assert!(!action_enabled(GateState::Idle, Action::Stop));
        assert!(!action_enabled(GateState::Idle, Action::Continue));

        assert!(action_enabled(GateState::Scanning, Action::Stop));
        assert!(!action_enabled(GateState::Scanning, Action::Save));
        assert!(!action_enabled(GateState::Scanning, Action::Start));

        assert!(action_enabled(GateState::Halted, Action::Continue));
        assert!(action_enabled(GateState::Halted, Action::Mark));
        assert!(action_enabled(GateState::Halted, Action::Save));

        assert!(action_enabled(GateState::VideoScanning, Action::Save));
        assert!(action_enabled(GateState::VideoScanning, Action::Mark));
        assert!(!action_enabled(GateState::VideoScanning, Action::Continue));

        for state in [
            GateState::Idle,
            GateState::Scanning,
            GateState::Halted,
            GateState::VideoScanning,
        ] {
            assert!(action_enabled(state, Action::SelectVideo));
        }
    }
}
