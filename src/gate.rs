//! Detection gate: the polling-driven decision engine.
//!
//! Each tick pulls a frame from every active slot, runs the detector, and
//! decides whether the line halts. State transitions:
//!
//! ```text
//! Idle --start--> Scanning --defect tick--> Halted --continue--> Scanning
//!   \--select_video--> VideoScanning (never halts)
//! any state --stop--> Idle
//! ```
//!
//! Halting latches `defect_detected` exactly once per cycle; while latched,
//! ticks are cheap pass-throughs (paused slots serve their cached frame and
//! detection is skipped) until the operator issues Continue. The poll timer
//! keeps running throughout a halt, so Continue is state-only.

use anyhow::{anyhow, bail, Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::aggregate;
use crate::detect::{Detections, Detector};
use crate::frame::Frame;
use crate::ingest::CaptureProvider;
use crate::session::Session;
use crate::signal::SignalLine;
use crate::source::{FrameSource, SlotStatus, SLOT_COUNT};
use crate::ui::{MessageKind, Presenter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    /// Not running.
    Idle,
    /// Live scan, no defect latched.
    Scanning,
    /// Defect latched, all physical feeds paused.
    Halted,
    /// Video-demo scan: detects continuously, never halts.
    VideoScanning,
}

pub struct DetectionGate {
    slots: Vec<FrameSource>,
    provider: Box<dyn CaptureProvider>,
    detector: Box<dyn Detector>,
    signal: Box<dyn SignalLine>,
    presenter: Arc<dyn Presenter>,
    session: Session,
    camera_indices: [u32; SLOT_COUNT],
}

impl DetectionGate {
    pub fn new(
        provider: Box<dyn CaptureProvider>,
        detector: Box<dyn Detector>,
        signal: Box<dyn SignalLine>,
        presenter: Arc<dyn Presenter>,
        camera_indices: [u32; SLOT_COUNT],
    ) -> Self {
        log::info!("detection gate using {} detector", detector.name());
        let gate = Self {
            slots: (0..SLOT_COUNT).map(FrameSource::new).collect(),
            provider,
            detector,
            signal,
            presenter,
            session: Session::default(),
            camera_indices,
        };
        gate.sync_actions();
        gate
    }

    pub fn state(&self) -> GateState {
        if !self.session.running {
            GateState::Idle
        } else if self.session.video_mode {
            GateState::VideoScanning
        } else if self.session.defect_detected {
            GateState::Halted
        } else {
            GateState::Scanning
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn slot(&self, id: usize) -> &FrameSource {
        &self.slots[id]
    }

    pub fn presenter(&self) -> &Arc<dyn Presenter> {
        &self.presenter
    }

    /// Start a live scan: open all four slots as live cameras.
    ///
    /// Fails the whole operation if any slot fails to open; slots opened so
    /// far are closed again and the gate stays Idle.
    pub fn start(&mut self) -> Result<()> {
        if self.session.running {
            self.stop();
        }
        for id in 0..SLOT_COUNT {
            let index = self.camera_indices[id];
            if let Err(e) = self.slots[id].open_live(self.provider.as_ref(), index) {
                for slot in &mut self.slots {
                    slot.close();
                }
                self.sync_actions();
                return Err(e.context(format!(
                    "cannot start camera {}, check the connection",
                    id + 1
                )));
            }
        }
        self.session.begin_run(false);
        self.sync_actions();
        log::info!("scanning started on {} live cameras", SLOT_COUNT);
        Ok(())
    }

    /// Stop everything. Safe to call at any time, including mid-cycle; every
    /// slot's handle is released before this returns.
    pub fn stop(&mut self) {
        self.session.end_run();
        for slot in &mut self.slots {
            slot.close();
        }
        self.sync_actions();
        log::info!("scanning stopped");
    }

    /// Enter video-demo mode: slot 0 plays a looping file, slots 1..3 are
    /// inert, and defects never halt the feed.
    pub fn select_video(&mut self, path: &Path) -> Result<()> {
        if self.session.running {
            self.stop();
        }
        if let Err(e) = self.slots[0].open_file(self.provider.as_ref(), path) {
            self.sync_actions();
            return Err(e.context("cannot open the video file, check the format"));
        }
        self.session.begin_run(true);
        self.sync_actions();
        self.presenter.show_message(
            MessageKind::Info,
            "Video demo mode: playback will not stop when a defect is detected.",
        );
        Ok(())
    }

    /// Clear the defect latch and resume all feeds.
    pub fn continue_scan(&mut self) -> Result<()> {
        if !self.session.running {
            bail!("detection is not running, nothing to continue");
        }
        self.session.clear_defects();
        if !self.session.video_mode {
            for slot in &mut self.slots {
                slot.resume();
            }
        }
        self.sync_actions();
        log::info!("defect latch cleared, scanning resumed");
        Ok(())
    }

    /// One polling cycle across all active slots.
    pub fn tick(&mut self) -> Result<()> {
        if !self.session.running {
            return Ok(());
        }

        let video = self.session.video_mode;
        let active_slots = if video { 1 } else { SLOT_COUNT };
        let mut flagged: Vec<usize> = Vec::new();
        let mut summaries: BTreeMap<usize, aggregate::DefectSummary> = BTreeMap::new();

        for id in 0..active_slots {
            // No frame this tick: skip the slot silently.
            let Some(frame) = self.slots[id].read() else {
                continue;
            };

            // Latched: keep the frozen display, skip redundant detection.
            if self.session.defect_detected && !video {
                continue;
            }

            let result = self
                .detector
                .detect(&frame)
                .with_context(|| format!("detector failed on camera {}", id + 1))?;

            if !result.is_empty() {
                let summary = aggregate::summarize(&result);
                if video {
                    log::info!(
                        "video mode: camera {} detected a defect: {}",
                        id + 1,
                        summary.render().replace('\n', "; ")
                    );
                    let marked = self.detector.annotate(&frame, &result);
                    self.presenter.show_frame(id, &marked);
                    continue;
                }
                flagged.push(id);
                summaries.insert(id, summary);
            }

            self.presenter.show_frame(id, &frame);
        }

        if !video && !flagged.is_empty() && !self.session.defect_detected {
            self.halt(flagged, summaries);
        }
        Ok(())
    }

    /// Scanning -> Halted. Runs at most once per latch.
    fn halt(
        &mut self,
        flagged: Vec<usize>,
        summaries: BTreeMap<usize, aggregate::DefectSummary>,
    ) {
        for slot in &mut self.slots {
            slot.pause();
        }
        self.session.defect_detected = true;
        self.session.flagged_slots = flagged;
        self.session.summaries = summaries;

        if let Err(e) = self.signal.pulse_low() {
            log::warn!("signal pulse failed: {e:#}");
        }

        let message = aggregate::combine(&self.session.flagged_slots, &self.session.summaries);
        self.presenter.show_message(MessageKind::Info, &message);
        self.sync_actions();
        log::info!(
            "line halted: cameras {:?} flagged",
            self.session
                .flagged_slots
                .iter()
                .map(|id| id + 1)
                .collect::<Vec<_>>()
        );
    }

    /// Re-run detection against a slot's cached frame. Used by Mark and Save,
    /// which separate "decide to halt" from "produce an annotated artifact".
    pub fn detect_cached(&mut self, slot: usize) -> Result<Option<(Frame, Detections)>> {
        if slot >= SLOT_COUNT {
            return Err(anyhow!("slot {} out of range", slot));
        }
        let Some(frame) = self.slots[slot].last_frame() else {
            return Ok(None);
        };
        let detections = self.detector.detect(&frame)?;
        Ok(Some((frame, detections)))
    }

    pub fn annotate(&self, frame: &Frame, detections: &Detections) -> Frame {
        self.detector.annotate(frame, detections)
    }

    /// Push the current per-state action enablement to the presenter.
    fn sync_actions(&self) {
        let state = self.state();
        for action in crate::controller::Action::ALL {
            self.presenter
                .set_action_enabled(action, crate::controller::action_enabled(state, action));
        }
    }

    /// True when every physically attached slot is paused.
    pub fn all_feeds_paused(&self) -> bool {
        self.slots
            .iter()
            .filter(|slot| slot.is_open())
            .all(|slot| slot.status() == SlotStatus::Paused)
    }
}
