//! Per-slot frame source.
//!
//! A `FrameSource` owns one capture handle (live camera or video file) plus
//! the slot's cached last frame. The cache is behind a mutex because the
//! polling tick writes it while operator actions (Mark, Save) read it from a
//! different execution context.
//!
//! Read policy:
//! - paused: return the cached frame unchanged, never advancing the stream
//! - live read failure: no frame this tick, no retry
//! - file read failure: rewind to the start and retry once (loop playback)

use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::Mutex;

use crate::frame::Frame;
use crate::ingest::{Capture, CaptureProvider};

/// Fixed number of camera/video channels tracked by the core.
pub const SLOT_COUNT: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Unattached,
    Live,
    VideoFile,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotStatus {
    Stopped,
    Running,
    Paused,
}

pub struct FrameSource {
    id: usize,
    kind: SourceKind,
    status: SlotStatus,
    capture: Option<Box<dyn Capture>>,
    last_frame: Mutex<Option<Frame>>,
}

impl FrameSource {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            kind: SourceKind::Unattached,
            status: SlotStatus::Stopped,
            capture: None,
            last_frame: Mutex::new(None),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn status(&self) -> SlotStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.capture.is_some()
    }

    /// Open a live capture device. Performs one test read; on any failure the
    /// handle is dropped and the slot stays unattached.
    pub fn open_live(&mut self, provider: &dyn CaptureProvider, index: u32) -> Result<()> {
        self.close();
        let mut capture = provider.open_device(index)?;
        match capture.read_frame()? {
            Some(_) => {}
            None => {
                // Dropping the handle here releases the device.
                return Err(anyhow!(
                    "device for camera {} opened but produced no frame",
                    self.id + 1
                ));
            }
        }
        log::info!("slot {}: opened live source {}", self.id, capture.describe());
        self.capture = Some(capture);
        self.kind = SourceKind::Live;
        self.status = SlotStatus::Running;
        Ok(())
    }

    /// Open a video file for loop playback.
    pub fn open_file(&mut self, provider: &dyn CaptureProvider, path: &Path) -> Result<()> {
        self.close();
        let capture = provider.open_file(path)?;
        log::info!("slot {}: opened video source {}", self.id, capture.describe());
        self.capture = Some(capture);
        self.kind = SourceKind::VideoFile;
        self.status = SlotStatus::Running;
        Ok(())
    }

    /// Pull the slot's current frame.
    ///
    /// Returns `None` when the slot is unattached or no frame is available
    /// this tick. Successful reads cache a deep copy as the slot's last frame.
    pub fn read(&mut self) -> Option<Frame> {
        if self.capture.is_none() {
            return None;
        }

        if self.status == SlotStatus::Paused {
            return self.last_frame();
        }

        match self.read_once() {
            Some(frame) => Some(frame),
            None if self.kind == SourceKind::VideoFile => {
                // End-of-stream: loop back to the first frame and retry once.
                log::info!("slot {}: video ended, restarting from the top", self.id);
                if let Some(capture) = self.capture.as_mut() {
                    if let Err(e) = capture.rewind() {
                        log::warn!("slot {}: rewind failed: {e:#}", self.id);
                        return None;
                    }
                }
                self.read_once()
            }
            None => None,
        }
    }

    fn read_once(&mut self) -> Option<Frame> {
        let capture = self.capture.as_mut()?;
        match capture.read_frame() {
            Ok(Some(frame)) => {
                let mut cached = self
                    .last_frame
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                *cached = Some(frame.clone());
                Some(frame)
            }
            Ok(None) => None,
            Err(e) => {
                log::debug!("slot {}: read failed: {e:#}", self.id);
                None
            }
        }
    }

    /// Freeze the slot: subsequent reads return the cached frame.
    pub fn pause(&mut self) {
        if self.capture.is_some() {
            self.status = SlotStatus::Paused;
        }
    }

    /// Unfreeze the slot. Does not reset or skip frames.
    pub fn resume(&mut self) {
        if self.capture.is_some() {
            self.status = SlotStatus::Running;
        }
    }

    /// Release the underlying handle and reset the slot.
    pub fn close(&mut self) {
        if let Some(capture) = self.capture.take() {
            log::info!("slot {}: closed {}", self.id, capture.describe());
        }
        self.kind = SourceKind::Unattached;
        self.status = SlotStatus::Stopped;
        *self
            .last_frame
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    /// Snapshot of the cached frame, for Mark/Save.
    pub fn last_frame(&self) -> Option<Frame> {
        self.last_frame
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{CaptureSettings, ScriptedCapture, StubProvider};
    use std::path::PathBuf;

    struct ScriptFileProvider {
        frames: Vec<Frame>,
    }

    impl CaptureProvider for ScriptFileProvider {
        fn open_device(&self, _index: u32) -> Result<Box<dyn Capture>> {
            Ok(Box::new(ScriptedCapture::finite(
                "script://device",
                self.frames.clone(),
            )))
        }

        fn open_file(&self, _path: &Path) -> Result<Box<dyn Capture>> {
            Ok(Box::new(ScriptedCapture::finite(
                "script://file",
                self.frames.clone(),
            )))
        }
    }

    fn frames(n: u8) -> Vec<Frame> {
        (0..n).map(|i| Frame::solid(4, 4, [i, 0, 0])).collect()
    }

    #[test]
    fn paused_read_repeats_the_cached_frame() -> Result<()> {
        let provider = ScriptFileProvider { frames: frames(4) };
        let mut slot = FrameSource::new(0);
        slot.open_file(&provider, &PathBuf::from("clip.mp4"))?;

        let first = slot.read().expect("first frame");
        slot.pause();
        for _ in 0..5 {
            assert_eq!(slot.read().expect("cached frame"), first);
        }

        // Resume continues from the next frame, nothing was skipped.
        slot.resume();
        let next = slot.read().expect("next frame");
        assert_ne!(next, first);
        assert_eq!(next, Frame::solid(4, 4, [1, 0, 0]));
        Ok(())
    }

    #[test]
    fn file_source_loops_at_end_of_stream() -> Result<()> {
        let provider = ScriptFileProvider { frames: frames(2) };
        let mut slot = FrameSource::new(0);
        slot.open_file(&provider, &PathBuf::from("clip.mp4"))?;

        let first = slot.read().expect("frame 0");
        slot.read().expect("frame 1");
        // End-of-stream: the loop policy restarts the clip.
        let looped = slot.read().expect("frame after loop restart");
        assert_eq!(looped, first);
        Ok(())
    }

    #[test]
    fn live_source_does_not_loop() -> Result<()> {
        // Finite script behind a live open: after the last frame, reads fail
        // and stay failed for the tick.
        let provider = ScriptFileProvider { frames: frames(2) };
        let mut slot = FrameSource::new(1);
        slot.open_live(&provider, 1)?;

        // open_live consumed one frame as its test read.
        assert!(slot.read().is_some());
        assert!(slot.read().is_none());
        assert!(slot.read().is_none());
        Ok(())
    }

    #[test]
    fn open_live_failure_leaves_slot_unattached() {
        let provider = StubProvider::new(CaptureSettings::default(), 0);
        let mut slot = FrameSource::new(2);

        assert!(slot.open_live(&provider, 2).is_err());
        assert!(!slot.is_open());
        assert_eq!(slot.kind(), SourceKind::Unattached);
        assert_eq!(slot.status(), SlotStatus::Stopped);
    }

    #[test]
    fn close_resets_everything() -> Result<()> {
        let provider = ScriptFileProvider { frames: frames(3) };
        let mut slot = FrameSource::new(0);
        slot.open_file(&provider, &PathBuf::from("clip.mp4"))?;
        slot.read().expect("frame");

        slot.close();
        assert!(!slot.is_open());
        assert_eq!(slot.kind(), SourceKind::Unattached);
        assert_eq!(slot.status(), SlotStatus::Stopped);
        assert!(slot.last_frame().is_none());
        assert!(slot.read().is_none());
        Ok(())
    }
}
