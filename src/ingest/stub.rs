//! Synthetic capture sources.
//!
//! These stand in for real devices in tests, demos, and builds without a
//! hardware backend. `SyntheticCapture` generates an endless scene;
//! `ScriptedCapture` replays a fixed frame list and is the workhorse of the
//! gate tests (a finite script behaves exactly like a short video file).

use anyhow::{anyhow, Result};
use std::path::Path;

use super::{Capture, CaptureProvider, CaptureSettings};
use crate::frame::Frame;

/// Endless generated frames with slow scene drift.
pub struct SyntheticCapture {
    label: String,
    settings: CaptureSettings,
    frame_count: u64,
    scene_state: u8,
}

impl SyntheticCapture {
    pub fn new(label: String, settings: CaptureSettings) -> Self {
        Self {
            label,
            settings,
            frame_count: 0,
            scene_state: 0,
        }
    }

    fn generate_pixels(&mut self) -> Vec<u8> {
        let pixel_count =
            (self.settings.width as usize) * (self.settings.height as usize) * 3;
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }
        pixels
    }
}

impl Capture for SyntheticCapture {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        self.frame_count += 1;
        let pixels = self.generate_pixels();
        let frame = Frame::new(pixels, self.settings.width, self.settings.height)?;
        Ok(Some(frame))
    }

    fn rewind(&mut self) -> Result<()> {
        self.frame_count = 0;
        self.scene_state = 0;
        Ok(())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// Replays a fixed list of frames.
///
/// A looping script models a live device that never runs dry; a finite script
/// models a video file that hits end-of-stream and must be rewound.
pub struct ScriptedCapture {
    label: String,
    frames: Vec<Frame>,
    cursor: usize,
    looping: bool,
}

impl ScriptedCapture {
    pub fn looping(label: impl Into<String>, frames: Vec<Frame>) -> Self {
        Self {
            label: label.into(),
            frames,
            cursor: 0,
            looping: true,
        }
    }

    pub fn finite(label: impl Into<String>, frames: Vec<Frame>) -> Self {
        Self {
            label: label.into(),
            frames,
            cursor: 0,
            looping: false,
        }
    }
}

impl Capture for ScriptedCapture {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if self.cursor >= self.frames.len() {
            if !self.looping || self.frames.is_empty() {
                return Ok(None);
            }
            self.cursor = 0;
        }
        let frame = self.frames[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(frame))
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// Pure-stub provider: synthetic devices, scripted finite "files".
pub struct StubProvider {
    settings: CaptureSettings,
    /// Device indices below this open successfully; the rest fail.
    available_devices: u32,
    /// Frames served for any file path.
    file_frames: Vec<Frame>,
}

impl StubProvider {
    pub fn new(settings: CaptureSettings, available_devices: u32) -> Self {
        let file_frames = (0..8)
            .map(|i| Frame::solid(settings.width.min(32), settings.height.min(32), [i * 20, 0, 0]))
            .collect();
        Self {
            settings,
            available_devices,
            file_frames,
        }
    }

    pub fn with_file_frames(mut self, frames: Vec<Frame>) -> Self {
        self.file_frames = frames;
        self
    }
}

impl CaptureProvider for StubProvider {
    fn open_device(&self, index: u32) -> Result<Box<dyn Capture>> {
        if index >= self.available_devices {
            return Err(anyhow!("no capture device at index {}", index));
        }
        Ok(Box::new(SyntheticCapture::new(
            format!("stub://camera/{index}"),
            self.settings,
        )))
    }

    fn open_file(&self, path: &Path) -> Result<Box<dyn Capture>> {
        Ok(Box::new(ScriptedCapture::finite(
            format!("stub://{}", path.display()),
            self.file_frames.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_capture_always_yields_frames() -> Result<()> {
        let mut capture = SyntheticCapture::new(
            "stub://test".into(),
            CaptureSettings {
                width: 16,
                height: 16,
            },
        );
        for _ in 0..3 {
            let frame = capture.read_frame()?.expect("frame");
            assert_eq!(frame.width(), 16);
        }
        Ok(())
    }

    #[test]
    fn finite_script_ends_then_rewinds() -> Result<()> {
        let frames = vec![Frame::solid(4, 4, [1, 0, 0]), Frame::solid(4, 4, [2, 0, 0])];
        let mut capture = ScriptedCapture::finite("clip", frames.clone());

        assert_eq!(capture.read_frame()?.unwrap(), frames[0]);
        assert_eq!(capture.read_frame()?.unwrap(), frames[1]);
        assert!(capture.read_frame()?.is_none());

        capture.rewind()?;
        assert_eq!(capture.read_frame()?.unwrap(), frames[0]);
        Ok(())
    }

    #[test]
    fn stub_provider_rejects_missing_devices() {
        let provider = StubProvider::new(CaptureSettings::default(), 2);
        assert!(provider.open_device(1).is_ok());
        assert!(provider.open_device(2).is_err());
    }
}
