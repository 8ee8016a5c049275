//! Frame capture sources.
//!
//! This module defines the two narrow seams the core needs from whatever
//! camera/video library is linked in:
//!
//! - `Capture`: one open handle that yields frames until end-of-stream.
//! - `CaptureProvider`: opens handles by device index or by file path.
//!
//! Concrete backends:
//! - Synthetic sources (always available, used by tests and the default build)
//! - V4L2 devices (feature: capture-v4l2)
//! - Video files via FFmpeg (feature: ingest-file-ffmpeg)
//!
//! The capture layer knows nothing about slots, pausing, or defect state;
//! that logic lives in `FrameSource` and the gate.

use anyhow::Result;
use std::path::Path;

use crate::frame::Frame;

pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;
pub mod stub;
#[cfg(feature = "capture-v4l2")]
pub mod v4l2;

pub use file::FileCapture;
pub use stub::{ScriptedCapture, StubProvider, SyntheticCapture};
#[cfg(feature = "capture-v4l2")]
pub use v4l2::V4l2Capture;

/// Capture resolution hint forwarded to backends that can honor it.
#[derive(Clone, Copy, Debug)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 1024,
        }
    }
}

/// One open capture handle.
///
/// `read_frame` returning `Ok(None)` means "no frame right now": end-of-stream
/// for files, a failed read for live devices. Dropping the handle releases the
/// underlying device or file.
pub trait Capture: Send {
    fn read_frame(&mut self) -> Result<Option<Frame>>;

    /// Seek back to the start of the stream. File sources support this for
    /// loop playback; live sources fail.
    fn rewind(&mut self) -> Result<()>;

    /// Human-readable source identity for logs.
    fn describe(&self) -> String;
}

/// Opens capture handles. The provider is the substitution point for the
/// concrete camera/video library.
pub trait CaptureProvider: Send + Sync {
    fn open_device(&self, index: u32) -> Result<Box<dyn Capture>>;

    fn open_file(&self, path: &Path) -> Result<Box<dyn Capture>>;
}

/// Default provider: live devices via V4L2 when built in, video files via
/// FFmpeg when built in, synthetic sources otherwise.
pub struct SystemProvider {
    settings: CaptureSettings,
}

impl SystemProvider {
    pub fn new(settings: CaptureSettings) -> Self {
        Self { settings }
    }
}

impl CaptureProvider for SystemProvider {
    fn open_device(&self, index: u32) -> Result<Box<dyn Capture>> {
        #[cfg(feature = "capture-v4l2")]
        {
            Ok(Box::new(V4l2Capture::open(index, self.settings)?))
        }
        #[cfg(not(feature = "capture-v4l2"))]
        {
            log::warn!(
                "no live capture backend built in; camera index {} served synthetically",
                index
            );
            Ok(Box::new(SyntheticCapture::new(
                format!("synthetic://camera/{index}"),
                self.settings,
            )))
        }
    }

    fn open_file(&self, path: &Path) -> Result<Box<dyn Capture>> {
        Ok(Box::new(FileCapture::open(path, self.settings)?))
    }
}
