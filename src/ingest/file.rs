//! Video file capture.
//!
//! `FileCapture` opens a local video file for the gate's video-demo mode.
//! Paths with a `stub://` scheme get a synthetic finite clip (tests, default
//! build); real files need the `ingest-file-ffmpeg` feature.

use anyhow::Result;
use std::path::Path;

use super::stub::ScriptedCapture;
use super::{Capture, CaptureSettings};
use crate::frame::Frame;
#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegFileCapture;

pub struct FileCapture {
    backend: FileBackend,
}

enum FileBackend {
    Synthetic(ScriptedCapture),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegFileCapture),
}

impl FileCapture {
    pub fn open(path: &Path, settings: CaptureSettings) -> Result<Self> {
        let display = path.display().to_string();
        if display.starts_with("stub://") {
            let width = settings.width.min(64);
            let height = settings.height.min(64);
            let frames = (0u8..16)
                .map(|i| Frame::solid(width, height, [i.wrapping_mul(16), 64, 0]))
                .collect();
            log::info!("FileCapture: opened {} (synthetic clip)", display);
            return Ok(Self {
                backend: FileBackend::Synthetic(ScriptedCapture::finite(display, frames)),
            });
        }

        #[cfg(feature = "ingest-file-ffmpeg")]
        {
            let capture = FfmpegFileCapture::open(path)?;
            log::info!("FileCapture: opened {} (ffmpeg)", display);
            Ok(Self {
                backend: FileBackend::Ffmpeg(capture),
            })
        }
        #[cfg(not(feature = "ingest-file-ffmpeg"))]
        {
            Err(anyhow::anyhow!(
                "cannot open {}: video file decoding requires the ingest-file-ffmpeg feature",
                display
            ))
        }
    }
}

impl Capture for FileCapture {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            FileBackend::Synthetic(capture) => capture.read_frame(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(capture) => capture.read_frame(),
        }
    }

    fn rewind(&mut self) -> Result<()> {
        match &mut self.backend {
            FileBackend::Synthetic(capture) => capture.rewind(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(capture) => capture.rewind(),
        }
    }

    fn describe(&self) -> String {
        match &self.backend {
            FileBackend::Synthetic(capture) => capture.describe(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(capture) => capture.describe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn synthetic_clip_loops_via_rewind() -> Result<()> {
        let path = PathBuf::from("stub://demo.mp4");
        let mut capture = FileCapture::open(&path, CaptureSettings::default())?;

        let first = capture.read_frame()?.expect("first frame");
        while capture.read_frame()?.is_some() {}

        capture.rewind()?;
        let again = capture.read_frame()?.expect("frame after rewind");
        assert_eq!(first, again);
        Ok(())
    }
}
