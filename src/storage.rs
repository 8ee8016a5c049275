//! Saved defect artifacts.
//!
//! Layout: `defects/<YYYYMMDD>/<prefix>_<HHMMSS>.jpg`. The time-of-day
//! component keeps names from colliding within the same day; prefixes are
//! `video` in video mode or `camera_<N>` (1-based) otherwise.

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

use crate::frame::Frame;

pub const DEFAULT_SAVE_ROOT: &str = "defects";

/// Today's save directory under `root`.
pub fn dated_dir(root: &Path) -> PathBuf {
    root.join(Local::now().format("%Y%m%d").to_string())
}

/// Write an annotated frame as a JPEG under today's directory.
pub fn save_annotated(root: &Path, prefix: &str, frame: &Frame) -> Result<PathBuf> {
    let now = Local::now();
    let dir = root.join(now.format("%Y%m%d").to_string());
    fs::create_dir_all(&dir)
        .with_context(|| format!("create save directory {}", dir.display()))?;

    let name = format!("{}_{}.jpg", prefix, now.format("%H%M%S"));
    let path = dir.join(name);

    let image = image::RgbImage::from_raw(frame.width(), frame.height(), frame.pixels().to_vec())
        .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))?;
    image
        .save_with_format(&path, image::ImageFormat::Jpeg)
        .with_context(|| format!("write {}", path.display()))?;

    Ok(path)
}
