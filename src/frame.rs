//! Owned frame type shared between capture, detection, and saving.
//!
//! A `Frame` is a packed RGB24 buffer. `Clone` is a deep copy: the gate caches
//! a clone of every frame it reads, so a later annotation pass can never
//! corrupt the cached original.

use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use std::fmt;

/// Packed RGB24 image, row-major, no padding.
#[derive(Clone, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    /// Wrap an RGB24 buffer. The buffer length must be `width * height * 3`.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize) * (height as usize) * 3;
        if data.len() != expected {
            return Err(anyhow!(
                "frame buffer is {} bytes, expected {} for {}x{} RGB24",
                data.len(),
                expected,
                width,
                height
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Single-color frame. Used by synthetic sources and tests.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixel_count * 3);
        for _ in 0..pixel_count {
            data.extend_from_slice(&rgb);
        }
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Content digest. Stable for identical pixel data, used by the scripted
    /// detector and by tests that assert a cached frame was not advanced.
    pub fn content_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update(&self.data);
        hasher.finalize().into()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_buffer_length() {
        assert!(Frame::new(vec![0u8; 10], 4, 4).is_err());
        assert!(Frame::new(vec![0u8; 48], 4, 4).is_ok());
    }

    #[test]
    fn clone_is_a_deep_copy() {
        let original = Frame::solid(4, 4, [10, 20, 30]);
        let mut copy = original.clone();
        copy.pixels_mut()[0] = 255;

        assert_eq!(original.pixels()[0], 10);
        assert_ne!(original.content_hash(), copy.content_hash());
    }

    #[test]
    fn content_hash_is_stable() {
        let a = Frame::solid(8, 8, [1, 2, 3]);
        let b = Frame::solid(8, 8, [1, 2, 3]);
        assert_eq!(a.content_hash(), b.content_hash());
    }
}
