//! V4L2 live-device capture.
//!
//! Opens `/dev/video<N>` for camera slot N, requests packed RGB at the
//! configured resolution, and yields frames through the `Capture` trait.
//! Read failures surface as `Ok(None)`: the gate treats a dry live device as
//! "no frame this tick" and the operator recovers with Stop/Start.

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use super::{Capture, CaptureSettings};
use crate::frame::Frame;

pub struct V4l2Capture {
    device_path: String,
    state: DeviceState,
    active_width: u32,
    active_height: u32,
    frame_count: u64,
}

#[self_referencing]
struct DeviceState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Capture {
    pub fn open(index: u32, settings: CaptureSettings) -> Result<Self> {
        use v4l::buffer::Type;
        use v4l::video::Capture as _;

        let device_path = format!("/dev/video{index}");
        let mut device = v4l::Device::with_path(&device_path)
            .with_context(|| format!("open v4l2 device {device_path}"))?;

        let mut format = device.format().context("read v4l2 format")?;
        format.width = settings.width;
        format.height = settings.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!("V4l2Capture: failed to set format on {device_path}: {err}");
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };
        let active_width = format.width;
        let active_height = format.height;

        let state = DeviceStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;

        log::info!("V4l2Capture: opened {device_path} ({active_width}x{active_height})");

        Ok(Self {
            device_path,
            state,
            active_width,
            active_height,
            frame_count: 0,
        })
    }
}

impl Capture for V4l2Capture {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        use v4l::io::traits::CaptureStream;

        let buf = match self.state.with_mut(|fields| {
            fields
                .stream
                .next()
                .map(|(buf, _meta)| buf.to_vec())
        }) {
            Ok(buf) => buf,
            Err(err) => {
                log::debug!("V4l2Capture: read failed on {}: {}", self.device_path, err);
                return Ok(None);
            }
        };

        let expected = (self.active_width as usize) * (self.active_height as usize) * 3;
        if buf.len() < expected {
            log::debug!(
                "V4l2Capture: short buffer from {} ({} < {})",
                self.device_path,
                buf.len(),
                expected
            );
            return Ok(None);
        }

        self.frame_count += 1;
        let frame = Frame::new(
            buf[..expected].to_vec(),
            self.active_width,
            self.active_height,
        )?;
        Ok(Some(frame))
    }

    fn rewind(&mut self) -> Result<()> {
        anyhow::bail!("live device {} cannot rewind", self.device_path)
    }

    fn describe(&self) -> String {
        format!("{} (frame {})", self.device_path, self.frame_count)
    }
}
