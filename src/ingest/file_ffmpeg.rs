//! FFmpeg-backed video file decoding.
//!
//! Frames are decoded in-memory and converted to packed RGB24. Rewind seeks
//! the demuxer back to the start and flushes the decoder, which is what the
//! loop-playback policy in `FrameSource` relies on.

use anyhow::{Context, Result};
use ffmpeg_next as ffmpeg;
use std::path::Path;

use crate::frame::Frame;

pub(crate) struct FfmpegFileCapture {
    path: String,
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    frame_count: u64,
}

impl FfmpegFileCapture {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let input = ffmpeg::format::input(&path)
            .with_context(|| format!("failed to open video file {}", path.display()))?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow::anyhow!("{} has no video track", path.display()))?;
        let stream_index = input_stream.index();
        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        Ok(Self {
            path: path.display().to_string(),
            input,
            stream_index,
            decoder,
            scaler,
            frame_count: 0,
        })
    }

    pub(crate) fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut decoded = ffmpeg::frame::Video::empty();
        let mut rgb_frame = ffmpeg::frame::Video::empty();

        for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }

            self.decoder
                .send_packet(&packet)
                .context("send packet to ffmpeg decoder")?;

            while self.decoder.receive_frame(&mut decoded).is_ok() {
                self.scaler
                    .run(&decoded, &mut rgb_frame)
                    .context("scale frame to RGB")?;
                let frame = frame_from_video(&rgb_frame)?;
                self.frame_count += 1;
                return Ok(Some(frame));
            }
        }

        // Demuxer is drained: end-of-stream.
        Ok(None)
    }

    pub(crate) fn rewind(&mut self) -> Result<()> {
        self.input
            .seek(0, ..)
            .context("seek video file to start")?;
        self.decoder.flush();
        Ok(())
    }

    pub(crate) fn describe(&self) -> String {
        format!("{} (frame {})", self.path, self.frame_count)
    }
}

fn frame_from_video(video: &ffmpeg::frame::Video) -> Result<Frame> {
    let width = video.width();
    let height = video.height();
    let row_bytes = (width as usize) * 3;
    let stride = video.stride(0);
    let data = video.data(0);

    if stride == row_bytes {
        return Frame::new(data.to_vec(), width, height);
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .context("ffmpeg frame row is out of bounds")?,
        );
    }
    Frame::new(pixels, width, height)
}
