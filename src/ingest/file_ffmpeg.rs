//! Local file frame source using FFmpeg.
//!
//! Decodes the best video stream to RGB24 in-memory. Seeking is frame-accurate:
//! a backward seek reopens the container and decodes forward, a forward seek
//! decodes and discards.

use anyhow::{anyhow, Context, Result};
use ffmpeg_next as ffmpeg;

use super::FrameSource;
use crate::frame::Frame;

struct Decoding {
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    frame_count: Option<u64>,
    eof_sent: bool,
}

impl Decoding {
    fn open(path: &str) -> Result<Self> {
        let input = ffmpeg::format::input(&path)
            .with_context(|| format!("failed to open file input '{}' with ffmpeg", path))?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow!("file has no video track"))?;
        let stream_index = input_stream.index();
        let frame_count = u64::try_from(input_stream.frames())
            .ok()
            .filter(|&n| n > 0);
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
            input,
            stream_index,
            decoder,
            scaler,
            frame_count,
            eof_sent: false,
        })
    }

    /// Next decoded picture, draining the decoder once packets run out.
    fn decode_next(&mut self) -> Result<Option<ffmpeg::frame::Video>> {
        let mut decoded = ffmpeg::frame::Video::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return Ok(Some(decoded));
            }
            if self.eof_sent {
                return Ok(None);
            }

            let stream_index = self.stream_index;
            let next = self
                .input
                .packets()
                .find(|(stream, _)| stream.index() == stream_index)
                .map(|(_, packet)| packet);
            match next {
                Some(packet) => self
                    .decoder
                    .send_packet(&packet)
                    .context("send packet to ffmpeg decoder")?,
                None => {
                    self.decoder.send_eof().context("flush ffmpeg decoder")?;
                    self.eof_sent = true;
                }
            }
        }
    }

    fn to_rgb(&mut self, decoded: &ffmpeg::frame::Video) -> Result<(Vec<u8>, u32, u32)> {
        let mut rgb_frame = ffmpeg::frame::Video::empty();
        self.scaler
            .run(decoded, &mut rgb_frame)
            .context("scale frame to RGB")?;
        frame_to_pixels(&rgb_frame)
    }
}

pub(crate) struct FfmpegFileSource {
    path: String,
    decoding: Decoding,
    /// Index of the frame the next `read` returns.
    position: u64,
}

impl FfmpegFileSource {
    pub(crate) fn open(path: &str) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let decoding = Decoding::open(path)?;
        log::info!(
            "FileSource: opened {} (ffmpeg, {} frames)",
            path,
            decoding
                .frame_count
                .map_or_else(|| "unknown".to_string(), |n| n.to_string())
        );
        Ok(Self {
            path: path.to_string(),
            decoding,
            position: 0,
        })
    }
}

impl FrameSource for FfmpegFileSource {
    fn describe(&self) -> &str {
        &self.path
    }

    fn seek(&mut self, index: u64) -> Result<()> {
        if index < self.position {
            log::debug!("{}: reopening to seek back to frame {}", self.path, index);
            self.decoding = Decoding::open(&self.path)?;
            self.position = 0;
        }
        while self.position < index {
            if self.decoding.decode_next()?.is_none() {
                break;
            }
            self.position += 1;
        }
        Ok(())
    }

    fn read(&mut self) -> Result<Option<Frame>> {
        let Some(decoded) = self.decoding.decode_next()? else {
            return Ok(None);
        };
        let (pixels, width, height) = self.decoding.to_rgb(&decoded)?;
        let frame = Frame::from_rgb_bytes(self.position, pixels, width, height)?;
        self.position += 1;
        Ok(Some(frame))
    }

    fn frame_count(&self) -> Option<u64> {
        self.decoding.frame_count
    }
}

fn frame_to_pixels(frame: &ffmpeg::frame::Video) -> Result<(Vec<u8>, u32, u32)> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = (width as usize) * 3;
    let stride = frame.stride(0);
    let data = frame.data(0);

    if stride == row_bytes {
        let packed = data
            .get(..row_bytes * height as usize)
            .context("ffmpeg frame buffer is shorter than its dimensions")?;
        return Ok((packed.to_vec(), width, height));
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

    Ok((pixels, width, height))
}
