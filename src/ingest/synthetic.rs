//! Synthetic `stub://` source.
//!
//! Renders a white square crossing a dark, lightly noisy background. Frames are
//! a pure function of their index, so seeking and re-reading reproduce the same
//! pixels. Parameters ride in the query string:
//!
//! ```text
//! stub://pitch?frames=30&width=320&height=240&side=20&step=32
//! ```

use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::FrameSource;
use crate::frame::Frame;

pub const STUB_SCHEME: &str = "stub://";

const BACKGROUND_LEVEL: u8 = 30;
const NOISE_AMPLITUDE: u8 = 4;
const BALL_LEVEL: u8 = 250;

#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticConfig {
    pub frames: u64,
    pub width: u32,
    pub height: u32,
    /// Square side in pixels.
    pub side: u32,
    /// Horizontal travel per frame.
    pub step: u32,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            frames: 60,
            width: 320,
            height: 240,
            side: 20,
            step: 32,
            seed: 0x5eed,
        }
    }
}

impl SyntheticConfig {
    /// Parse a `stub://` URI. Unknown keys are rejected.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix(STUB_SCHEME)
            .ok_or_else(|| anyhow!("'{}' is not a {} URI", uri, STUB_SCHEME))?;
        let mut config = Self::default();
        let Some((_, query)) = rest.split_once('?') else {
            return Ok(config);
        };

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("stub parameter '{}' has no value", pair))?;
            let parse = |v: &str| -> Result<u64> {
                v.parse::<u64>()
                    .with_context(|| format!("stub parameter {} must be an integer", key))
            };
            let parse_u32 = |v: &str| -> Result<u32> {
                u32::try_from(parse(v)?)
                    .with_context(|| format!("stub parameter {} is out of range", key))
            };
            match key {
                "frames" => config.frames = parse(value)?,
                "width" => config.width = parse_u32(value)?,
                "height" => config.height = parse_u32(value)?,
                "side" => config.side = parse_u32(value)?,
                "step" => config.step = parse_u32(value)?,
                "seed" => config.seed = parse(value)?,
                other => return Err(anyhow!("unknown stub parameter '{}'", other)),
            }
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(anyhow!("stub frame size must be non-zero"));
        }
        if self.side == 0 || self.side > self.width || self.side > self.height {
            return Err(anyhow!(
                "stub square side {} does not fit a {}x{} frame",
                self.side,
                self.width,
                self.height
            ));
        }
        Ok(())
    }

    /// Top-left corner of the square in frame `index`.
    pub fn square_origin(&self, index: u64) -> (u32, u32) {
        let travel = u64::from(self.width - self.side) + 1;
        let x = (index * u64::from(self.step)) % travel;
        let y = (self.height - self.side) / 2;
        (x as u32, y)
    }

    pub fn render(&self, index: u64) -> RgbImage {
        let mut rng = StdRng::seed_from_u64(self.seed ^ index);
        let (sx, sy) = self.square_origin(index);
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let inside = x >= sx && x < sx + self.side && y >= sy && y < sy + self.side;
            let noise = rng.gen_range(0..=NOISE_AMPLITUDE);
            let level = if inside {
                BALL_LEVEL
            } else {
                BACKGROUND_LEVEL + noise
            };
            Rgb([level, level, level])
        })
    }
}

pub struct SyntheticSource {
    uri: String,
    config: SyntheticConfig,
    position: u64,
}

impl SyntheticSource {
    pub fn open(uri: &str) -> Result<Self> {
        let config = SyntheticConfig::from_uri(uri)?;
        log::info!(
            "synthetic source {}: {} frames at {}x{}",
            uri,
            config.frames,
            config.width,
            config.height
        );
        Ok(Self::with_config(uri, config))
    }

    pub fn with_config(uri: impl Into<String>, config: SyntheticConfig) -> Self {
        Self {
            uri: uri.into(),
            config,
            position: 0,
        }
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }
}

impl FrameSource for SyntheticSource {
    fn describe(&self) -> &str {
        &self.uri
    }

    fn seek(&mut self, index: u64) -> Result<()> {
        self.position = index;
        Ok(())
    }

    fn read(&mut self) -> Result<Option<Frame>> {
        if self.position >= self.config.frames {
            return Ok(None);
        }
        let frame = Frame::new(self.position, self.config.render(self.position));
        self.position += 1;
        Ok(Some(frame))
    }

    fn frame_count(&self) -> Option<u64> {
        Some(self.config.frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_parameters() {
        let config = SyntheticConfig::from_uri("stub://pitch?frames=5&side=10&step=12").unwrap();
        assert_eq!(config.frames, 5);
        assert_eq!(config.side, 10);
        assert_eq!(config.step, 12);
        assert_eq!(config.width, 320);
    }

    #[test]
    fn bare_uri_uses_defaults() {
        assert_eq!(
            SyntheticConfig::from_uri("stub://").unwrap(),
            SyntheticConfig::default()
        );
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(SyntheticConfig::from_uri("stub://x?speed=3").is_err());
        assert!(SyntheticConfig::from_uri("stub://x?frames=lots").is_err());
        assert!(SyntheticConfig::from_uri("stub://x?side=500").is_err());
        assert!(SyntheticConfig::from_uri("/tmp/video.mp4").is_err());
    }

    #[test]
    fn rejects_dimensions_that_overflow_u32() {
        assert!(SyntheticConfig::from_uri("stub://x?width=4294967297").is_err());
        assert!(SyntheticConfig::from_uri("stub://x?step=4294967296").is_err());
        assert_eq!(
            SyntheticConfig::from_uri("stub://x?width=4000").unwrap().width,
            4000
        );
    }

    #[test]
    fn frames_are_reproducible_after_seek() {
        let mut source = SyntheticSource::open("stub://t?frames=4").unwrap();
        let first = source.read().unwrap().unwrap();
        source.read().unwrap();
        source.seek(0).unwrap();
        let again = source.read().unwrap().unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn ends_after_frame_count() {
        let mut source = SyntheticSource::open("stub://t?frames=2").unwrap();
        assert_eq!(source.frame_count(), Some(2));
        assert_eq!(source.read().unwrap().unwrap().index(), 0);
        assert_eq!(source.read().unwrap().unwrap().index(), 1);
        assert!(source.read().unwrap().is_none());
    }

    #[test]
    fn square_is_drawn_at_origin() {
        let config = SyntheticConfig::default();
        let image = config.render(1);
        let (x, y) = config.square_origin(1);
        assert_eq!(x, 32);
        assert_eq!(image.get_pixel(x + 1, y + 1).0, [BALL_LEVEL; 3]);
        assert!(image.get_pixel(0, 0).0[0] <= BACKGROUND_LEVEL + NOISE_AMPLITUDE);
    }
}
