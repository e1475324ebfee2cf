#![cfg(feature = "backend-tract")]

use anyhow::{anyhow, Context, Result};
use image::imageops::{resize, FilterType};
use tract_onnx::prelude::*;

use crate::detect::assets::{LoadedAssets, NetworkConfig};
use crate::detect::backends::model::{decode_rows, ObjectNetwork, RawDetection};
use crate::error::PlaybackError;
use crate::frame::Frame;

/// Tract-based network for ONNX inference.
///
/// Loads a local ONNX export of a YOLO-family detector. Each output tensor is
/// read as rows of `[cx, cy, w, h, objectness, class scores...]`.
pub struct TractNetwork {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    config: NetworkConfig,
}

impl TractNetwork {
    /// Load the weights named by `assets` and prepare them for inference.
    pub fn load(assets: &LoadedAssets) -> Result<Self, PlaybackError> {
        Self::build(assets).map_err(|e| PlaybackError::asset_missing(&assets.weights, e))
    }

    fn build(assets: &LoadedAssets) -> Result<Self> {
        let config = assets.network.clone();
        let model = tract_onnx::onnx()
            .model_for_path(&assets.weights)
            .with_context(|| {
                format!(
                    "failed to load ONNX model from {}",
                    assets.weights.display()
                )
            })?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(
                        1,
                        3,
                        config.input_height as usize,
                        config.input_width as usize
                    ),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self { model, config })
    }

    fn build_input(&self, frame: &Frame) -> Tensor {
        let resized = resize(
            frame.image(),
            self.config.input_width,
            self.config.input_height,
            FilterType::Triangle,
        );
        let scale = self.config.pixel_scale;
        let swap = self.config.swap_rb;
        tract_ndarray::Array4::from_shape_fn(
            (
                1,
                3,
                self.config.input_height as usize,
                self.config.input_width as usize,
            ),
            |(_, channel, y, x)| {
                let channel = if swap { 2 - channel } else { channel };
                resized.get_pixel(x as u32, y as u32).0[channel] as f32 * scale
            },
        )
        .into_tensor()
    }
}

impl ObjectNetwork for TractNetwork {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn infer(&mut self, frame: &Frame) -> Result<Vec<RawDetection>> {
        let input = self.build_input(frame);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;

        let mut detections = Vec::new();
        for output in outputs.iter() {
            let view = output
                .to_array_view::<f32>()
                .context("model output tensor was not f32")?;
            let row_len = *view
                .shape()
                .last()
                .ok_or_else(|| anyhow!("model output has no dimensions"))?;
            let values: Vec<f32> = view.iter().copied().collect();
            if row_len == 0 {
                continue;
            }
            detections.extend(decode_rows(
                values.chunks_exact(row_len),
                frame.width(),
                frame.height(),
            ));
        }
        Ok(detections)
    }
}
