//! Shared tract-onnx wrapper for the small binary classifiers
//! (eye open/closed, face awake/sleeping).
//!
//! The exported models take a fixed-size RGB input, NCHW, values in [0, 1],
//! and emit one logit (or log-probability) per class; the predicted label is
//! the argmax.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage};
use tract_onnx::prelude::*;

use crate::error::{Error, Result};

pub struct BinaryClassifier {
    plan: TypedSimplePlan<TypedModel>,
    name: &'static str,
    input_width: u32,
    input_height: u32,
}

impl BinaryClassifier {
    pub fn load(path: &Path, name: &'static str, input_width: u32, input_height: u32) -> Result<Self> {
        let (w, h) = (input_width as usize, input_height as usize);
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| {
                m.with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, h, w)))
            })
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| Error::model_unavailable(name, format!("{}: {}", path.display(), e)))?;

        Ok(Self {
            plan,
            name,
            input_width,
            input_height,
        })
    }

    /// Resizes the region to the model input, runs the forward pass, and
    /// returns the argmax label index.
    pub fn predict(&self, region: &DynamicImage) -> Result<usize> {
        if region.width() == 0 || region.height() == 0 {
            return Err(Error::inference(self.name, "zero-sized input region"));
        }

        let resized = region
            .resize_exact(self.input_width, self.input_height, FilterType::Triangle)
            .to_rgb8();
        let (w, h) = (self.input_width as usize, self.input_height as usize);
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
            resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
        });

        let outputs = self
            .plan
            .run(tvec!(input.into_tensor().into()))
            .map_err(|e| Error::inference(self.name, e))?;
        let output = outputs
            .first()
            .ok_or_else(|| Error::inference(self.name, "model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| Error::inference(self.name, e))?;

        let (label, _) = view
            .iter()
            .enumerate()
            .fold((0usize, f32::NEG_INFINITY), |best, (i, &v)| {
                if v > best.1 {
                    (i, v)
                } else {
                    best
                }
            });
        Ok(label)
    }
}
