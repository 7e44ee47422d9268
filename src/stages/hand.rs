//! Hand detection over the pre-cropped seat window.

use std::path::Path;

use image::DynamicImage;

use crate::error::Result;
use crate::models::BoundingBox;
use crate::stages::yolo::YoloDetector;
use crate::stages::HandDetector;

const HAND_INPUT_SIZE: u32 = 416;

/// YOLO-backed hand detector. Boxes are in the input image's own frame; the
/// caller is responsible for remapping them if the input was cropped.
pub struct OnnxHandDetector {
    yolo: YoloDetector,
}

impl OnnxHandDetector {
    pub fn load(path: &Path, confidence: f32) -> Result<Self> {
        Ok(Self {
            yolo: YoloDetector::load(path, "hand", HAND_INPUT_SIZE, confidence)?,
        })
    }
}

impl HandDetector for OnnxHandDetector {
    fn detect(&self, img: &DynamicImage) -> Result<Vec<BoundingBox>> {
        Ok(self.yolo.detect(img)?.into_iter().map(|d| d.bbox).collect())
    }
}
