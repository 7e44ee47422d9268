//! Eye location inside a face region and per-eye open/closed classification.

use std::path::Path;

use image::DynamicImage;

use crate::error::Result;
use crate::models::{DetectionResult, EyeState, Region};
use crate::stages::classifier::BinaryClassifier;
use crate::stages::yolo::YoloDetector;
use crate::stages::{EyeLocator, EyeStateClassifier};

const EYE_INPUT_SIZE: u32 = 320;
// Floor below any caller-supplied confidence; the orchestrator passes the
// configured eye confidence per call.
const EYE_BASE_CONFIDENCE: f32 = 0.05;

// Eye crops are wide and short; matches the classifier's training input.
const EYE_STATE_WIDTH: u32 = 50;
const EYE_STATE_HEIGHT: u32 = 20;

/// YOLO-backed eye locator. Boxes are reported in the face region's frame.
pub struct OnnxEyeLocator {
    yolo: YoloDetector,
}

impl OnnxEyeLocator {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            yolo: YoloDetector::load(path, "eye", EYE_INPUT_SIZE, EYE_BASE_CONFIDENCE)?,
        })
    }
}

impl EyeLocator for OnnxEyeLocator {
    fn detect(&self, face: &DynamicImage, confidence: f32) -> Result<DetectionResult> {
        let detections = self.yolo.detect_with_confidence(face, confidence)?;
        let mut result = DetectionResult::default();
        for d in detections {
            result.regions.push(Region {
                image: face.crop_imm(
                    d.bbox.xmin,
                    d.bbox.ymin,
                    d.bbox.width().max(1),
                    d.bbox.height().max(1),
                ),
                bbox: d.bbox,
            });
            result.boxes.push(d.bbox);
        }
        Ok(result)
    }
}

/// Per-eye classifier: label 1 is an open eye.
pub struct OnnxEyeStateClassifier {
    inner: BinaryClassifier,
}

impl OnnxEyeStateClassifier {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            inner: BinaryClassifier::load(path, "eye-state", EYE_STATE_WIDTH, EYE_STATE_HEIGHT)?,
        })
    }
}

impl EyeStateClassifier for OnnxEyeStateClassifier {
    fn classify(&self, eye: &DynamicImage) -> Result<EyeState> {
        Ok(match self.inner.predict(eye)? {
            1 => EyeState::Open,
            _ => EyeState::Closed,
        })
    }
}
