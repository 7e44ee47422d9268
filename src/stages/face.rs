//! Face location and whole-face state classification.

use std::path::Path;

use image::DynamicImage;

use crate::error::Result;
use crate::models::{FaceState, Region};
use crate::stages::classifier::BinaryClassifier;
use crate::stages::yolo::{Detection, YoloDetector};
use crate::stages::{FaceLocator, FaceStateClassifier};

const FACE_INPUT_SIZE: u32 = 640;
const FACE_CONFIDENCE: f32 = 0.5;
const FACE_STATE_INPUT: u32 = 64;

/// YOLO-backed face locator. When several faces are detectable, only the one
/// with the largest bounding box is reported; on an exact area tie the
/// earlier (higher-confidence) detection wins.
pub struct OnnxFaceLocator {
    yolo: YoloDetector,
}

impl OnnxFaceLocator {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            yolo: YoloDetector::load(path, "face", FACE_INPUT_SIZE, FACE_CONFIDENCE)?,
        })
    }
}

impl FaceLocator for OnnxFaceLocator {
    fn detect(&self, img: &DynamicImage) -> Result<Option<Region>> {
        let detections = self.yolo.detect(img)?;
        Ok(largest_detection(&detections).map(|d| Region {
            image: img.crop_imm(d.bbox.xmin, d.bbox.ymin, d.bbox.width().max(1), d.bbox.height().max(1)),
            bbox: d.bbox,
        }))
    }
}

/// Picks the detection with the largest bounding-box area, keeping the first
/// (confidence order) on exact ties.
pub(crate) fn largest_detection(detections: &[Detection]) -> Option<Detection> {
    detections
        .iter()
        .copied()
        .fold(None, |best: Option<Detection>, d| match best {
            Some(b) if d.bbox.area() <= b.bbox.area() => Some(b),
            _ => Some(d),
        })
}

/// Small-CNN face classifier: label 0 is awake, label 1 is sleeping.
pub struct OnnxFaceStateClassifier {
    inner: BinaryClassifier,
}

impl OnnxFaceStateClassifier {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            inner: BinaryClassifier::load(path, "face-state", FACE_STATE_INPUT, FACE_STATE_INPUT)?,
        })
    }
}

impl FaceStateClassifier for OnnxFaceStateClassifier {
    fn classify(&self, face: &DynamicImage) -> Result<FaceState> {
        Ok(match self.inner.predict(face)? {
            0 => FaceState::Awake,
            _ => FaceState::Sleeping,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundingBox;

    fn det(xmin: u32, xmax: u32, ymin: u32, ymax: u32, confidence: f32) -> Detection {
        Detection {
            bbox: BoundingBox::new(xmin, xmax, ymin, ymax),
            confidence,
            class: 0,
        }
    }

    #[test]
    fn largest_area_wins() {
        // Areas 40 and 90: the 90 box must be selected.
        let detections = vec![det(0, 10, 0, 4, 0.99), det(20, 30, 0, 9, 0.50)];
        let picked = largest_detection(&detections).unwrap();
        assert_eq!(picked.bbox.area(), 90);
    }

    #[test]
    fn exact_tie_keeps_confidence_order() {
        let detections = vec![det(0, 10, 0, 10, 0.9), det(50, 60, 50, 60, 0.8)];
        let picked = largest_detection(&detections).unwrap();
        assert_eq!(picked.bbox.xmin, 0);
    }

    #[test]
    fn no_detections_yields_none() {
        assert!(largest_detection(&[]).is_none());
    }
}
