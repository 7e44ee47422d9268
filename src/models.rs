use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Terminal classification of a seat photo.
///
/// `NotThere` wins the moment emptiness is confirmed; `Awake` is only ever
/// assigned on positive evidence (open eye, detected hand, or a face
/// classified as awake); `Sleeping` is the default in the absence of both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassengerState {
    Awake,
    Sleeping,
    NotThere,
}

impl PassengerState {
    /// Lowercase name, used for diagnostic filenames and batch tallies.
    pub fn as_str(&self) -> &'static str {
        match self {
            PassengerState::Awake => "awake",
            PassengerState::Sleeping => "sleeping",
            PassengerState::NotThere => "notthere",
        }
    }
}

impl std::fmt::Display for PassengerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned box in pixel coordinates of some reference frame.
///
/// The frame (original image vs. a named crop) is implicit; boxes from
/// different frames must be remapped (see `geometry`) before being mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub xmin: u32,
    pub xmax: u32,
    pub ymin: u32,
    pub ymax: u32,
}

impl BoundingBox {
    pub fn new(xmin: u32, xmax: u32, ymin: u32, ymax: u32) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    pub fn width(&self) -> u32 {
        self.xmax.saturating_sub(self.xmin)
    }

    pub fn height(&self) -> u32 {
        self.ymax.saturating_sub(self.ymin)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

/// An extracted sub-image plus the box it was cut from, in the frame of its
/// immediate parent.
#[derive(Clone)]
pub struct Region {
    pub image: DynamicImage,
    pub bbox: BoundingBox,
}

/// Output of a detect-style stage: regions and their boxes in
/// detector-confidence order. The sequences are index-aligned.
#[derive(Clone, Default)]
pub struct DetectionResult {
    pub regions: Vec<Region>,
    pub boxes: Vec<BoundingBox>,
}

impl DetectionResult {
    pub fn found(&self) -> bool {
        !self.regions.is_empty()
    }
}

/// Per-eye classification label. Open eyes carry label 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeState {
    Closed,
    Open,
}

/// Whole-face classification label, used by the no-eye pipeline variant.
/// Awake faces carry label 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceState {
    Awake,
    Sleeping,
}

/// Immutable pipeline configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pixel-difference threshold below which the seat counts as empty.
    pub empty_threshold: f32,
    /// Confidence floor for eye detection inside the face region.
    pub eye_confidence: f32,
    /// Confidence floor for hand detection in the cropped frame.
    pub hand_confidence: f32,
    /// Fraction of rows kept (from the top) before hand detection.
    pub vertical_keep: f32,
    /// Fraction of columns kept (middle window) before hand detection.
    pub horizontal_keep: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            empty_threshold: 0.08,
            eye_confidence: 0.25,
            hand_confidence: 0.40,
            vertical_keep: 0.8,
            horizontal_keep: 0.5,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("empty_threshold", self.empty_threshold),
            ("eye_confidence", self.eye_confidence),
            ("hand_confidence", self.hand_confidence),
            ("vertical_keep", self.vertical_keep),
            ("horizontal_keep", self.horizontal_keep),
        ];
        for (name, value) in checks {
            if !(value > 0.0 && value <= 1.0) {
                return Err(Error::Config(format!(
                    "{} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_dimensions() {
        let b = BoundingBox::new(10, 40, 5, 25);
        assert_eq!(b.width(), 30);
        assert_eq!(b.height(), 20);
        assert_eq!(b.area(), 600);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn config_rejects_out_of_range_values() {
        let mut config = PipelineConfig::default();
        config.empty_threshold = 0.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config = PipelineConfig::default();
        config.hand_confidence = 1.5;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn state_names_are_lowercase() {
        assert_eq!(PassengerState::Awake.as_str(), "awake");
        assert_eq!(PassengerState::Sleeping.as_str(), "sleeping");
        assert_eq!(PassengerState::NotThere.as_str(), "notthere");
    }

    #[test]
    fn empty_detection_result_reports_not_found() {
        let empty = DetectionResult::default();
        assert!(!empty.found());
    }
}
