//! Stage adapters: thin wrappers around the perception models.
//!
//! Each trait is a seam between the orchestrator and one model. Adapters are
//! stateless per call; their weights are fixed for the pipeline's lifetime.
//! A failed forward pass surfaces as `Error::Inference` and aborts the
//! classification call; the orchestrator never absorbs it.

pub mod classifier;
pub mod empty;
pub mod eye;
pub mod face;
pub mod hand;
pub mod yolo;

use image::DynamicImage;

use crate::error::Result;
use crate::models::{BoundingBox, DetectionResult, EyeState, FaceState, Region};

pub use empty::{EmptinessDetector, ReferenceMap};
pub use eye::{OnnxEyeLocator, OnnxEyeStateClassifier};
pub use face::{OnnxFaceLocator, OnnxFaceStateClassifier};
pub use hand::OnnxHandDetector;
pub use yolo::{Detection, YoloDetector};

/// Locates at most one face: the detection with the largest bounding box.
pub trait FaceLocator {
    fn detect(&self, img: &DynamicImage) -> Result<Option<Region>>;
}

/// Locates eye regions inside a face sub-image. Boxes are in the face
/// region's frame; zero, one, or two regions are all normal outcomes.
pub trait EyeLocator {
    fn detect(&self, face: &DynamicImage, confidence: f32) -> Result<DetectionResult>;
}

/// Classifies a single eye region as open or closed. The "any open eye"
/// rule is the orchestrator's job, not this adapter's.
pub trait EyeStateClassifier {
    fn classify(&self, eye: &DynamicImage) -> Result<EyeState>;
}

/// Classifies a whole face region as awake or sleeping (no-eye variant).
pub trait FaceStateClassifier {
    fn classify(&self, face: &DynamicImage) -> Result<FaceState>;
}

/// Detects hands in an (already cropped) frame. Boxes are in the input
/// image's own frame.
pub trait HandDetector {
    fn detect(&self, img: &DynamicImage) -> Result<Vec<BoundingBox>>;
}
