//! The decision policy: a short-circuiting, multi-stage classification of a
//! seat photo into awake / sleeping / seat-empty.
//!
//! Two variants share one contract (`SeatPipeline`) but consult different
//! stages. Both evaluate stages strictly in order, and each stage can end
//! evaluation with a terminal state. With diagnostics enabled the stages
//! keep running after a terminal decision so the overlay and trace cover the
//! whole pipeline, but the first terminal decision is the one returned.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader};
use log::debug;

use crate::error::{Error, Result};
use crate::geometry::{crop_horizontal, crop_vertical};
use crate::models::{
    BoundingBox, EyeState, FaceState, PassengerState, PipelineConfig, Region,
};
use crate::stages::{
    EmptinessDetector, EyeLocator, EyeStateClassifier, FaceLocator, FaceStateClassifier,
    HandDetector, OnnxEyeLocator, OnnxEyeStateClassifier, OnnxFaceLocator,
    OnnxFaceStateClassifier, OnnxHandDetector,
};
use crate::viz::Visualizer;

/// Default output directory for diagnostic overlays.
pub const DEFAULT_VIZ_DIR: &str = "pipeline_eval";

/// A classification input: either a filesystem path (decoded on demand) or
/// an already-decoded buffer. Both are normalized into one internal image
/// representation before any stage runs.
pub enum ImageInput<'a> {
    Path(&'a Path),
    Image(&'a DynamicImage),
}

impl<'a> ImageInput<'a> {
    fn load(&self) -> Result<Cow<'a, DynamicImage>> {
        match self {
            ImageInput::Path(path) => {
                let img = ImageReader::open(path)
                    .map_err(|e| Error::ImageLoad {
                        path: path.to_path_buf(),
                        source: image::ImageError::IoError(e),
                    })?
                    .decode()
                    .map_err(|e| Error::ImageLoad {
                        path: path.to_path_buf(),
                        source: e,
                    })?;
                Ok(Cow::Owned(img))
            }
            ImageInput::Image(img) => Ok(Cow::Borrowed(img)),
        }
    }
}

impl<'a> From<&'a Path> for ImageInput<'a> {
    fn from(path: &'a Path) -> Self {
        ImageInput::Path(path)
    }
}

impl<'a> From<&'a DynamicImage> for ImageInput<'a> {
    fn from(img: &'a DynamicImage) -> Self {
        ImageInput::Image(img)
    }
}

/// Common contract of both pipeline variants.
pub trait SeatPipeline {
    /// Classifies one image. With `diagnostics` set, an annotated composite
    /// and trace are written as a side effect; the returned state is the
    /// same either way.
    fn classify(&self, input: ImageInput<'_>, diagnostics: bool) -> Result<PassengerState>;
}

/// Locations of the model artifacts a pipeline loads at construction.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub reference_map: PathBuf,
    pub face: PathBuf,
    pub eye: PathBuf,
    pub eye_state: PathBuf,
    pub face_state: PathBuf,
    pub hand: PathBuf,
}

impl ModelPaths {
    /// Conventional artifact names inside a model directory.
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            reference_map: dir.join("avgmap.json"),
            face: dir.join("face.onnx"),
            eye: dir.join("eye.onnx"),
            eye_state: dir.join("eye_state.onnx"),
            face_state: dir.join("face_state.onnx"),
            hand: dir.join("hand.onnx"),
        }
    }
}

/// Records the first terminal decision; later settles are ignored. The
/// default when nothing settles is SLEEPING.
#[derive(Default)]
struct Verdict {
    settled: Option<PassengerState>,
}

impl Verdict {
    fn settle(&mut self, state: PassengerState) {
        if self.settled.is_none() {
            self.settled = Some(state);
        }
    }

    fn is_settled(&self) -> bool {
        self.settled.is_some()
    }

    fn state(&self) -> PassengerState {
        self.settled.unwrap_or(PassengerState::Sleeping)
    }
}

/// Full variant: emptiness -> face -> per-eye open/closed -> hands -> default.
pub struct FullPipeline {
    config: PipelineConfig,
    empty: EmptinessDetector,
    face: Box<dyn FaceLocator>,
    eyes: Box<dyn EyeLocator>,
    eye_state: Box<dyn EyeStateClassifier>,
    hands: Box<dyn HandDetector>,
    viz: Visualizer,
}

impl FullPipeline {
    /// Loads every stage model eagerly; any load failure fails construction.
    pub fn new(paths: &ModelPaths, eye_confidence: f32, hand_confidence: f32) -> Result<Self> {
        let config = PipelineConfig {
            eye_confidence,
            hand_confidence,
            ..PipelineConfig::default()
        };
        Self::from_parts(
            config,
            EmptinessDetector::from_artifact(&paths.reference_map)?,
            Box::new(OnnxFaceLocator::load(&paths.face)?),
            Box::new(OnnxEyeLocator::load(&paths.eye)?),
            Box::new(OnnxEyeStateClassifier::load(&paths.eye_state)?),
            Box::new(OnnxHandDetector::load(&paths.hand, hand_confidence)?),
            Visualizer::new(DEFAULT_VIZ_DIR),
        )
    }

    /// Assembles a pipeline from pre-built stage adapters. Used by tests and
    /// by callers supplying an alternative inference backend.
    pub fn from_parts(
        config: PipelineConfig,
        empty: EmptinessDetector,
        face: Box<dyn FaceLocator>,
        eyes: Box<dyn EyeLocator>,
        eye_state: Box<dyn EyeStateClassifier>,
        hands: Box<dyn HandDetector>,
        viz: Visualizer,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            empty,
            face,
            eyes,
            eye_state,
            hands,
            viz,
        })
    }

    pub fn with_viz_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.viz = Visualizer::new(dir);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

impl SeatPipeline for FullPipeline {
    fn classify(&self, input: ImageInput<'_>, diagnostics: bool) -> Result<PassengerState> {
        let img = input.load()?;
        let mut verdict = Verdict::default();
        let mut trace: Vec<String> = Vec::new();

        // 1. Emptiness check.
        let preprocessed = self.empty.preprocess(&img)?;
        if self.empty.is_empty(&preprocessed, self.config.empty_threshold) {
            debug!("seat resembles empty baseline");
            trace.push("Seat looks empty.".into());
            verdict.settle(PassengerState::NotThere);
            if !diagnostics {
                return Ok(verdict.state());
            }
        } else {
            trace.push("Seat is not empty.".into());
        }

        // 2. Face location; face-dependent stages are skipped entirely when
        // nothing is found.
        let face: Option<Region> = self.face.detect(&img)?;
        let mut eye_boxes: Vec<BoundingBox> = Vec::new();

        if let Some(face_region) = &face {
            debug!("face found at {:?}", face_region.bbox);
            trace.push("Face detected.".into());

            // 3. Per-eye open/closed reasoning; any open eye is terminal.
            let eyes = self
                .eyes
                .detect(&face_region.image, self.config.eye_confidence)?;
            if eyes.found() {
                trace.push(format!("{} eye(s) detected.", eyes.regions.len()));
                let mut open = 0usize;
                let mut closed = 0usize;
                for region in &eyes.regions {
                    match self.eye_state.classify(&region.image)? {
                        EyeState::Open => open += 1,
                        EyeState::Closed => closed += 1,
                    }
                }
                if open > 0 {
                    debug!("{open} open eye(s), {closed} closed");
                    trace.push(format!("{open} open, {closed} closed."));
                    verdict.settle(PassengerState::Awake);
                    if !diagnostics {
                        return Ok(verdict.state());
                    }
                } else {
                    trace.push("All eyes closed.".into());
                }
            } else {
                trace.push("No eyes detected.".into());
            }
            eye_boxes = eyes.boxes;
        } else {
            trace.push("No face detected.".into());
        }

        // 4. Hand detection on the cropped window of the original frame.
        let cropped = crop_horizontal(
            &crop_vertical(&img, self.config.vertical_keep),
            self.config.horizontal_keep,
        );
        let hand_boxes = self.hands.detect(&cropped)?;
        if hand_boxes.is_empty() {
            trace.push("No hands detected in cropped image.".into());
        } else {
            debug!("{} hand(s) found in cropped window", hand_boxes.len());
            trace.push(format!(
                "{} hand(s) detected in cropped image.",
                hand_boxes.len()
            ));
            verdict.settle(PassengerState::Awake);
            if !diagnostics {
                return Ok(verdict.state());
            }
        }

        // 5. Default: no positive evidence means SLEEPING.
        let state = verdict.state();
        if diagnostics {
            self.viz.render(
                &img,
                face.as_ref().map(|f| &f.bbox),
                &eye_boxes,
                &hand_boxes,
                &self.config,
                state,
                &trace,
            )?;
        }
        Ok(state)
    }
}

/// No-eye variant: emptiness -> face -> whole-face classification -> default.
/// A detected face always yields a terminal decision, so this variant never
/// consults a hand stage.
pub struct NoEyePipeline {
    config: PipelineConfig,
    empty: EmptinessDetector,
    face: Box<dyn FaceLocator>,
    face_state: Box<dyn FaceStateClassifier>,
    viz: Visualizer,
}

impl NoEyePipeline {
    pub fn new(paths: &ModelPaths) -> Result<Self> {
        Self::from_parts(
            PipelineConfig::default(),
            EmptinessDetector::from_artifact(&paths.reference_map)?,
            Box::new(OnnxFaceLocator::load(&paths.face)?),
            Box::new(OnnxFaceStateClassifier::load(&paths.face_state)?),
            Visualizer::new(DEFAULT_VIZ_DIR),
        )
    }

    pub fn from_parts(
        config: PipelineConfig,
        empty: EmptinessDetector,
        face: Box<dyn FaceLocator>,
        face_state: Box<dyn FaceStateClassifier>,
        viz: Visualizer,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            empty,
            face,
            face_state,
            viz,
        })
    }

    pub fn with_viz_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.viz = Visualizer::new(dir);
        self
    }
}

impl SeatPipeline for NoEyePipeline {
    fn classify(&self, input: ImageInput<'_>, diagnostics: bool) -> Result<PassengerState> {
        let img = input.load()?;
        let mut verdict = Verdict::default();
        let mut trace: Vec<String> = Vec::new();

        let preprocessed = self.empty.preprocess(&img)?;
        if self.empty.is_empty(&preprocessed, self.config.empty_threshold) {
            debug!("seat resembles empty baseline");
            trace.push("Seat looks empty.".into());
            verdict.settle(PassengerState::NotThere);
            if !diagnostics {
                return Ok(verdict.state());
            }
        } else {
            trace.push("Seat is not empty.".into());
        }

        let face: Option<Region> = self.face.detect(&img)?;
        if let Some(face_region) = &face {
            trace.push("Face detected.".into());
            match self.face_state.classify(&face_region.image)? {
                FaceState::Awake => {
                    trace.push("Face classified as awake.".into());
                    verdict.settle(PassengerState::Awake);
                }
                FaceState::Sleeping => {
                    trace.push("Face classified as sleeping.".into());
                    verdict.settle(PassengerState::Sleeping);
                }
            }
            if verdict.is_settled() && !diagnostics {
                return Ok(verdict.state());
            }
        } else {
            trace.push("No face detected.".into());
        }

        let state = verdict.state();
        if diagnostics {
            self.viz.render(
                &img,
                face.as_ref().map(|f| &f.bbox),
                &[],
                &[],
                &self.config,
                state,
                &trace,
            )?;
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_keeps_first_terminal() {
        let mut v = Verdict::default();
        assert!(!v.is_settled());
        v.settle(PassengerState::NotThere);
        v.settle(PassengerState::Awake);
        assert_eq!(v.state(), PassengerState::NotThere);
    }

    #[test]
    fn unsettled_verdict_defaults_to_sleeping() {
        assert_eq!(Verdict::default().state(), PassengerState::Sleeping);
    }

    #[test]
    fn missing_path_is_an_image_load_error() {
        let input = ImageInput::Path(Path::new("/nonexistent/seat.jpg"));
        assert!(matches!(input.load(), Err(Error::ImageLoad { .. })));
    }
}
