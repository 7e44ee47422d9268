#![allow(dead_code)]

use std::cell::RefCell;

use image::DynamicImage;

use seatstate::stages::{
    EmptinessDetector, EyeLocator, EyeStateClassifier, FaceLocator, FaceStateClassifier,
    HandDetector, ReferenceMap,
};
use seatstate::{BoundingBox, DetectionResult, EyeState, FaceState, Region, Result};

/// Uniform grayscale test frame.
pub fn gray(width: u32, height: u32, value: u8) -> DynamicImage {
    DynamicImage::ImageLuma8(image::GrayImage::from_pixel(
        width,
        height,
        image::Luma([value]),
    ))
}

/// Frame that matches the reference map (mean 0.5): classified as empty.
pub fn empty_seat_frame() -> DynamicImage {
    gray(64, 64, 128)
}

/// Frame far from the reference map: classified as occupied.
pub fn occupied_seat_frame() -> DynamicImage {
    gray(64, 64, 250)
}

/// Emptiness detector whose baseline is a uniform mid-gray seat.
pub fn emptiness_detector() -> EmptinessDetector {
    let map = ReferenceMap::new(8, 8, vec![0.5; 64]).unwrap();
    EmptinessDetector::new(map)
}

pub fn region(xmin: u32, xmax: u32, ymin: u32, ymax: u32) -> Region {
    let bbox = BoundingBox::new(xmin, xmax, ymin, ymax);
    Region {
        image: gray(bbox.width().max(1), bbox.height().max(1), 100),
        bbox,
    }
}

pub fn eye_detections(boxes: &[BoundingBox]) -> DetectionResult {
    DetectionResult {
        regions: boxes
            .iter()
            .map(|b| Region {
                image: gray(b.width().max(1), b.height().max(1), 100),
                bbox: *b,
            })
            .collect(),
        boxes: boxes.to_vec(),
    }
}

/// Face locator returning a fixed region (or none).
pub struct StubFace(pub Option<Region>);

impl FaceLocator for StubFace {
    fn detect(&self, _img: &DynamicImage) -> Result<Option<Region>> {
        Ok(self.0.clone())
    }
}

/// Eye locator returning a fixed detection result.
pub struct StubEyes(pub DetectionResult);

impl EyeLocator for StubEyes {
    fn detect(&self, _face: &DynamicImage, _confidence: f32) -> Result<DetectionResult> {
        Ok(self.0.clone())
    }
}

/// Eye-state classifier replaying a fixed label sequence, one per call.
pub struct StubEyeStates {
    labels: Vec<EyeState>,
    next: RefCell<usize>,
}

impl StubEyeStates {
    pub fn new(labels: Vec<EyeState>) -> Self {
        Self {
            labels,
            next: RefCell::new(0),
        }
    }
}

impl EyeStateClassifier for StubEyeStates {
    fn classify(&self, _eye: &DynamicImage) -> Result<EyeState> {
        let mut next = self.next.borrow_mut();
        let label = self.labels[*next % self.labels.len()];
        *next += 1;
        Ok(label)
    }
}

/// Face-state classifier returning a fixed label.
pub struct StubFaceState(pub FaceState);

impl FaceStateClassifier for StubFaceState {
    fn classify(&self, _face: &DynamicImage) -> Result<FaceState> {
        Ok(self.0)
    }
}

/// Hand detector returning fixed boxes.
pub struct StubHands(pub Vec<BoundingBox>);

impl HandDetector for StubHands {
    fn detect(&self, _img: &DynamicImage) -> Result<Vec<BoundingBox>> {
        Ok(self.0.clone())
    }
}
