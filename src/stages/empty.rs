//! Emptiness detection against a precomputed average-pixel map.
//!
//! An empty seat photographed from a fixed camera looks almost identical
//! across frames, so the detector compares the incoming image against the
//! per-pixel mean of many empty-seat shots. A small mean absolute difference
//! means the seat resembles its empty baseline.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::{imageops::FilterType, DynamicImage};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Per-pixel mean of empty-seat reference shots, grayscale, values in [0, 1],
/// row-major. Loaded once at pipeline construction and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceMap {
    pub width: u32,
    pub height: u32,
    pub mean: Vec<f32>,
}

impl ReferenceMap {
    pub fn new(width: u32, height: u32, mean: Vec<f32>) -> Result<Self> {
        if mean.len() != (width as usize) * (height as usize) {
            return Err(Error::Config(format!(
                "reference map has {} values for {}x{} pixels",
                mean.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            mean,
        })
    }

    /// Loads the map from its JSON artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| Error::model_unavailable("reference-map", format!("{}: {}", path.display(), e)))?;
        let map: ReferenceMap = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::model_unavailable("reference-map", format!("{}: {}", path.display(), e)))?;
        if map.mean.len() != (map.width as usize) * (map.height as usize) {
            return Err(Error::model_unavailable(
                "reference-map",
                format!(
                    "artifact {} holds {} values for {}x{} pixels",
                    path.display(),
                    map.mean.len(),
                    map.width,
                    map.height
                ),
            ));
        }
        Ok(map)
    }
}

/// Pixel-difference emptiness check. Owns the reference map for the
/// pipeline's lifetime; performs no I/O per call.
pub struct EmptinessDetector {
    map: ReferenceMap,
}

impl EmptinessDetector {
    pub fn new(map: ReferenceMap) -> Self {
        Self { map }
    }

    pub fn from_artifact(path: &Path) -> Result<Self> {
        Ok(Self::new(ReferenceMap::load(path)?))
    }

    /// Downsamples to the map's dimensions, grayscale, normalized to [0, 1].
    pub fn preprocess(&self, img: &DynamicImage) -> Result<Vec<f32>> {
        if img.width() == 0 || img.height() == 0 {
            return Err(Error::inference("emptiness", "zero-sized input image"));
        }
        let small = img
            .resize_exact(self.map.width, self.map.height, FilterType::Triangle)
            .to_luma8();
        Ok(small.pixels().map(|p| p[0] as f32 / 255.0).collect())
    }

    /// True when the mean absolute difference against the reference map
    /// falls below `threshold`.
    pub fn is_empty(&self, preprocessed: &[f32], threshold: f32) -> bool {
        debug_assert_eq!(preprocessed.len(), self.map.mean.len());
        let diff: f32 = preprocessed
            .iter()
            .zip(&self.map.mean)
            .map(|(a, b)| (a - b).abs())
            .sum();
        diff / (self.map.mean.len() as f32) < threshold
    }
}
