//! Diagnostic overlays: every reported box remapped into the original frame,
//! drawn on a copy, written as a side-by-side [original | annotated]
//! composite. A sibling `.txt` carries the stage trace. Pure side effect;
//! the returned classification never depends on it.

use std::fs;
use std::path::{Path, PathBuf};

use image::{imageops, DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use log::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::geometry::{remap_box_to_parent, remap_eye_box_to_original};
use crate::models::{BoundingBox, PassengerState, PipelineConfig};

const FACE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const EYE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const HAND_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

pub struct Visualizer {
    output_dir: PathBuf,
}

impl Visualizer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Renders the composite and trace for one classification.
    ///
    /// `eye_boxes` are in the face region's frame (ignored without a face
    /// box, since they cannot be placed); `hand_boxes` are in the cropped
    /// hand-detection frame and are remapped with the crop fractions that
    /// produced it.
    pub fn render(
        &self,
        original: &DynamicImage,
        face_box: Option<&BoundingBox>,
        eye_boxes: &[BoundingBox],
        hand_boxes: &[BoundingBox],
        config: &PipelineConfig,
        state: PassengerState,
        trace: &[String],
    ) -> Result<PathBuf> {
        let base = original.to_rgb8();
        let mut annotated = base.clone();

        if let Some(face) = face_box {
            draw_box(&mut annotated, face, FACE_COLOR);
            for eye in eye_boxes {
                let mapped = remap_eye_box_to_original(eye, face);
                draw_box(&mut annotated, &mapped, EYE_COLOR);
            }
        }
        for hand in hand_boxes {
            let mapped = remap_box_to_parent(
                hand,
                original.width(),
                original.height(),
                config.horizontal_keep,
                config.vertical_keep,
            );
            draw_box(&mut annotated, &mapped, HAND_COLOR);
        }

        let (w, h) = (base.width(), base.height());
        let mut combined = RgbImage::new(w * 2, h);
        imageops::replace(&mut combined, &base, 0, 0);
        imageops::replace(&mut combined, &annotated, w as i64, 0);

        fs::create_dir_all(&self.output_dir).map_err(|e| Error::Diagnostics(e.to_string()))?;
        let stem = format!("{}_{}", state.as_str(), Uuid::new_v4());
        let image_path = self.output_dir.join(format!("{stem}.jpg"));
        combined
            .save(&image_path)
            .map_err(|e| Error::Diagnostics(e.to_string()))?;
        fs::write(self.output_dir.join(format!("{stem}.txt")), trace.join("\n"))
            .map_err(|e| Error::Diagnostics(e.to_string()))?;

        debug!("wrote diagnostic overlay to {}", image_path.display());
        Ok(image_path)
    }
}

/// 2px hollow rectangle, clipped to the image.
fn draw_box(img: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    for inset in 0..2u32 {
        let xmin = bbox.xmin.saturating_add(inset);
        let ymin = bbox.ymin.saturating_add(inset);
        let xmax = bbox.xmax.saturating_sub(inset);
        let ymax = bbox.ymax.saturating_sub(inset);
        if xmax <= xmin || ymax <= ymin {
            continue;
        }
        let rect = Rect::at(xmin as i32, ymin as i32).of_size(xmax - xmin, ymax - ymin);
        draw_hollow_rect_mut(img, rect, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_writes_composite_and_trace() {
        let dir = tempfile::TempDir::new().unwrap();
        let viz = Visualizer::new(dir.path());
        let img = DynamicImage::new_rgb8(64, 48);
        let face = BoundingBox::new(10, 30, 10, 30);
        let eyes = vec![BoundingBox::new(2, 8, 4, 8)];
        let hands = vec![BoundingBox::new(1, 9, 1, 9)];

        let path = viz
            .render(
                &img,
                Some(&face),
                &eyes,
                &hands,
                &PipelineConfig::default(),
                PassengerState::Sleeping,
                &["Face detected.".to_string()],
            )
            .unwrap();

        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("sleeping_"));
        assert!(name.ends_with(".jpg"));
        assert!(path.with_extension("txt").exists());

        let composite = image::open(&path).unwrap();
        assert_eq!(composite.width(), 128);
        assert_eq!(composite.height(), 48);
    }
}
