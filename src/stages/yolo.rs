//! Shared tract-onnx wrapper for the YOLO-style detectors (face, eye, hand).
//!
//! The exported models take a square RGB input, NCHW, values in [0, 1], and
//! emit a `[1, n, 5 + num_classes]` tensor of candidate rows
//! `(cx, cy, w, h, objectness, class scores...)` in input-pixel coordinates.
//! Decoding and non-maximum suppression are pure functions so they can be
//! exercised without a model file.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage};
use tract_onnx::prelude::*;

use crate::error::{Error, Result};
use crate::models::BoundingBox;

const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

/// One decoded detection in the source image's frame.
#[derive(Debug, Clone, Copy)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub class: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    cx: f32,
    cy: f32,
    w: f32,
    h: f32,
    score: f32,
    class: usize,
}

/// A loaded, runnable YOLO plan plus its decode parameters.
pub struct YoloDetector {
    plan: TypedSimplePlan<TypedModel>,
    name: &'static str,
    input_size: u32,
    confidence: f32,
    iou: f32,
}

impl YoloDetector {
    /// Loads and optimizes an ONNX model; fails with `ModelUnavailable` if
    /// the artifact is missing or malformed.
    pub fn load(path: &Path, name: &'static str, input_size: u32, confidence: f32) -> Result<Self> {
        let size = input_size as usize;
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| {
                m.with_input_fact(
                    0,
                    InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
                )
            })
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| Error::model_unavailable(name, format!("{}: {}", path.display(), e)))?;

        Ok(Self {
            plan,
            name,
            input_size,
            confidence,
            iou: DEFAULT_IOU_THRESHOLD,
        })
    }

    /// Runs detection with the detector's own confidence floor.
    pub fn detect(&self, img: &DynamicImage) -> Result<Vec<Detection>> {
        self.detect_with_confidence(img, self.confidence)
    }

    /// Runs detection with a caller-supplied confidence floor. The floor
    /// never drops below the detector's own.
    pub fn detect_with_confidence(
        &self,
        img: &DynamicImage,
        confidence: f32,
    ) -> Result<Vec<Detection>> {
        let (src_w, src_h) = (img.width(), img.height());
        if src_w == 0 || src_h == 0 {
            return Err(Error::inference(self.name, "zero-sized input image"));
        }

        let input = self.build_input(img);
        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| Error::inference(self.name, e))?;
        let output = outputs
            .first()
            .ok_or_else(|| Error::inference(self.name, "model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| Error::inference(self.name, e))?;

        let shape = view.shape();
        if shape.len() != 3 || shape[0] != 1 || shape[2] < 5 {
            return Err(Error::inference(
                self.name,
                format!("unexpected output shape {:?}", shape),
            ));
        }
        let stride = shape[2];
        let data: Vec<f32> = view.iter().copied().collect();

        let floor = confidence.max(self.confidence);
        let candidates = decode_rows(&data, stride, floor);
        let kept = nms(candidates, self.iou);

        let scale_x = src_w as f32 / self.input_size as f32;
        let scale_y = src_h as f32 / self.input_size as f32;
        Ok(kept
            .into_iter()
            .map(|c| Detection {
                bbox: candidate_to_bbox(&c, scale_x, scale_y, src_w, src_h),
                confidence: c.score,
                class: c.class,
            })
            .collect())
    }

    fn build_input(&self, img: &DynamicImage) -> Tensor {
        let size = self.input_size;
        let resized = img
            .resize_exact(size, size, FilterType::Triangle)
            .to_rgb8();
        let size = size as usize;
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
            resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
        });
        input.into_tensor()
    }
}

/// Filters candidate rows by combined objectness * best-class score,
/// keeping detector-confidence order.
fn decode_rows(data: &[f32], stride: usize, confidence: f32) -> Vec<Candidate> {
    let mut out = Vec::new();
    for row in data.chunks_exact(stride) {
        let objectness = row[4];
        let (class, class_score) = if stride > 5 {
            row[5..]
                .iter()
                .enumerate()
                .fold((0usize, f32::NEG_INFINITY), |best, (i, &s)| {
                    if s > best.1 {
                        (i, s)
                    } else {
                        best
                    }
                })
        } else {
            (0, 1.0)
        };
        let score = objectness * class_score;
        if score >= confidence {
            out.push(Candidate {
                cx: row[0],
                cy: row[1],
                w: row[2],
                h: row[3],
                score,
                class,
            });
        }
    }
    out
}

/// Greedy class-agnostic non-maximum suppression.
fn nms(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut kept: Vec<Candidate> = Vec::new();
    for c in candidates {
        if kept.iter().all(|k| iou(k, &c) <= iou_threshold) {
            kept.push(c);
        }
    }
    kept
}

fn iou(a: &Candidate, b: &Candidate) -> f32 {
    let (ax0, ax1) = (a.cx - a.w / 2.0, a.cx + a.w / 2.0);
    let (ay0, ay1) = (a.cy - a.h / 2.0, a.cy + a.h / 2.0);
    let (bx0, bx1) = (b.cx - b.w / 2.0, b.cx + b.w / 2.0);
    let (by0, by1) = (b.cy - b.h / 2.0, b.cy + b.h / 2.0);

    let inter_w = (ax1.min(bx1) - ax0.max(bx0)).max(0.0);
    let inter_h = (ay1.min(by1) - ay0.max(by0)).max(0.0);
    let inter = inter_w * inter_h;
    let union = a.w * a.h + b.w * b.h - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

fn candidate_to_bbox(
    c: &Candidate,
    scale_x: f32,
    scale_y: f32,
    src_w: u32,
    src_h: u32,
) -> BoundingBox {
    let xmin = ((c.cx - c.w / 2.0) * scale_x).max(0.0) as u32;
    let xmax = (((c.cx + c.w / 2.0) * scale_x) as u32).min(src_w.saturating_sub(1));
    let ymin = ((c.cy - c.h / 2.0) * scale_y).max(0.0) as u32;
    let ymax = (((c.cy + c.h / 2.0) * scale_y) as u32).min(src_h.saturating_sub(1));
    BoundingBox::new(xmin.min(xmax), xmax, ymin.min(ymax), ymax)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_fails_load() {
        let err = YoloDetector::load(Path::new("/nonexistent/face.onnx"), "face", 640, 0.5);
        assert!(matches!(err, Err(Error::ModelUnavailable { .. })));
    }

    fn row(cx: f32, cy: f32, w: f32, h: f32, obj: f32, classes: &[f32]) -> Vec<f32> {
        let mut r = vec![cx, cy, w, h, obj];
        r.extend_from_slice(classes);
        r
    }

    #[test]
    fn decode_filters_by_combined_score() {
        let mut data = row(100.0, 100.0, 20.0, 20.0, 0.9, &[0.9]);
        data.extend(row(50.0, 50.0, 10.0, 10.0, 0.9, &[0.1]));
        let candidates = decode_rows(&data, 6, 0.5);
        assert_eq!(candidates.len(), 1);
        assert!((candidates[0].cx - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn decode_picks_best_class() {
        let data = row(10.0, 10.0, 4.0, 4.0, 1.0, &[0.2, 0.8, 0.1]);
        let candidates = decode_rows(&data, 8, 0.5);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].class, 1);
    }

    #[test]
    fn decode_without_class_scores_uses_objectness() {
        let data = row(10.0, 10.0, 4.0, 4.0, 0.7, &[]);
        let candidates = decode_rows(&data, 5, 0.5);
        assert_eq!(candidates.len(), 1);
        assert!((candidates[0].score - 0.7).abs() < 1e-6);
    }

    #[test]
    fn nms_suppresses_overlapping_boxes() {
        let mut data = row(100.0, 100.0, 40.0, 40.0, 0.9, &[1.0]);
        data.extend(row(102.0, 102.0, 40.0, 40.0, 0.8, &[1.0]));
        data.extend(row(300.0, 300.0, 40.0, 40.0, 0.7, &[1.0]));
        let candidates = decode_rows(&data, 6, 0.25);
        let kept = nms(candidates, 0.45);
        assert_eq!(kept.len(), 2);
        // Highest-scoring overlap survives.
        assert!((kept[0].score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn bbox_rescales_and_clamps_to_source() {
        let c = Candidate {
            cx: 320.0,
            cy: 320.0,
            w: 700.0,
            h: 100.0,
            score: 1.0,
            class: 0,
        };
        // 640 -> 320 halves every coordinate; width clamps to the frame.
        let bbox = candidate_to_bbox(&c, 0.5, 0.5, 320, 320);
        assert_eq!(bbox.xmin, 0);
        assert_eq!(bbox.xmax, 319);
        assert_eq!(bbox.ymin, 135);
        assert_eq!(bbox.ymax, 185);
    }
}
