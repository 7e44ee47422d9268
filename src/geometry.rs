//! Crop windows and bounding-box remapping between coordinate frames.
//!
//! The hand-detection stage looks at a sub-window of the original frame:
//! the top `vertical_keep` fraction of rows, then the middle
//! `horizontal_keep` fraction of columns. Boxes measured inside that window
//! must be remapped before they can be drawn on the original image, and the
//! remap must be the exact inverse of the crop actually applied upstream.

use image::DynamicImage;

use crate::models::BoundingBox;

/// Keeps the top `keep` fraction of rows.
pub fn crop_vertical(img: &DynamicImage, keep: f32) -> DynamicImage {
    let height = ((img.height() as f32) * keep) as u32;
    img.crop_imm(0, 0, img.width(), height.max(1))
}

/// Keeps the middle `keep` fraction of columns.
pub fn crop_horizontal(img: &DynamicImage, keep: f32) -> DynamicImage {
    let width = img.width() as f32;
    let xmin = (width * (1.0 - keep) / 2.0) as u32;
    let xmax = (width * (1.0 + keep) / 2.0) as u32;
    img.crop_imm(xmin, 0, (xmax - xmin).max(1), img.height())
}

/// Maps a box measured in a cropped child frame back into its parent frame.
///
/// The horizontal crop is symmetric, so x-coordinates shift by
/// `parent_width * (1 - horizontal_keep) / 2`. The vertical crop truncates
/// from the bottom only, so child rows already sit in the parent frame and
/// the y-offset is 0. `vertical_keep` is accepted to mirror the crop call
/// site; it does not contribute an offset under this cropping scheme.
pub fn remap_box_to_parent(
    bbox: &BoundingBox,
    parent_width: u32,
    _parent_height: u32,
    horizontal_keep: f32,
    _vertical_keep: f32,
) -> BoundingBox {
    let x_off = ((parent_width as f32) * (1.0 - horizontal_keep) / 2.0) as u32;
    BoundingBox::new(
        bbox.xmin + x_off,
        bbox.xmax + x_off,
        bbox.ymin,
        bbox.ymax,
    )
}

/// Maps an eye box from the face region's frame into the original frame.
///
/// Eye boxes are reported relative to the face sub-image, whose absolute
/// position is already known, so this is a plain offset rather than a
/// crop-fraction remap.
pub fn remap_eye_box_to_original(eye_bbox: &BoundingBox, face_bbox: &BoundingBox) -> BoundingBox {
    BoundingBox::new(
        eye_bbox.xmin + face_bbox.xmin,
        eye_bbox.xmax + face_bbox.xmin,
        eye_bbox.ymin + face_bbox.ymin,
        eye_bbox.ymax + face_bbox.ymin,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    fn blank(width: u32, height: u32) -> DynamicImage {
        DynamicImage::new_rgb8(width, height)
    }

    #[test]
    fn vertical_crop_keeps_top_rows() {
        let cropped = crop_vertical(&blank(100, 100), 0.8);
        assert_eq!(cropped.width(), 100);
        assert_eq!(cropped.height(), 80);
    }

    #[test]
    fn horizontal_crop_keeps_middle_columns() {
        let cropped = crop_horizontal(&blank(100, 100), 0.5);
        assert_eq!(cropped.width(), 50);
        assert_eq!(cropped.height(), 100);
    }

    #[test]
    fn remap_inverts_horizontal_crop() {
        // Parent width 100, keep 0.5 => offset 25.
        let child = BoundingBox::new(0, 10, 0, 10);
        let parent = remap_box_to_parent(&child, 100, 100, 0.5, 0.8);
        assert_eq!(parent, BoundingBox::new(25, 35, 0, 10));
    }

    #[test]
    fn remap_applies_no_vertical_offset() {
        let child = BoundingBox::new(5, 15, 20, 30);
        let parent = remap_box_to_parent(&child, 200, 150, 0.5, 0.8);
        assert_eq!(parent.ymin, 20);
        assert_eq!(parent.ymax, 30);
        assert_eq!(parent.xmin, 55);
        assert_eq!(parent.xmax, 65);
    }

    #[test]
    fn eye_remap_adds_face_offsets() {
        let eye = BoundingBox::new(4, 14, 6, 12);
        let face = BoundingBox::new(100, 180, 50, 130);
        let mapped = remap_eye_box_to_original(&eye, &face);
        assert_eq!(mapped, BoundingBox::new(104, 114, 56, 62));
    }

    #[test]
    fn crop_then_remap_reproduces_parent_location() {
        // A box at columns 30..40 of the parent lands at 5..15 in the child
        // after keeping the middle 50% of a 100-wide image.
        let child_box = BoundingBox::new(5, 15, 10, 20);
        let mapped = remap_box_to_parent(&child_box, 100, 100, 0.5, 1.0);
        assert_eq!(mapped, BoundingBox::new(30, 40, 10, 20));
    }
}
