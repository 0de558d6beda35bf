//! Landmark-driven preparation of the frame for the acne detector.
//!
//! The detector fires on eyes, nostrils and lips as readily as on lesions.
//! Those features are painted over with flat ellipses placed from the face
//! keypoints, and the frame is cropped to the (padded) face box so background
//! texture never reaches the detector.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_ellipse_mut;
use serde::Serialize;

use crate::pipeline::bbox::BoundingBox;
use crate::pipeline::face::{largest_face, FaceBbox, Landmark};

/// Fraction of the face box added on every side before cropping.
pub const CROP_MARGIN: f32 = 0.15;

const MASK_COLOR: Rgb<u8> = Rgb([128, 128, 128]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }

    /// Face box grown by [`CROP_MARGIN`] per side, clamped to the frame.
    pub fn from_face(bbox: &BoundingBox, frame_w: u32, frame_h: u32) -> Self {
        let mx = bbox.width().max(0.0) * CROP_MARGIN;
        let my = bbox.height().max(0.0) * CROP_MARGIN;
        let x1 = (bbox.x1 - mx).floor().clamp(0.0, frame_w as f32) as u32;
        let y1 = (bbox.y1 - my).floor().clamp(0.0, frame_h as f32) as u32;
        let x2 = (bbox.x2 + mx).ceil().clamp(0.0, frame_w as f32) as u32;
        let y2 = (bbox.y2 + my).ceil().clamp(0.0, frame_h as f32) as u32;
        if x2 <= x1 || y2 <= y1 {
            return Self::full_frame(frame_w, frame_h);
        }
        Self { x: x1, y: y1, width: x2 - x1, height: y2 - y1 }
    }
}

#[derive(Debug, Clone)]
pub struct PreparedFace {
    pub image: DynamicImage,
    pub region: FaceRegion,
    pub face_found: bool,
}

fn distance(a: &Landmark, b: &Landmark) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Paint over both eyes and the mouth. Sizes scale with inter-ocular distance.
pub fn mask_features(img: &mut RgbImage, landmarks: &[Landmark; 5]) {
    let [left_eye, right_eye, _nose, left_mouth, right_mouth] = landmarks;
    let eye_span = distance(left_eye, right_eye);
    if eye_span < 2.0 {
        return;
    }

    let eye_rx = (eye_span * 0.30).round() as i32;
    let eye_ry = (eye_span * 0.18).round() as i32;
    for eye in [left_eye, right_eye] {
        draw_filled_ellipse_mut(img, (eye.x.round() as i32, eye.y.round() as i32), eye_rx, eye_ry, MASK_COLOR);
    }

    let mouth_cx = (left_mouth.x + right_mouth.x) / 2.0;
    let mouth_cy = (left_mouth.y + right_mouth.y) / 2.0;
    let mouth_rx = (distance(left_mouth, right_mouth) * 0.65).max(eye_span * 0.3).round() as i32;
    let mouth_ry = (eye_span * 0.22).round() as i32;
    draw_filled_ellipse_mut(img, (mouth_cx.round() as i32, mouth_cy.round() as i32), mouth_rx, mouth_ry, MASK_COLOR);
}

/// Mask the largest face and crop to it. Without a face the whole frame
/// is returned untouched.
pub fn prepare_face(img: &DynamicImage, faces: &[FaceBbox]) -> PreparedFace {
    let (w, h) = (img.width(), img.height());
    let Some(face) = largest_face(faces) else {
        return PreparedFace { image: img.clone(), region: FaceRegion::full_frame(w, h), face_found: false };
    };

    let mut rgb = img.to_rgb8();
    if let Some(lms) = &face.landmarks {
        mask_features(&mut rgb, lms);
    }
    let region = FaceRegion::from_face(&face.bbox, w, h);
    let cropped = image::imageops::crop_imm(&rgb, region.x, region.y, region.width, region.height).to_image();
    PreparedFace { image: DynamicImage::ImageRgb8(cropped), region, face_found: true }
}
