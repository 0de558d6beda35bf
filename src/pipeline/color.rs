//! Luma conversion shared by the quality gate and enhancement.
//!
//! Both use BT.601 weights (the ones OpenCV's `COLOR_RGB2GRAY` uses), so the
//! brightness and sharpness thresholds mean the same thing everywhere.

use image::{DynamicImage, GrayImage, Luma};

/// BT.601 luma of an 8-bit RGB triple, unrounded.
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

pub fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    luma(r, g, b).round().clamp(0.0, 255.0) as u8
}

/// 8-bit BT.601 gray plane. `DynamicImage::to_luma8` uses Rec.709 weights
/// instead, which reads saturated reds noticeably darker.
pub fn to_gray(img: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = img {
        return gray.clone();
    }
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        let p = rgb.get_pixel(x, y);
        Luma([luma_u8(p[0], p[1], p[2])])
    })
}
