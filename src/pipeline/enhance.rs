//! Contrast normalisation applied to a frame after it passes the quality gate.
//!
//! Webcam selfies are usually under-exposed on one side of the face. The
//! detector was trained on evenly lit crops, so the luma histogram is
//! equalised (blended with the original to avoid blowing out skin tones) and
//! a light unsharp mask restores the edges of small lesions.

use image::{DynamicImage, RgbImage};

use crate::pipeline::color::{luma, luma_u8};

#[derive(Debug, Clone, Copy)]
pub struct EnhanceSettings {
    /// Blend factor between the original (0.0) and fully equalised (1.0) luma.
    pub equalize_strength: f32,
    pub unsharp_sigma: f32,
    pub unsharp_threshold: i32,
}

impl Default for EnhanceSettings {
    fn default() -> Self {
        Self { equalize_strength: 0.5, unsharp_sigma: 1.0, unsharp_threshold: 4 }
    }
}

fn identity_lut() -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, item) in lut.iter_mut().enumerate() {
        *item = i as u8;
    }
    lut
}

fn equalization_lut(hist: &[u32; 256], total: u32) -> [u8; 256] {
    let Some(cdf_min) = hist.iter().find(|&&c| c > 0).copied() else {
        return identity_lut();
    };
    if total == 0 || cdf_min == total {
        return identity_lut();
    }
    let denom = (total - cdf_min) as f32;
    let mut lut = [0u8; 256];
    let mut cumulative = 0u32;
    for (i, count) in hist.iter().enumerate() {
        cumulative += count;
        let numerator = cumulative.saturating_sub(cdf_min) as f32;
        lut[i] = (numerator / denom * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Equalise luma while keeping each pixel's chroma ratio.
pub fn equalize_luma(img: &DynamicImage, strength: f32) -> DynamicImage {
    let mut buf: RgbImage = img.to_rgb8();
    let (w, h) = buf.dimensions();
    if w == 0 || h == 0 {
        return DynamicImage::ImageRgb8(buf);
    }

    let mut hist = [0u32; 256];
    for px in buf.pixels() {
        hist[luma_u8(px[0], px[1], px[2]) as usize] += 1;
    }
    let lut = equalization_lut(&hist, w * h);
    let strength = strength.clamp(0.0, 1.0);

    for px in buf.pixels_mut() {
        let y = luma(px[0], px[1], px[2]);
        let idx = y.round().clamp(0.0, 255.0) as usize;
        let target = lut[idx] as f32 * strength + y * (1.0 - strength);
        let gain = if y < 1.0 { 1.0 } else { target / y };
        for c in px.0.iter_mut() {
            *c = (*c as f32 * gain).round().clamp(0.0, 255.0) as u8;
        }
    }
    DynamicImage::ImageRgb8(buf)
}

pub fn enhance(img: &DynamicImage, settings: &EnhanceSettings) -> DynamicImage {
    let equalized = equalize_luma(img, settings.equalize_strength);
    if settings.unsharp_sigma <= 0.0 {
        return equalized;
    }
    equalized.unsharpen(settings.unsharp_sigma, settings.unsharp_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn uniform_image_is_unchanged() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([120, 90, 80])));
        let out = enhance(&img, &EnhanceSettings::default());
        assert_eq!(out.to_rgb8(), img.to_rgb8());
    }

    #[test]
    fn equalization_stretches_low_contrast() {
        let img = RgbImage::from_fn(16, 16, |x, _| if x < 8 { Rgb([100, 100, 100]) } else { Rgb([120, 120, 120]) });
        let out = equalize_luma(&DynamicImage::ImageRgb8(img), 1.0).to_rgb8();
        let dark = out.get_pixel(0, 0)[0];
        let bright = out.get_pixel(15, 0)[0];
        assert!(bright as i32 - dark as i32 > 20, "dark={} bright={}", dark, bright);
    }

    #[test]
    fn zero_strength_keeps_original() {
        let img = RgbImage::from_fn(8, 8, |x, y| Rgb([(x * 20) as u8, (y * 20) as u8, 60]));
        let dynimg = DynamicImage::ImageRgb8(img.clone());
        assert_eq!(equalize_luma(&dynimg, 0.0).to_rgb8(), img);
    }

    #[test]
    fn lut_is_identity_for_empty_histogram() {
        let hist = [0u32; 256];
        assert_eq!(equalization_lut(&hist, 0), identity_lut());
    }
}
