//! Image quality gate run before any model sees an upload.
//!
//! Two cheap measurements on the luma plane: mean brightness and the
//! variance of the 3x3 Laplacian response. Webcam captures that are too dark
//! or too soft produce garbage detections, so they are rejected up front with
//! a reason the client can show to the user.

use std::borrow::Cow;

use image::{DynamicImage, GenericImageView, GrayImage};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::pipeline::color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Ok,
    TooDark,
    TooBlurry,
}

impl Verdict {
    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Ok => "Kualitas gambar baik.",
            Verdict::TooDark => "Gambar terlalu gelap. Cari tempat yang lebih terang.",
            Verdict::TooBlurry => "Gambar buram. Tahan kamera agar tidak bergerak.",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QualityThresholds {
    pub min_brightness: f64,
    pub min_sharpness: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self { min_brightness: 40.0, min_sharpness: 50.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub brightness: f64,
    pub sharpness: f64,
    pub verdict: Verdict,
}

impl QualityReport {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Ok
    }
}

/// Mean of the 8-bit BT.601 luma plane, 0 for an empty image.
pub fn mean_brightness(img: &DynamicImage) -> f64 {
    let gray = color::to_gray(img);
    let n = gray.as_raw().len();
    if n == 0 {
        return 0.0;
    }
    gray.as_raw().iter().map(|&v| v as u64).sum::<u64>() as f64 / n as f64
}

/// Variance of the Laplacian. Higher means sharper.
pub fn laplacian_variance(img: &DynamicImage) -> f64 {
    let (w, h) = img.dimensions();
    let max_dim = 512;
    let img_to_process = if w > max_dim || h > max_dim {
        Cow::Owned(img.resize(max_dim, max_dim, image::imageops::FilterType::Triangle))
    } else {
        Cow::Borrowed(img)
    };

    let gray: GrayImage = color::to_gray(&img_to_process);
    let (w, h) = gray.dimensions();
    if w < 3 || h < 3 {
        return 0.0;
    }

    let mut arr = Array2::<f64>::zeros((h as usize, w as usize));
    for (y, mut row) in arr.rows_mut().into_iter().enumerate() {
        for (x, val) in row.iter_mut().enumerate() {
            *val = gray.get_pixel(x as u32, y as u32)[0] as f64;
        }
    }

    // interior only; a border row of zeros would bias the variance
    let (h, w) = (h as usize, w as usize);
    let mut responses = Vec::with_capacity((h - 2) * (w - 2));
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let s = arr[[y - 1, x]] + arr[[y + 1, x]] + arr[[y, x - 1]] + arr[[y, x + 1]] - 4.0 * arr[[y, x]];
            responses.push(s);
        }
    }
    let mean = responses.iter().sum::<f64>() / responses.len() as f64;
    responses.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / responses.len() as f64
}

/// Darkness is checked before blur: a dark frame also reads as soft.
pub fn assess(img: &DynamicImage, thresholds: &QualityThresholds) -> QualityReport {
    let brightness = mean_brightness(img);
    let sharpness = laplacian_variance(img);
    let verdict = if brightness < thresholds.min_brightness {
        Verdict::TooDark
    } else if sharpness < thresholds.min_sharpness {
        Verdict::TooBlurry
    } else {
        Verdict::Ok
    };
    QualityReport { brightness, sharpness, verdict }
}
