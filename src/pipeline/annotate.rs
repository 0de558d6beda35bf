use std::io::Cursor;

use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};

use crate::pipeline::bbox::BoundingBox;
use crate::pipeline::detector::Detection;

const PALETTE: [Rgb<u8>; 6] = [
    Rgb([255, 0, 0]),
    Rgb([255, 140, 0]),
    Rgb([255, 0, 200]),
    Rgb([0, 170, 255]),
    Rgb([0, 200, 80]),
    Rgb([255, 230, 0]),
];

fn rect_from_bbox(bbox: &BoundingBox, img_w: u32, img_h: u32) -> Option<Rect> {
    if img_w == 0 || img_h == 0 {
        return None;
    }
    let b = bbox.clamp((img_w - 1) as f32, (img_h - 1) as f32);
    let width = b.width().max(1.0).round() as u32;
    let height = b.height().max(1.0).round() as u32;
    Some(Rect::at(b.x1.round() as i32, b.y1.round() as i32).of_size(width, height))
}

/// Draw a double-stroke box per detection, coloured by class.
pub fn draw_detections(image: &DynamicImage, detections: &[Detection]) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let (w, h) = canvas.dimensions();
    for d in detections {
        let color = PALETTE[d.class_id % PALETTE.len()];
        if let Some(rect) = rect_from_bbox(&d.bbox, w, h) {
            draw_hollow_rect_mut(&mut canvas, rect, color);
            if rect.width() > 2 && rect.height() > 2 {
                let inner = Rect::at(rect.left() + 1, rect.top() + 1).of_size(rect.width() - 2, rect.height() - 2);
                draw_hollow_rect_mut(&mut canvas, inner, color);
            }
        }
    }
    canvas
}

pub fn to_data_url(image: &RgbImage, quality: u8) -> Result<String> {
    let mut buf = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut buf), quality);
    encoder
        .encode_image(image)
        .context("Failed to encode annotated image")?;
    Ok(format!("data:image/jpeg;base64,{}", general_purpose::STANDARD.encode(&buf)))
}
