use anyhow::{Context, Result};
use image::{DynamicImage, Rgb, RgbImage};
use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::pipeline::bbox::{nms, BoundingBox};

const INPUT_SIZE: u32 = 640;
const LETTERBOX_FILL: u8 = 114;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, Copy)]
pub struct DetectorSettings {
    pub confidence: f32,
    pub iou: f32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self { confidence: 0.25, iou: 0.45 }
    }
}

/// Geometry needed to map letterboxed coordinates back to the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Letterbox {
    pub fn unmap(&self, b: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            (b.x1 - self.pad_x) / self.scale,
            (b.y1 - self.pad_y) / self.scale,
            (b.x2 - self.pad_x) / self.scale,
            (b.y2 - self.pad_y) / self.scale,
        )
    }
}

/// YOLOv8 acne detector exported to ONNX.
pub struct AcneDetector {
    pub model_path: PathBuf,
    labels: Vec<String>,
    session: Option<Mutex<Session>>,
}

impl AcneDetector {
    pub fn new(model_path: PathBuf) -> Self {
        Self { model_path, labels: Vec::new(), session: None }
    }

    pub fn loaded(&self) -> bool { self.session.is_some() }

    pub fn labels(&self) -> &[String] { &self.labels }

    /// Labels come from `<model>.labels.txt` next to the model, one per line.
    pub fn labels_path(model_path: &Path) -> PathBuf {
        let mut p = model_path.as_os_str().to_owned();
        p.push(".labels.txt");
        PathBuf::from(p)
    }

    pub fn load(&mut self) -> Result<()> {
        if !self.model_path.exists() {
            anyhow::bail!("Acne model missing; expected it at {:?}", self.model_path);
        }
        let labels_path = Self::labels_path(&self.model_path);
        self.labels = match std::fs::read_to_string(&labels_path) {
            Ok(text) => parse_labels(&text),
            Err(e) => {
                warn!("No class labels at {:?} ({}); using numeric class names", labels_path, e);
                Vec::new()
            }
        };
        let session = Session::builder()?
            .commit_from_file(&self.model_path)
            .context("Failed to create acne detector session")?;
        self.session = Some(Mutex::new(session));
        info!("Acne model loaded: {:?} ({} labels)", self.model_path, self.labels.len());
        Ok(())
    }

    pub fn label_for(&self, class_id: usize) -> String {
        self.labels
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }

    pub fn detect(&self, image: &DynamicImage, settings: &DetectorSettings) -> Result<Vec<Detection>> {
        let mut session = self
            .session
            .as_ref()
            .context("Acne model not loaded")?
            .lock();

        let (canvas, letterbox) = letterbox(image);
        let data = to_unit_nchw(&canvas);
        let input_name = session.inputs[0].name.clone();
        let output_name = session.outputs[0].name.clone();
        let input = Tensor::from_array((vec![1i64, 3, INPUT_SIZE as i64, INPUT_SIZE as i64], data))
            .context("Failed to create detector input tensor")?;
        let outputs = session
            .run(ort::inputs![input_name => input])
            .context("Acne detector inference failed")?;
        let (shape, raw) = outputs
            .get(&output_name)
            .with_context(|| format!("Detector output {} missing", output_name))?
            .try_extract_tensor::<f32>()?;
        if shape.len() != 3 {
            anyhow::bail!("Unexpected detector output shape {:?}", shape);
        }
        let (rows, anchors) = (shape[1] as usize, shape[2] as usize);

        let candidates = decode_predictions(raw, rows, anchors, settings.confidence);
        debug!("Acne detector: {} candidates above {:.2}", candidates.len(), settings.confidence);

        let (w, h) = (image.width() as f32, image.height() as f32);
        let kept = class_aware_nms(&candidates, settings.iou);
        Ok(kept
            .into_iter()
            .map(|c| Detection {
                label: self.label_for(c.class_id),
                class_id: c.class_id,
                confidence: c.confidence,
                bbox: letterbox.unmap(&c.bbox).clamp(w, h),
            })
            .collect())
    }
}

fn parse_labels(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resize keeping aspect ratio and centre on a gray 640x640 canvas.
pub fn letterbox(image: &DynamicImage) -> (RgbImage, Letterbox) {
    let (ow, oh) = (image.width().max(1) as f32, image.height().max(1) as f32);
    let scale = INPUT_SIZE as f32 / ow.max(oh);
    let nw = ((ow * scale).round() as u32).clamp(1, INPUT_SIZE);
    let nh = ((oh * scale).round() as u32).clamp(1, INPUT_SIZE);
    let resized = image.resize_exact(nw, nh, image::imageops::FilterType::Triangle).to_rgb8();
    let pad_x = (INPUT_SIZE - nw) / 2;
    let pad_y = (INPUT_SIZE - nh) / 2;
    let mut canvas = RgbImage::from_pixel(INPUT_SIZE, INPUT_SIZE, Rgb([LETTERBOX_FILL; 3]));
    image::imageops::overlay(&mut canvas, &resized, pad_x as i64, pad_y as i64);
    (canvas, Letterbox { scale, pad_x: pad_x as f32, pad_y: pad_y as f32 })
}

fn to_unit_nchw(img: &RgbImage) -> Vec<f32> {
    let (w, h) = img.dimensions();
    let plane = (w * h) as usize;
    let mut data = vec![0f32; 3 * plane];
    for (i, p) in img.pixels().enumerate() {
        for c in 0..3 {
            data[c * plane + i] = p[c] as f32 / 255.0;
        }
    }
    data
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// YOLOv8 head layout: `[4 + classes, anchors]`, rows are cx, cy, w, h and
/// then one score per class, stored channel-major.
pub fn decode_predictions(raw: &[f32], rows: usize, anchors: usize, threshold: f32) -> Vec<Candidate> {
    if rows <= 4 || raw.len() < rows * anchors {
        return vec![];
    }
    let at = |r: usize, a: usize| raw[r * anchors + a];
    let mut out = Vec::new();
    for a in 0..anchors {
        let (class_id, confidence) = (4..rows)
            .map(|r| (r - 4, at(r, a)))
            .fold((0, f32::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
        if confidence < threshold {
            continue;
        }
        out.push(Candidate {
            class_id,
            confidence,
            bbox: BoundingBox::from_center(at(0, a), at(1, a), at(2, a), at(3, a)),
        });
    }
    out
}

/// NMS run independently per class, results ordered by confidence.
pub fn class_aware_nms(candidates: &[Candidate], iou: f32) -> Vec<Candidate> {
    let mut classes: Vec<usize> = candidates.iter().map(|c| c.class_id).collect();
    classes.sort_unstable();
    classes.dedup();

    let mut kept = Vec::new();
    for class_id in classes {
        let group: Vec<&Candidate> = candidates.iter().filter(|c| c.class_id == class_id).collect();
        let boxes: Vec<BoundingBox> = group.iter().map(|c| c.bbox).collect();
        let scores: Vec<f32> = group.iter().map(|c| c.confidence).collect();
        kept.extend(nms(&boxes, &scores, iou).into_iter().map(|i| group[i].clone()));
    }
    kept.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
    kept
}
