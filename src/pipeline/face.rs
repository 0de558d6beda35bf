use anyhow::{Context, Result};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::pipeline::bbox::{nms, BoundingBox};

const SCRFD_MODEL_FILE: &str = "scrfd_500m_bnkps.onnx";
const ARCFACE_MODEL_FILE: &str = "w600k_r50.onnx";
const SCRFD_MODEL_URL_HF: &str = "https://huggingface.co/ykk648/face_lib/resolve/main/face_detect/scrfd_onnx/scrfd_500m_bnkps.onnx";
const SCRFD_MODEL_URL_GH: &str = "https://github.com/deepinsight/insightface/releases/download/v0.7/scrfd_500m_bnkps.onnx";
const ARCFACE_MODEL_URL_PRIMARY: &str = "https://huggingface.co/maze/faceX/resolve/e010b5098c3685fd00b22dd2aec6f37320e3d850/w600k_r50.onnx";

const SCRFD_INPUT: u32 = 640;
const SCRFD_STRIDES: [u32; 3] = [8, 16, 32];
const SCRFD_CONFIDENCE: f32 = 0.5;
const SCRFD_NMS_IOU: f32 = 0.4;
const ARCFACE_INPUT: u32 = 112;

/// Canonical 5-point template for a 112x112 ArcFace crop.
const ARCFACE_TEMPLATE: [[f32; 2]; 5] = [
    [38.2946, 51.6963],
    [73.5318, 51.5014],
    [56.0252, 71.7366],
    [41.5493, 92.3655],
    [70.7299, 92.2041],
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

/// A detected face. Landmarks are ordered left eye, right eye, nose,
/// left mouth corner, right mouth corner (image left/right).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceBbox {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub landmarks: Option<[Landmark; 5]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verification {
    pub distance: f32,
    pub verified: bool,
}

pub struct FaceProcessor {
    pub models_dir: PathBuf,
    auto_download: bool,
    scrfd_session: Option<Mutex<Session>>,
    arcface_session: Option<Mutex<Session>>,
}

impl FaceProcessor {
    pub fn new(models_dir: PathBuf, auto_download: bool) -> Self {
        Self {
            models_dir,
            auto_download,
            scrfd_session: None,
            arcface_session: None,
        }
    }

    pub fn scrfd_loaded(&self) -> bool { self.scrfd_session.is_some() }
    pub fn arcface_loaded(&self) -> bool { self.arcface_session.is_some() }

    /// Downloads missing models (when enabled) and loads them. Load failures
    /// are logged and leave the processor unloaded.
    pub async fn initialize(&mut self) -> Result<()> {
        std::fs::create_dir_all(&self.models_dir)
            .context("Failed to create models directory")?;

        if self.auto_download {
            if let Err(e) = self.download_models().await {
                warn!("Face model auto-download failed: {}", e);
            }
        } else {
            info!("Face model auto-download disabled.");
        }

        if let Err(e) = self.load_models() {
            warn!("Face models not loaded: {}", e);
        }
        Ok(())
    }

    async fn download_models(&self) -> Result<()> {
        let scrfd_path = self.models_dir.join(SCRFD_MODEL_FILE);
        let arcface_path = self.models_dir.join(ARCFACE_MODEL_FILE);
        let client = create_http_client()?;

        if !scrfd_path.exists() {
            info!("Downloading SCRFD face detection model...");
            if let Err(e) = download_file(&client, SCRFD_MODEL_URL_HF, &scrfd_path).await {
                warn!("Failed to download from Hugging Face: {}. Trying GitHub...", e);
                download_file(&client, SCRFD_MODEL_URL_GH, &scrfd_path).await?;
            }
        }

        if !arcface_path.exists() {
            info!("Downloading ArcFace recognition model...");
            download_file(&client, ARCFACE_MODEL_URL_PRIMARY, &arcface_path).await?;
        }
        Ok(())
    }

    fn load_models(&mut self) -> Result<()> {
        let scrfd_path = self.models_dir.join(SCRFD_MODEL_FILE);
        let arcface_path = self.models_dir.join(ARCFACE_MODEL_FILE);

        if !scrfd_path.exists() || !arcface_path.exists() {
            anyhow::bail!(
                "Face models missing; expected SCRFD at {:?} and ArcFace at {:?}",
                scrfd_path, arcface_path
            );
        }

        let scrfd = Session::builder()?
            .commit_from_file(&scrfd_path)
            .context("Failed to create SCRFD session")?;
        let arc = Session::builder()?
            .commit_from_file(&arcface_path)
            .context("Failed to create ArcFace session")?;

        self.scrfd_session = Some(Mutex::new(scrfd));
        self.arcface_session = Some(Mutex::new(arc));
        info!("Face models loaded: SCRFD={:?} ArcFace={:?}", scrfd_path, arcface_path);
        Ok(())
    }

    pub fn detect_faces(&self, image: &DynamicImage) -> Result<Vec<FaceBbox>> {
        let mut session = self
            .scrfd_session
            .as_ref()
            .context("Detection model not loaded")?
            .lock();

        let (data, scale) = preprocess_scrfd(image);
        let input_name = session.inputs[0].name.clone();
        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let layout = resolve_scrfd_outputs(&output_names)
            .with_context(|| format!("Unrecognised SCRFD outputs: {:?}", output_names))?;

        let input = Tensor::from_array((vec![1i64, 3, SCRFD_INPUT as i64, SCRFD_INPUT as i64], data))
            .context("Failed to create SCRFD input tensor")?;
        let outputs = session
            .run(ort::inputs![input_name => input])
            .context("SCRFD inference failed")?;

        let output = |name: &str| outputs.get(name).with_context(|| format!("SCRFD output {} missing", name));
        let mut faces = Vec::new();
        for head in &layout {
            let (_, scores) = output(&head.score)?.try_extract_tensor::<f32>()?;
            let (_, boxes) = output(&head.bbox)?.try_extract_tensor::<f32>()?;
            let kps = match &head.kps {
                Some(name) => Some(output(name)?.try_extract_tensor::<f32>()?.1),
                None => None,
            };
            faces.extend(decode_scrfd_stride(scores, boxes, kps, head.stride, SCRFD_CONFIDENCE, scale));
        }

        let boxes: Vec<BoundingBox> = faces.iter().map(|f| f.bbox).collect();
        let scores: Vec<f32> = faces.iter().map(|f| f.confidence).collect();
        let (w, h) = (image.width() as f32, image.height() as f32);
        let kept: Vec<FaceBbox> = nms(&boxes, &scores, SCRFD_NMS_IOU)
            .into_iter()
            .map(|i| {
                let mut face = faces[i].clone();
                face.bbox = face.bbox.clamp(w, h);
                face
            })
            .collect();
        debug!("SCRFD: {} candidates, {} after NMS", faces.len(), kept.len());
        Ok(kept)
    }

    /// L2-normalised ArcFace embedding. With landmarks the face is aligned to
    /// the ArcFace template; otherwise the given region is resized as-is.
    pub fn embed(&self, image: &DynamicImage, face: Option<&FaceBbox>) -> Result<Vec<f32>> {
        let mut session = self
            .arcface_session
            .as_ref()
            .context("Recognition model not loaded")?
            .lock();

        let crop = match face {
            Some(FaceBbox { landmarks: Some(lms), .. }) => align_face(image, lms),
            Some(f) => {
                let b = f.bbox;
                let x = b.x1.max(0.0) as u32;
                let y = b.y1.max(0.0) as u32;
                let cw = (b.width().max(1.0) as u32).min(image.width().saturating_sub(x)).max(1);
                let ch = (b.height().max(1.0) as u32).min(image.height().saturating_sub(y)).max(1);
                image.crop_imm(x, y, cw, ch)
                    .resize_exact(ARCFACE_INPUT, ARCFACE_INPUT, image::imageops::FilterType::Triangle)
                    .to_rgb8()
            }
            None => image
                .resize_exact(ARCFACE_INPUT, ARCFACE_INPUT, image::imageops::FilterType::Triangle)
                .to_rgb8(),
        };

        let data = preprocess_arcface(&crop);
        let input_name = session.inputs[0].name.clone();
        let output_name = session.outputs[0].name.clone();
        let input = Tensor::from_array((vec![1i64, 3, ARCFACE_INPUT as i64, ARCFACE_INPUT as i64], data))
            .context("Failed to create ArcFace input tensor")?;
        let outputs = session
            .run(ort::inputs![input_name => input])
            .context("ArcFace inference failed")?;
        let (_, slice) = outputs
            .get(&output_name)
            .with_context(|| format!("ArcFace output {} missing", output_name))?
            .try_extract_tensor::<f32>()?;
        let embedding = l2_normalize(slice.to_vec());
        if embedding.iter().all(|v| *v == 0.0) {
            anyhow::bail!("ArcFace embedding has zero norm");
        }
        Ok(embedding)
    }

    /// Embedding of the largest detected face. When no face is found the
    /// whole frame is embedded instead of failing the request.
    pub fn embed_largest_face(&self, image: &DynamicImage) -> Result<(Vec<f32>, bool)> {
        let faces = self.detect_faces(image)?;
        let largest = largest_face(&faces);
        let embedding = self.embed(image, largest)?;
        Ok((embedding, largest.is_some()))
    }
}

fn create_http_client() -> Result<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    if let Ok(token) = std::env::var("HF_TOKEN") {
        if !token.is_empty() {
            info!("Using Hugging Face token for model download.");
            headers.insert(
                reqwest::header::AUTHORIZATION,
                reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
    }
    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .context("Failed to create HTTP client")
}

async fn download_file(client: &reqwest::Client, url: &str, path: &Path) -> Result<()> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download model from {}", url))?;
    if !response.status().is_success() {
        anyhow::bail!("Failed to download model: HTTP {}", response.status());
    }
    let bytes = response.bytes().await.context("Failed to read response body")?;
    // ONNX files are never this small; an HTML error page is
    if bytes.len() < 1024 {
        anyhow::bail!("Downloaded file is suspiciously small ({} bytes), may be corrupted", bytes.len());
    }
    let tmp = path.with_extension("onnx.part");
    std::fs::write(&tmp, &bytes).with_context(|| format!("Failed to write file: {:?}", tmp))?;
    std::fs::rename(&tmp, path).with_context(|| format!("Failed to move model into place: {:?}", path))?;
    info!("Downloaded model to {:?} ({} bytes)", path, bytes.len());
    Ok(())
}

/// Letterbox to 640x640 (top-left aligned), RGB, NCHW, (v - 127.5) / 128.
fn preprocess_scrfd(image: &DynamicImage) -> (Vec<f32>, f32) {
    let (ow, oh) = (image.width().max(1) as f32, image.height().max(1) as f32);
    let scale = SCRFD_INPUT as f32 / ow.max(oh);
    let nw = ((ow * scale) as u32).clamp(1, SCRFD_INPUT);
    let nh = ((oh * scale) as u32).clamp(1, SCRFD_INPUT);
    let resized = image.resize_exact(nw, nh, image::imageops::FilterType::Triangle).to_rgb8();
    let mut padded = RgbImage::new(SCRFD_INPUT, SCRFD_INPUT);
    image::imageops::overlay(&mut padded, &resized, 0, 0);
    (to_nchw(&padded, 127.5, 128.0), scale)
}

fn preprocess_arcface(face: &RgbImage) -> Vec<f32> {
    to_nchw(face, 127.5, 127.5)
}

fn to_nchw(img: &RgbImage, mean: f32, std: f32) -> Vec<f32> {
    let (w, h) = img.dimensions();
    let plane = (w * h) as usize;
    let mut data = vec![0f32; 3 * plane];
    for (i, p) in img.pixels().enumerate() {
        for c in 0..3 {
            data[c * plane + i] = (p[c] as f32 - mean) / std;
        }
    }
    data
}

struct ScrfdHead {
    stride: u32,
    score: String,
    bbox: String,
    kps: Option<String>,
}

/// Exports name their heads `score_8`/`bbox_8`/`kps_8`...; the insightface
/// release uses numeric names in the order scores, boxes, keypoints.
fn resolve_scrfd_outputs(names: &[String]) -> Option<Vec<ScrfdHead>> {
    let has = |n: &str| names.iter().any(|x| x == n);
    if SCRFD_STRIDES.iter().all(|s| has(&format!("score_{}", s)) && has(&format!("bbox_{}", s))) {
        return Some(
            SCRFD_STRIDES
                .iter()
                .map(|s| ScrfdHead {
                    stride: *s,
                    score: format!("score_{}", s),
                    bbox: format!("bbox_{}", s),
                    kps: Some(format!("kps_{}", s)).filter(|k| has(k)),
                })
                .collect(),
        );
    }
    let fmc = SCRFD_STRIDES.len();
    if names.len() != fmc * 2 && names.len() != fmc * 3 {
        return None;
    }
    let with_kps = names.len() == fmc * 3;
    Some(
        SCRFD_STRIDES
            .iter()
            .enumerate()
            .map(|(i, s)| ScrfdHead {
                stride: *s,
                score: names[i].clone(),
                bbox: names[i + fmc].clone(),
                kps: if with_kps { Some(names[i + 2 * fmc].clone()) } else { None },
            })
            .collect(),
    )
}

/// Decode one SCRFD stride. Distances are in stride units from the anchor
/// centre; coordinates are divided by `scale` to land in the original frame.
fn decode_scrfd_stride(
    scores: &[f32],
    boxes: &[f32],
    kps: Option<&[f32]>,
    stride: u32,
    threshold: f32,
    scale: f32,
) -> Vec<FaceBbox> {
    let feat = (SCRFD_INPUT / stride) as usize;
    let cells = feat * feat;
    if cells == 0 || scores.is_empty() {
        return vec![];
    }
    let anchors = (scores.len() / cells).max(1);
    let s = stride as f32;
    let mut out = Vec::new();
    for (i, &score) in scores.iter().enumerate() {
        if score < threshold || i * 4 + 4 > boxes.len() {
            continue;
        }
        let cell = i / anchors;
        let cx = (cell % feat) as f32 * s;
        let cy = (cell / feat) as f32 * s;
        let d = &boxes[i * 4..i * 4 + 4];
        let bbox = BoundingBox::new(
            (cx - d[0] * s) / scale,
            (cy - d[1] * s) / scale,
            (cx + d[2] * s) / scale,
            (cy + d[3] * s) / scale,
        );
        let landmarks = kps.and_then(|k| {
            let k = k.get(i * 10..i * 10 + 10)?;
            let mut pts = [Landmark { x: 0.0, y: 0.0 }; 5];
            for (j, p) in pts.iter_mut().enumerate() {
                p.x = (cx + k[j * 2] * s) / scale;
                p.y = (cy + k[j * 2 + 1] * s) / scale;
            }
            Some(pts)
        });
        out.push(FaceBbox { bbox, confidence: score, landmarks });
    }
    out
}

pub fn largest_face(faces: &[FaceBbox]) -> Option<&FaceBbox> {
    faces
        .iter()
        .max_by(|a, b| a.bbox.area().partial_cmp(&b.bbox.area()).unwrap_or(std::cmp::Ordering::Equal))
}

/// Least-squares similarity transform (rotation, uniform scale, translation)
/// taking `src` onto `dst`. Returns `[a, b, tx, ty]` for
/// `x' = a*x - b*y + tx`, `y' = b*x + a*y + ty`.
pub fn estimate_similarity(src: &[Landmark; 5], dst: &[[f32; 2]; 5]) -> [f32; 4] {
    let n = src.len() as f32;
    let (smx, smy) = src.iter().fold((0.0, 0.0), |(x, y), p| (x + p.x / n, y + p.y / n));
    let (dmx, dmy) = dst.iter().fold((0.0, 0.0), |(x, y), p| (x + p[0] / n, y + p[1] / n));
    let mut num_a = 0.0;
    let mut num_b = 0.0;
    let mut den = 0.0;
    for (s, d) in src.iter().zip(dst.iter()) {
        let (sx, sy) = (s.x - smx, s.y - smy);
        let (dx, dy) = (d[0] - dmx, d[1] - dmy);
        num_a += sx * dx + sy * dy;
        num_b += sx * dy - sy * dx;
        den += sx * sx + sy * sy;
    }
    if den <= f32::EPSILON {
        return [1.0, 0.0, dmx - smx, dmy - smy];
    }
    let a = num_a / den;
    let b = num_b / den;
    let tx = dmx - (a * smx - b * smy);
    let ty = dmy - (b * smx + a * smy);
    [a, b, tx, ty]
}

fn align_face(image: &DynamicImage, landmarks: &[Landmark; 5]) -> RgbImage {
    let [a, b, tx, ty] = estimate_similarity(landmarks, &ARCFACE_TEMPLATE);
    let rgb = image.to_rgb8();
    let mut out = RgbImage::new(ARCFACE_INPUT, ARCFACE_INPUT);
    match Projection::from_matrix([a, -b, tx, b, a, ty, 0.0, 0.0, 1.0]) {
        Some(projection) => {
            warp_into(&rgb, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut out);
            out
        }
        None => image
            .resize_exact(ARCFACE_INPUT, ARCFACE_INPUT, image::imageops::FilterType::Triangle)
            .to_rgb8(),
    }
}

fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 1.0;
    }
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - (dot_product / (norm_a * norm_b))
}

/// Distance is clamped to 1.0 when it is not finite so it always serialises.
pub fn verify(candidate: &[f32], reference: &[f32], threshold: f32) -> Verification {
    let raw = cosine_distance(candidate, reference);
    let distance = if raw.is_finite() { raw } else { 1.0 };
    Verification { distance, verified: raw.is_finite() && distance <= threshold }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_landmarks() -> [Landmark; 5] {
        let mut lms = [Landmark { x: 0.0, y: 0.0 }; 5];
        for (l, t) in lms.iter_mut().zip(ARCFACE_TEMPLATE.iter()) {
            l.x = t[0];
            l.y = t[1];
        }
        lms
    }

    #[test]
    fn cosine_distance_edge_cases() {
        assert_eq!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 1.0);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
        assert!(cosine_distance(&[1.0, 0.0], &[2.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn verify_uses_threshold() {
        let a = [1.0, 0.0];
        let b = [0.8, 0.6];
        // distance 0.2
        assert!(verify(&a, &b, 0.68).verified);
        assert!(!verify(&a, &b, 0.1).verified);
    }

    #[test]
    fn verify_sanitises_nan() {
        let v = verify(&[f32::NAN, 1.0], &[1.0, 1.0], 0.68);
        assert_eq!(v.distance, 1.0);
        assert!(!v.verified);
    }

    #[test]
    fn similarity_of_template_onto_itself_is_identity() {
        let [a, b, tx, ty] = estimate_similarity(&template_landmarks(), &ARCFACE_TEMPLATE);
        assert!((a - 1.0).abs() < 1e-4);
        assert!(b.abs() < 1e-4);
        assert!(tx.abs() < 1e-2 && ty.abs() < 1e-2);
    }

    #[test]
    fn similarity_recovers_scale_and_shift() {
        let mut src = template_landmarks();
        for p in src.iter_mut() {
            p.x = p.x * 2.0 + 100.0;
            p.y = p.y * 2.0 + 50.0;
        }
        let [a, b, tx, ty] = estimate_similarity(&src, &ARCFACE_TEMPLATE);
        assert!((a - 0.5).abs() < 1e-4);
        assert!(b.abs() < 1e-4);
        assert!((tx + 50.0).abs() < 1e-2);
        assert!((ty + 25.0).abs() < 1e-2);
    }

    #[test]
    fn resolves_named_and_positional_outputs() {
        let named: Vec<String> = ["score_8", "score_16", "score_32", "bbox_8", "bbox_16", "bbox_32", "kps_8", "kps_16", "kps_32"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let heads = resolve_scrfd_outputs(&named).unwrap();
        assert_eq!(heads[1].bbox, "bbox_16");
        assert_eq!(heads[2].kps.as_deref(), Some("kps_32"));

        let positional: Vec<String> = (0..9).map(|i| format!("{}", 440 + i)).collect();
        let heads = resolve_scrfd_outputs(&positional).unwrap();
        assert_eq!(heads[0].score, "440");
        assert_eq!(heads[0].bbox, "443");
        assert_eq!(heads[0].kps.as_deref(), Some("446"));

        assert!(resolve_scrfd_outputs(&["out".to_string()]).is_none());
    }

    #[test]
    fn decodes_single_anchor_on_stride_32() {
        // 20x20 grid, 2 anchors per cell
        let cells = 20 * 20;
        let mut scores = vec![0.0f32; cells * 2];
        let mut boxes = vec![0.0f32; cells * 2 * 4];
        let mut kps = vec![0.0f32; cells * 2 * 10];
        // cell (x=3, y=2), second anchor
        let i = (2 * 20 + 3) * 2 + 1;
        scores[i] = 0.9;
        boxes[i * 4..i * 4 + 4].copy_from_slice(&[1.0, 1.0, 1.0, 1.0]);
        kps[i * 10] = 0.5;
        let faces = decode_scrfd_stride(&scores, &boxes, Some(&kps), 32, 0.5, 2.0);
        assert_eq!(faces.len(), 1);
        let f = &faces[0];
        // centre (96, 64), +-32, halved by scale
        assert_eq!(f.bbox, BoundingBox::new(32.0, 16.0, 64.0, 48.0));
        let lms = f.landmarks.unwrap();
        assert_eq!(lms[0].x, 56.0);
        assert_eq!(lms[0].y, 32.0);
    }

    #[test]
    fn largest_face_picks_by_area() {
        let small = FaceBbox { bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0), confidence: 0.99, landmarks: None };
        let big = FaceBbox { bbox: BoundingBox::new(0.0, 0.0, 50.0, 40.0), confidence: 0.6, landmarks: None };
        let faces = vec![small, big];
        assert_eq!(largest_face(&faces).unwrap().confidence, 0.6);
        assert!(largest_face(&[]).is_none());
    }

    #[test]
    fn unloaded_processor_reports_errors() {
        let p = FaceProcessor::new(PathBuf::from("/nonexistent"), false);
        assert!(!p.scrfd_loaded());
        assert!(!p.arcface_loaded());
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        assert!(p.detect_faces(&img).is_err());
        assert!(p.embed(&img, None).is_err());
    }

    #[test]
    fn nchw_layout_splits_channels() {
        let img = RgbImage::from_pixel(2, 1, Rgb([255, 127, 0]));
        let data = to_nchw(&img, 127.5, 127.5);
        assert_eq!(data.len(), 6);
        assert!((data[0] - 1.0).abs() < 1e-6);
        assert!((data[4] + 1.0).abs() < 1e-6);
    }
}
