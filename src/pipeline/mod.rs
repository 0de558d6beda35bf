pub mod annotate;
pub mod bbox;
pub mod color;
pub mod detector;
pub mod enhance;
pub mod face;
pub mod filter;
pub mod landmarks;
pub mod quality;

use std::collections::BTreeMap;

use anyhow::Result;
use image::DynamicImage;
use serde::Serialize;
use tracing::{info, warn};

use crate::advice::{Advice, KnowledgeBase};
use crate::utils::config::Config;
use detector::{AcneDetector, Detection, DetectorSettings};
use enhance::EnhanceSettings;
use face::FaceProcessor;
use landmarks::{FaceRegion, PreparedFace};
use quality::{QualityReport, QualityThresholds};

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub quality: QualityThresholds,
    pub enhance: EnhanceSettings,
    pub detector: DetectorSettings,
    pub max_box_width_ratio: f32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            quality: QualityThresholds::default(),
            enhance: EnhanceSettings::default(),
            detector: DetectorSettings::default(),
            max_box_width_ratio: 0.15,
        }
    }
}

impl PipelineSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            quality: QualityThresholds { min_brightness: cfg.min_brightness, min_sharpness: cfg.min_sharpness },
            enhance: EnhanceSettings::default(),
            detector: DetectorSettings { confidence: cfg.detect_confidence, iou: cfg.detect_iou },
            max_box_width_ratio: cfg.max_box_width_ratio,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AcneAnalysis {
    pub quality: QualityReport,
    pub face_found: bool,
    pub region: FaceRegion,
    /// Frame coordinates, highest confidence first.
    pub detections: Vec<Detection>,
    pub counts: BTreeMap<String, usize>,
    pub advice: Vec<Advice>,
    pub image_result: String,
}

impl AcneAnalysis {
    pub fn total(&self) -> usize { self.detections.len() }
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Rejected(QualityReport),
    Analyzed(Box<AcneAnalysis>),
}

/// quality gate → enhance → mask/crop on the largest face → detect →
/// [`summarize`].
///
/// The quality gate runs before any model is touched, so a rejected frame
/// never fails on missing models.
pub fn analyze_acne(
    image: &DynamicImage,
    faces: &FaceProcessor,
    detector: &AcneDetector,
    kb: &KnowledgeBase,
    settings: &PipelineSettings,
) -> Result<Outcome> {
    let report = quality::assess(image, &settings.quality);
    if !report.passed() {
        info!(
            "Frame rejected: {:?} (brightness={:.1}, sharpness={:.1})",
            report.verdict, report.brightness, report.sharpness
        );
        return Ok(Outcome::Rejected(report));
    }
    if !detector.loaded() {
        anyhow::bail!("Acne model not loaded");
    }

    let enhanced = enhance::enhance(image, &settings.enhance);
    let found = if faces.scrfd_loaded() {
        faces.detect_faces(image)?
    } else {
        warn!("Face detector not loaded; analysing the whole frame");
        Vec::new()
    };
    let prepared = landmarks::prepare_face(&enhanced, &found);
    let raw = detector.detect(&prepared.image, &settings.detector)?;
    let analysis = summarize(image, report, &prepared, raw, kb, settings.max_box_width_ratio)?;
    Ok(Outcome::Analyzed(Box::new(analysis)))
}

/// Post-detection stages: width filter against the crop the detector saw,
/// back to frame coordinates, confidence order, advice per class, and the
/// annotated original frame.
pub fn summarize(
    frame: &DynamicImage,
    quality: QualityReport,
    prepared: &PreparedFace,
    raw: Vec<Detection>,
    kb: &KnowledgeBase,
    max_box_width_ratio: f32,
) -> Result<AcneAnalysis> {
    let raw_count = raw.len();
    let kept = filter::filter_boxes(raw, prepared.image.width(), max_box_width_ratio);
    let mut detections = filter::translate(kept, prepared.region.x as f32, prepared.region.y as f32);
    filter::sort_by_confidence(&mut detections);
    info!(
        "Acne analysis: face_found={} raw={} kept={}",
        prepared.face_found, raw_count, detections.len()
    );

    let counts = filter::count_by_label(&detections);
    let advice = kb.advise_all(&counts);
    let annotated = annotate::draw_detections(frame, &detections);
    let image_result = annotate::to_data_url(&annotated, 85)?;

    Ok(AcneAnalysis {
        quality,
        face_found: prepared.face_found,
        region: prepared.region,
        detections,
        counts,
        advice,
        image_result,
    })
}
