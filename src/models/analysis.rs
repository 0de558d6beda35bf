use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::advice::Advice;

#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub username: String,
    /// Unix seconds.
    pub created_at: i64,
    pub acne_count: usize,
    pub face_found: bool,
    pub detail: BTreeMap<String, usize>,
    pub advice: Vec<Advice>,
    /// Annotated frame as a `data:` URL.
    pub image_result: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalysisRecord {
    pub id: i64,
    pub username: String,
    pub created_at: i64,
    pub acne_count: i64,
    pub face_found: bool,
    pub detail: BTreeMap<String, usize>,
    pub advice: Vec<Advice>,
    pub image_result: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct History {
    pub username: String,
    pub total: i64,
    pub analyses: Vec<AnalysisRecord>,
}
