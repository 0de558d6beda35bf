//! Expert-advice lookup: detected acne class → treatment text.
//!
//! The table is a JSON array of `{"class", "treatment", "advice"}` rows
//! maintained by the dermatology side of the project. Keys are matched
//! case-insensitively after trimming.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{info, warn};

pub const UNKNOWN_TREATMENT: &str = "Konsultasikan ke dokter.";
pub const UNKNOWN_ADVICE: &str = "Jenis jerawat ini belum ada di database kami.";

#[derive(Debug, Clone, Deserialize)]
pub struct TreatmentRow {
    #[serde(alias = "Class")]
    pub class: String,
    #[serde(alias = "Treatment")]
    pub treatment: String,
    #[serde(alias = "Advice")]
    pub advice: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    #[serde(rename = "type")]
    pub kind: String,
    pub treatment: String,
    pub advice: String,
    pub known: bool,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: HashMap<String, (String, String)>,
}

fn normalize(class: &str) -> String {
    class.trim().to_lowercase()
}

impl KnowledgeBase {
    pub fn from_rows(rows: Vec<TreatmentRow>) -> Self {
        let entries = rows
            .into_iter()
            .map(|r| (normalize(&r.class), (r.treatment, r.advice)))
            .collect();
        Self { entries }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let rows: Vec<TreatmentRow> = serde_json::from_str(text).context("Invalid knowledge base JSON")?;
        Ok(Self::from_rows(rows))
    }

    /// A missing or unreadable file leaves the base empty; every class then
    /// gets the "see a doctor" fallback.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!("Knowledge base {:?} not found; expert advice disabled", path);
            return Self::default();
        }
        let loaded = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))
            .and_then(|text| Self::from_json(&text));
        match loaded {
            Ok(kb) => {
                info!("Knowledge base loaded: {} classes from {:?}", kb.len(), path);
                kb
            }
            Err(e) => {
                warn!("Knowledge base {:?} unusable: {:#}", path, e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn advise(&self, class: &str) -> Advice {
        let kind = normalize(class);
        match self.entries.get(&kind) {
            Some((treatment, advice)) => Advice {
                kind,
                treatment: treatment.clone(),
                advice: advice.clone(),
                known: true,
            },
            None => Advice {
                kind,
                treatment: UNKNOWN_TREATMENT.to_string(),
                advice: UNKNOWN_ADVICE.to_string(),
                known: false,
            },
        }
    }

    /// One entry per detected class, in label order.
    pub fn advise_all(&self, counts: &BTreeMap<String, usize>) -> Vec<Advice> {
        counts.keys().map(|class| self.advise(class)).collect()
    }
}
