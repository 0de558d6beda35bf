pub mod utils;
pub mod models;
pub mod db;
pub mod pipeline;
pub mod advice;
pub mod auth;
pub mod store;
pub mod api;

use anyhow::Result;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::advice::KnowledgeBase;
use crate::pipeline::detector::AcneDetector;
use crate::pipeline::face::FaceProcessor;
use crate::pipeline::PipelineSettings;
use crate::store::faces::FaceStore;
use crate::utils::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub started_at: std::time::Instant,
    pub config: Config,
    pub settings: PipelineSettings,
    pub pool: db::DbPool,
    pub faces: FaceStore,
    pub knowledge: Arc<KnowledgeBase>,
    /// Swapped wholesale once models finish loading; inference only reads.
    pub face_processor: Arc<RwLock<FaceProcessor>>,
    pub acne_detector: Arc<RwLock<AcneDetector>>,
}

impl AppState {
    pub fn new(config: Config, pool: db::DbPool, faces: FaceStore, knowledge: KnowledgeBase) -> Self {
        let face_processor = FaceProcessor::new(config.models_dir(), config.model_auto_download);
        let acne_detector = AcneDetector::new(config.acne_model.clone());
        Self {
            started_at: std::time::Instant::now(),
            settings: PipelineSettings::from_config(&config),
            config,
            pool,
            faces,
            knowledge: Arc::new(knowledge),
            face_processor: Arc::new(RwLock::new(face_processor)),
            acne_detector: Arc::new(RwLock::new(acne_detector)),
        }
    }

    /// Creates the data layout, opens the database and reads the knowledge
    /// base. Models are not loaded here; see [`AppState::load_models`].
    pub fn bootstrap(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data)?;
        let pool = db::create_pool(config.db_path(), 8)?;
        let faces = FaceStore::open(config.faces_dir())?;
        let knowledge = KnowledgeBase::load(&config.knowledge_path());
        Ok(Self::new(config, pool, faces, knowledge))
    }

    /// Loads both model sets in the background. Requests that need a model
    /// get 503 until it is in place.
    pub fn load_models(&self) {
        let processor = self.face_processor.clone();
        let (models_dir, auto_download) = (self.config.models_dir(), self.config.model_auto_download);
        tokio::spawn(async move {
            // load into a fresh processor so the lock is never held across await
            let mut fresh = FaceProcessor::new(models_dir, auto_download);
            if let Err(e) = fresh.initialize().await {
                error!("Failed to initialize face processor: {}", e);
                return;
            }
            *processor.write() = fresh;
        });

        let detector = self.acne_detector.clone();
        let model_path = self.config.acne_model.clone();
        tokio::task::spawn_blocking(move || {
            let mut fresh = AcneDetector::new(model_path);
            match fresh.load() {
                Ok(()) => {
                    *detector.write() = fresh;
                    info!("Acne detector ready");
                }
                Err(e) => warn!("Acne detector not loaded: {}", e),
            }
        });
    }
}
