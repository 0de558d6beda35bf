use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub data: PathBuf,
    pub port: u16,
    pub detect_confidence: f32,
    pub detect_iou: f32,
    pub min_brightness: f64,
    pub min_sharpness: f64,
    pub max_box_width_ratio: f32,
    pub verify_threshold: f32,
    pub model_auto_download: bool,
    pub acne_model: PathBuf,
    /// HMAC secret for login tokens.
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
}

/// Used when `DERMA_JWT_SECRET` is unset; fine for development only.
pub const DEV_JWT_SECRET: &str = "super-secret-key-development";

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let data = PathBuf::from(env::var("DERMA_DATA").unwrap_or_else(|_| "/derma-data".to_string()));
        let port = parsed("DERMA_PORT", 9170);
        let detect_confidence = parsed("DERMA_DETECT_CONFIDENCE", 0.25);
        let detect_iou = parsed("DERMA_DETECT_IOU", 0.45);
        let min_brightness = parsed("DERMA_MIN_BRIGHTNESS", 40.0);
        let min_sharpness = parsed("DERMA_MIN_SHARPNESS", 50.0);
        let max_box_width_ratio = parsed("DERMA_MAX_BOX_WIDTH_RATIO", 0.15);
        let verify_threshold = parsed("DERMA_VERIFY_THRESHOLD", 0.68);
        let model_auto_download = env::var("DERMA_MODEL_AUTO_DOWNLOAD")
            .map(|v| !matches!(v.as_str(), "0" | "false" | "FALSE"))
            .unwrap_or(true);
        let acne_model = env::var("DERMA_ACNE_MODEL")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data.join("models").join("acne_yolov8s.onnx"));
        let jwt_secret = env::var("DERMA_JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEV_JWT_SECRET.to_string());
        let token_ttl_secs = parsed("DERMA_TOKEN_TTL_SECS", 7 * 24 * 3600);
        Self {
            data,
            port,
            detect_confidence,
            detect_iou,
            min_brightness,
            min_sharpness,
            max_box_width_ratio,
            verify_threshold,
            model_auto_download,
            acne_model,
            jwt_secret,
            token_ttl_secs,
        }
    }

    pub fn faces_dir(&self) -> PathBuf { self.data.join("faces") }
    pub fn models_dir(&self) -> PathBuf { self.data.join("models") }
    pub fn db_path(&self) -> PathBuf { self.data.join("db").join("derma.db") }
    pub fn knowledge_path(&self) -> PathBuf { self.data.join("knowledge").join("treatments.json") }
}
