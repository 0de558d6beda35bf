use std::collections::BTreeMap;
use std::sync::Arc;
use axum::{extract::{Multipart, Path, Query, State}, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::advice::Advice;
use crate::api::error::{ApiError, ApiResult};
use crate::api::session::{self, AuthUser};
use crate::api::upload::{self, UploadForm};
use crate::auth;
use crate::db::{self, DbPool};
use crate::models::analysis::{AnalysisRecord, History, NewAnalysis};
use crate::pipeline::detector::Detection;
use crate::pipeline::landmarks::FaceRegion;
use crate::pipeline::quality::{QualityReport, Verdict};
use crate::pipeline::{self, AcneAnalysis, Outcome};
use crate::store::faces::validate_username;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectResponse {
    Rejected {
        reason: Verdict,
        message: &'static str,
        quality: QualityReport,
    },
    Success {
        face_found: bool,
        region: FaceRegion,
        quality: QualityReport,
        total: usize,
        detail_acne: BTreeMap<String, usize>,
        detections: Vec<Detection>,
        advice: Vec<Advice>,
        image_result: String,
        saved_analysis_id: Option<i64>,
    },
}

impl DetectResponse {
    pub fn rejected(report: QualityReport) -> Self {
        DetectResponse::Rejected { reason: report.verdict, message: report.verdict.message(), quality: report }
    }

    pub fn success(analysis: AcneAnalysis, saved_analysis_id: Option<i64>) -> Self {
        DetectResponse::Success {
            face_found: analysis.face_found,
            region: analysis.region,
            quality: analysis.quality,
            total: analysis.detections.len(),
            detail_acne: analysis.counts,
            detections: analysis.detections,
            advice: analysis.advice,
            image_result: analysis.image_result,
            saved_analysis_id,
        }
    }
}

/// Who a detect result belongs to. Anonymous requests are analysed but not
/// saved; naming a user requires that user's token.
pub fn resolve_owner(headers: &HeaderMap, requested: Option<&str>, secret: &str) -> ApiResult<Option<String>> {
    if auth::token_from_headers(headers).is_none() {
        return match requested {
            None => Ok(None),
            Some(_) => Err(ApiError::Unauthorized("Silakan login terlebih dahulu.".to_string())),
        };
    }
    let user = session::authenticate(headers, secret)?;
    if let Some(name) = requested {
        user.require(name)?;
    }
    Ok(Some(user.0))
}

pub fn save_history(pool: &DbPool, username: &str, analysis: &AcneAnalysis, created_at: i64) -> anyhow::Result<i64> {
    let record = NewAnalysis {
        username: username.to_string(),
        created_at,
        acne_count: analysis.total(),
        face_found: analysis.face_found,
        detail: analysis.counts.clone(),
        advice: analysis.advice.clone(),
        image_result: Some(analysis.image_result.clone()),
    };
    let conn = pool.get()?;
    db::writer::insert_analysis(&conn, &record)
}

pub async fn detect(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<Json<DetectResponse>> {
    let form = UploadForm::read(multipart).await?;
    let owner = resolve_owner(&headers, form.username.as_deref(), &state.config.jwt_secret)?;
    let bytes = form.require_file()?.clone();

    let processor = state.face_processor.clone();
    let detector = state.acne_detector.clone();
    let knowledge = state.knowledge.clone();
    let settings = state.settings;
    let result = tokio::task::spawn_blocking(move || -> ApiResult<anyhow::Result<Outcome>> {
        let image = upload::decode_image(&bytes)?;
        let processor = processor.read();
        let detector = detector.read();
        Ok(pipeline::analyze_acne(&image, &processor, &detector, &knowledge, &settings))
    })
    .await??;

    let analysis = match result {
        Ok(Outcome::Rejected(report)) => return Ok(Json(DetectResponse::rejected(report))),
        Ok(Outcome::Analyzed(analysis)) => *analysis,
        Err(e) if !state.acne_detector.read().loaded() => {
            warn!("Detect request while acne model unavailable: {}", e);
            return Err(ApiError::Unavailable("Model deteksi jerawat belum siap.".to_string()));
        }
        Err(e) => return Err(ApiError::Internal(e)),
    };

    let (analysis, saved_analysis_id) = match owner {
        Some(user) if state.faces.exists(&user) => {
            let pool = state.pool.clone();
            let created_at = chrono::Utc::now().timestamp();
            let (id, analysis) = tokio::task::spawn_blocking(move || {
                save_history(&pool, &user, &analysis, created_at).map(|id| (id, analysis))
            })
            .await??;
            info!("Saved analysis {}", id);
            (analysis, Some(id))
        }
        Some(user) => {
            info!("Not saving analysis for unregistered user {:?}", user);
            (analysis, None)
        }
        None => (analysis, None),
    };

    Ok(Json(DetectResponse::success(analysis, saved_analysis_id)))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(username): Path<String>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<History>> {
    validate_username(&username)?;
    user.require(&username)?;
    let limit = params.limit.unwrap_or(50);
    let pool = state.pool.clone();
    let name = username.clone();
    let (total, analyses) = tokio::task::spawn_blocking(move || -> anyhow::Result<(i64, Vec<AnalysisRecord>)> {
        let conn = pool.get()?;
        let total = db::query::count_analyses(&conn, &name)?;
        let analyses = db::query::list_analyses(&conn, &name, limit)?;
        Ok((total, analyses))
    })
    .await??;
    Ok(Json(History { username, total, analyses }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::bbox::BoundingBox;
    use axum::http::{header, HeaderValue, StatusCode};

    fn bearer(user: &str, secret: &str) -> HeaderMap {
        let token = auth::issue_token(user, secret, 60).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token)).unwrap());
        headers
    }

    #[test]
    fn anonymous_detect_is_allowed_but_unsaved() {
        assert_eq!(resolve_owner(&HeaderMap::new(), None, "k").unwrap(), None);
    }

    #[test]
    fn naming_a_user_needs_their_token() {
        let err = resolve_owner(&HeaderMap::new(), Some("budi"), "k").unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = resolve_owner(&bearer("ani", "k"), Some("budi"), "k").unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err = resolve_owner(&bearer("budi", "wrong"), Some("budi"), "k").unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(resolve_owner(&bearer("budi", "k"), Some("budi"), "k").unwrap(), Some("budi".to_string()));
        assert_eq!(resolve_owner(&bearer("budi", "k"), None, "k").unwrap(), Some("budi".to_string()));
    }

    #[test]
    fn success_body_shape() {
        let analysis = AcneAnalysis {
            quality: QualityReport { brightness: 120.0, sharpness: 300.0, verdict: Verdict::Ok },
            face_found: true,
            region: FaceRegion { x: 10, y: 20, width: 100, height: 120 },
            detections: vec![Detection {
                label: "papula".to_string(),
                class_id: 0,
                confidence: 0.9,
                bbox: BoundingBox::new(15.0, 25.0, 20.0, 30.0),
            }],
            counts: BTreeMap::from([("papula".to_string(), 1)]),
            advice: vec![Advice {
                kind: "papula".to_string(),
                treatment: "Retinoid topikal".to_string(),
                advice: "Jangan dipencet.".to_string(),
                known: true,
            }],
            image_result: "data:image/jpeg;base64,AAAA".to_string(),
        };
        let body = serde_json::to_value(DetectResponse::success(analysis, Some(7))).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["total"], 1);
        assert_eq!(body["face_found"], true);
        assert_eq!(body["detail_acne"]["papula"], 1);
        assert_eq!(body["detections"][0]["label"], "papula");
        assert_eq!(body["detections"][0]["bbox"]["x1"], 15.0);
        assert_eq!(body["advice"][0]["type"], "papula");
        assert_eq!(body["region"]["width"], 100);
        assert_eq!(body["quality"]["verdict"], "ok");
        assert_eq!(body["image_result"], "data:image/jpeg;base64,AAAA");
        assert_eq!(body["saved_analysis_id"], 7);
    }

    #[test]
    fn rejected_body_shape() {
        let report = QualityReport { brightness: 12.0, sharpness: 300.0, verdict: Verdict::TooDark };
        let body = serde_json::to_value(DetectResponse::rejected(report)).unwrap();
        assert_eq!(body["status"], "rejected");
        assert_eq!(body["reason"], "too_dark");
        assert_eq!(body["message"], Verdict::TooDark.message());
    }
}
