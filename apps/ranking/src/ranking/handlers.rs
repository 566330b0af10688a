use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::features::transform::FeatureVector;
use crate::ranking::bias::BiasReport;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RankingRequest {
    #[serde(rename = "resumeID")]
    pub resume_id: String,
}

#[derive(Serialize)]
pub struct RankingResponse {
    pub ranking_score: f64,
}

#[derive(Serialize)]
pub struct PredictResponse {
    pub score: f64,
}

/// POST /api/v1/ranking
pub async fn handle_rank(
    State(state): State<AppState>,
    Json(req): Json<RankingRequest>,
) -> Result<Json<RankingResponse>, AppError> {
    let resume_id = Uuid::parse_str(req.resume_id.trim())
        .map_err(|_| AppError::Validation(format!("Invalid resumeID '{}'", req.resume_id)))?;

    info!(%resume_id, "Ranking resume");
    let ranking_score = state.ranking.rank(resume_id).await?;
    Ok(Json(RankingResponse { ranking_score }))
}

/// POST /api/v1/predict
pub async fn handle_predict(
    State(state): State<AppState>,
    Json(features): Json<FeatureVector>,
) -> Result<Json<PredictResponse>, AppError> {
    validate_features(&features)?;
    let score = state.ranking.predict(&features).await?;
    Ok(Json(PredictResponse { score }))
}

/// POST /api/v1/jobs/:job_id/bias-audit
pub async fn handle_bias_audit(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<BiasReport>, AppError> {
    let guard = state
        .audit_lock
        .acquire(job_id)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("A bias audit for job {job_id} is already running")))?;

    let report = state.ranking.audit_job(job_id, &state.config.bias).await;
    let released = guard.release().await;
    Ok(Json(audit_outcome(job_id, report, released)?))
}

/// The audit result decides the response. A failed release is only logged:
/// the scores are already committed and the lock TTL frees the key.
fn audit_outcome(
    job_id: Uuid,
    report: Result<BiasReport, AppError>,
    released: Result<(), AppError>,
) -> Result<BiasReport, AppError> {
    if let Err(e) = released {
        warn!(%job_id, error = %e, "could not release bias audit lock; leaving it to expire");
    }
    report
}

fn validate_features(features: &FeatureVector) -> Result<(), AppError> {
    let unit = [
        ("education_similarity", features.education_similarity),
        ("cosine_similarity_skills", features.cosine_similarity_skills),
    ];
    for (name, value) in unit {
        if !(0.0..=1.0).contains(&value) {
            return Err(AppError::Validation(format!("{name} must be within [0, 1]")));
        }
    }

    let non_negative = [
        ("experience_years", features.experience_years),
        ("exp_req_encoded", features.exp_req_encoded),
    ];
    for (name, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::Validation(format!("{name} must be a non-negative number")));
        }
    }

    for (name, rank) in [
        ("highest_degree", features.highest_degree),
        ("ed_req_encoded", features.ed_req_encoded),
    ] {
        if rank > 6 {
            return Err(AppError::Validation(format!("{name} must be between 0 and 6")));
        }
    }
    Ok(())
}
