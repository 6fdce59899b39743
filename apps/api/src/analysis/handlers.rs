use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::analysis::orchestrator::{AnalysisReport, AnalyzeResponse};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub resume_id: Uuid,
    pub vacancy_id: Uuid,
}

/// POST /api/v1/analyze
///
/// Scores a stored resume against a stored vacancy and persists the breakdown.
pub async fn handle_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let response = state
        .analyzer
        .analyze(request.resume_id, request.vacancy_id)
        .await?;
    Ok(Json(response))
}

/// GET /api/v1/analyses/:id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisReport>, AppError> {
    Ok(Json(state.analyzer.get_analysis(id).await?))
}
