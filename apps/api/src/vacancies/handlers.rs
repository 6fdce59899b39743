use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::vacancy::{NewVacancy, Vacancy};
use crate::state::AppState;
use crate::vacancies::create_vacancy;

#[derive(Debug, Serialize)]
pub struct CreateVacancyResponse {
    pub vacancy_id: Uuid,
    pub title: String,
}

/// POST /api/v1/vacancies
pub async fn handle_create_vacancy(
    State(state): State<AppState>,
    payload: Result<Json<NewVacancy>, JsonRejection>,
) -> Result<Json<CreateVacancyResponse>, AppError> {
    let Json(submission) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let vacancy = create_vacancy(state.repo.as_ref(), submission).await?;

    Ok(Json(CreateVacancyResponse {
        vacancy_id: vacancy.id,
        title: vacancy.title,
    }))
}

/// GET /api/v1/vacancies/:id
pub async fn handle_get_vacancy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vacancy>, AppError> {
    let vacancy = state
        .repo
        .find_vacancy(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Vacancy {id} not found")))?;
    Ok(Json(vacancy))
}
