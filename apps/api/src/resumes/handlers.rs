use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::Resume;
use crate::resumes::ingest::{ResumeUpload, UploadResumeResponse};
use crate::state::AppState;

/// Multipart field carrying the resume file.
const RESUME_FIELD: &str = "resume";

/// POST /api/v1/resumes
///
/// Accepts a `.pdf` or `.docx` in the `resume` field.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResumeResponse>, AppError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read uploaded file: {e}")))?;
        upload = Some(ResumeUpload { filename, bytes });
        break;
    }

    let upload = upload.ok_or_else(|| {
        AppError::Validation(format!("Multipart field '{RESUME_FIELD}' is required"))
    })?;

    Ok(Json(state.ingestor.ingest(upload).await?))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Resume>, AppError> {
    let resume = state
        .repo
        .find_resume(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    Ok(Json(resume))
}
