//! Resume upload pipeline: validate → extract text → store file → best-effort parse →
//! persist. The file type is checked before any extraction or upload happens.

use std::sync::Arc;

use anyhow::anyhow;
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{DocumentFormat, ExtractorRegistry};
use crate::models::resume::Resume;
use crate::repository::Repository;
use crate::scoring::ScoringClient;
use crate::storage::FileStore;

pub struct ResumeUpload {
    pub filename: String,
    pub bytes: Bytes,
}

#[derive(Debug, Serialize)]
pub struct UploadResumeResponse {
    pub resume_id: Uuid,
    pub candidate_id: Uuid,
    pub file_url: String,
    /// Whether the scoring service enriched the resume with parsed data.
    pub parsed: bool,
}

pub struct ResumeIngestor {
    repo: Arc<dyn Repository>,
    store: Arc<dyn FileStore>,
    scoring: Arc<dyn ScoringClient>,
    extractors: Arc<ExtractorRegistry>,
    parse_on_upload: bool,
}

impl ResumeIngestor {
    pub fn new(
        repo: Arc<dyn Repository>,
        store: Arc<dyn FileStore>,
        scoring: Arc<dyn ScoringClient>,
        extractors: Arc<ExtractorRegistry>,
        parse_on_upload: bool,
    ) -> Self {
        Self {
            repo,
            store,
            scoring,
            extractors,
            parse_on_upload,
        }
    }

    #[instrument(skip_all, fields(filename = %upload.filename, size = upload.bytes.len()))]
    pub async fn ingest(&self, upload: ResumeUpload) -> Result<UploadResumeResponse, AppError> {
        let format = DocumentFormat::from_filename(&upload.filename)?;
        self.extractors.check_size(upload.bytes.len())?;

        let extractors = self.extractors.clone();
        let bytes = upload.bytes.clone();
        let raw_text = tokio::task::spawn_blocking(move || extractors.extract(&bytes, format))
            .await
            .map_err(|e| AppError::Internal(anyhow!("extraction task failed: {e}")))??;

        let candidate_id = Uuid::new_v4();
        let destination = format!("{candidate_id}.{}", format.extension());
        let file_url = self
            .store
            .upload(upload.bytes, &destination, format.content_type())
            .await?;

        let mut resume = Resume::new(candidate_id, raw_text, file_url);
        if self.parse_on_upload {
            match self.scoring.parse(&resume.raw_text).await {
                Ok(parsed) => resume.parsed_data = parsed,
                Err(e) => warn!("Resume parse on upload failed, storing without parsed data: {e}"),
            }
        }

        self.repo.create_resume(&resume).await?;
        info!(
            resume_id = %resume.id,
            candidate_id = %candidate_id,
            "Stored {format} resume ({} chars of text)",
            resume.raw_text.len()
        );

        Ok(UploadResumeResponse {
            resume_id: resume.id,
            candidate_id,
            parsed: resume.has_parsed_data(),
            file_url: resume.file_url,
        })
    }
}
