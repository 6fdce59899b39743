//! Keyed create/read/save of resumes, vacancies and analysis rows.

pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::analysis::{AnalysisDetail, AnalysisResult};
use crate::models::resume::Resume;
use crate::models::vacancy::Vacancy;

pub use postgres::PgRepository;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait Repository: Send + Sync {
    /// Cheap round trip used by the health check.
    async fn ping(&self) -> Result<(), RepoError>;

    async fn create_resume(&self, resume: &Resume) -> Result<(), RepoError>;
    async fn find_resume(&self, id: Uuid) -> Result<Option<Resume>, RepoError>;
    async fn save_resume(&self, resume: &Resume) -> Result<(), RepoError>;

    async fn create_vacancy(&self, vacancy: &Vacancy) -> Result<(), RepoError>;
    async fn find_vacancy(&self, id: Uuid) -> Result<Option<Vacancy>, RepoError>;

    async fn create_analysis_result(&self, result: &AnalysisResult) -> Result<(), RepoError>;
    async fn find_analysis_result(&self, id: Uuid) -> Result<Option<AnalysisResult>, RepoError>;

    async fn create_analysis_detail(&self, detail: &AnalysisDetail) -> Result<(), RepoError>;
    async fn list_analysis_details(
        &self,
        analysis_result_id: Uuid,
    ) -> Result<Vec<AnalysisDetail>, RepoError>;
}
