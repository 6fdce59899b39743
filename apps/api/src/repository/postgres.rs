use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{RepoError, Repository};
use crate::models::analysis::{AnalysisDetail, AnalysisResult};
use crate::models::resume::Resume;
use crate::models::vacancy::Vacancy;

/// `Repository` over a shared PostgreSQL pool. Each call is its own statement;
/// nothing here opens a multi-statement transaction.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn ping(&self) -> Result<(), RepoError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_resume(&self, resume: &Resume) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO resumes (id, candidate_id, raw_text, parsed_data, file_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(resume.id)
        .bind(resume.candidate_id)
        .bind(&resume.raw_text)
        .bind(&resume.parsed_data)
        .bind(&resume.file_url)
        .bind(resume.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_resume(&self, id: Uuid) -> Result<Option<Resume>, RepoError> {
        Ok(
            sqlx::query_as::<_, Resume>("SELECT * FROM resumes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn save_resume(&self, resume: &Resume) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE resumes
            SET candidate_id = $2, raw_text = $3, parsed_data = $4, file_url = $5
            WHERE id = $1
            "#,
        )
        .bind(resume.id)
        .bind(resume.candidate_id)
        .bind(&resume.raw_text)
        .bind(&resume.parsed_data)
        .bind(&resume.file_url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_vacancy(&self, vacancy: &Vacancy) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO vacancies
                (id, title, requirements, responsibilities, region, city, employment_type,
                 work_schedule, experience, education, salary_min, salary_max, languages,
                 skills, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(vacancy.id)
        .bind(&vacancy.title)
        .bind(&vacancy.requirements)
        .bind(&vacancy.responsibilities)
        .bind(&vacancy.region)
        .bind(&vacancy.city)
        .bind(&vacancy.employment_type)
        .bind(&vacancy.work_schedule)
        .bind(&vacancy.experience)
        .bind(&vacancy.education)
        .bind(vacancy.salary_min)
        .bind(vacancy.salary_max)
        .bind(&vacancy.languages)
        .bind(&vacancy.skills)
        .bind(vacancy.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_vacancy(&self, id: Uuid) -> Result<Option<Vacancy>, RepoError> {
        Ok(
            sqlx::query_as::<_, Vacancy>("SELECT * FROM vacancies WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create_analysis_result(&self, result: &AnalysisResult) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO analysis_results (id, resume_id, vacancy_id, match_score, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(result.id)
        .bind(result.resume_id)
        .bind(result.vacancy_id)
        .bind(result.match_score)
        .bind(&result.details)
        .bind(result.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_analysis_result(&self, id: Uuid) -> Result<Option<AnalysisResult>, RepoError> {
        Ok(
            sqlx::query_as::<_, AnalysisResult>("SELECT * FROM analysis_results WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create_analysis_detail(&self, detail: &AnalysisDetail) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO analysis_details
                (id, analysis_result_id, category, criteria, resume_value, vacancy_value,
                 match_score, weight, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(detail.id)
        .bind(detail.analysis_result_id)
        .bind(&detail.category)
        .bind(&detail.criteria)
        .bind(&detail.resume_value)
        .bind(&detail.vacancy_value)
        .bind(detail.match_score)
        .bind(detail.weight)
        .bind(detail.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_analysis_details(
        &self,
        analysis_result_id: Uuid,
    ) -> Result<Vec<AnalysisDetail>, RepoError> {
        Ok(sqlx::query_as::<_, AnalysisDetail>(
            "SELECT * FROM analysis_details WHERE analysis_result_id = $1 ORDER BY created_at, id",
        )
        .bind(analysis_result_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
