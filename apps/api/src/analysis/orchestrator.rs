//! Analysis pipeline.
//!
//! One `analyze` call walks
//! `Received → EntitiesLoaded → Matched → ParseAttempted|ParseSkipped → ResultPersisted
//! → DetailsPersisting → Completed`. Missing entities, a failed match and a failed result
//! write each end the run before anything else is written. Details are written one by
//! one after the result is committed; a failed detail is logged and the rest still go in.
//!
//! The request deadline covers every stage up to the result write. Once the result is
//! committed the run finishes its details regardless.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn, Span};
use uuid::Uuid;

use crate::analysis::details::{derive_details, WeightingPolicy};
use crate::models::analysis::{format_percentage, AnalysisDetail, AnalysisResult};
use crate::models::resume::{empty_object, Resume};
use crate::repository::{RepoError, Repository};
use crate::scoring::{compose_vacancy_text, ScoringClient, ScoringError};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    NotFound(String),

    #[error("Match scoring failed: {0}")]
    MatchFailed(#[source] ScoringError),

    #[error("Failed to persist analysis result: {0}")]
    ResultPersistFailed(#[source] RepoError),

    #[error(transparent)]
    Persistence(#[from] RepoError),

    #[error("Analysis exceeded its {0:?} deadline")]
    Cancelled(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Received,
    EntitiesLoaded,
    Matched,
    ParseAttempted,
    ParseSkipped,
    ResultPersisted,
    DetailsPersisting,
    Completed,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisStage::Received => "received",
            AnalysisStage::EntitiesLoaded => "entities_loaded",
            AnalysisStage::Matched => "matched",
            AnalysisStage::ParseAttempted => "parse_attempted",
            AnalysisStage::ParseSkipped => "parse_skipped",
            AnalysisStage::ResultPersisted => "result_persisted",
            AnalysisStage::DetailsPersisting => "details_persisting",
            AnalysisStage::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub analysis_id: Uuid,
    pub resume_id: Uuid,
    pub vacancy_id: Uuid,
    /// Two-decimal percentage, e.g. "87.00%".
    pub match_score: String,
    pub candidate_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_data: Option<Value>,
    pub details_saved: usize,
    pub details_failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub result: AnalysisResult,
    pub match_score_percent: String,
    pub details: Vec<AnalysisDetail>,
}

pub struct Analyzer {
    repo: Arc<dyn Repository>,
    scoring: Arc<dyn ScoringClient>,
    weighting: Arc<dyn WeightingPolicy>,
    request_timeout: Duration,
}

impl Analyzer {
    pub fn new(
        repo: Arc<dyn Repository>,
        scoring: Arc<dyn ScoringClient>,
        weighting: Arc<dyn WeightingPolicy>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            scoring,
            weighting,
            request_timeout,
        }
    }

    #[instrument(skip(self), fields(stage = %AnalysisStage::Received))]
    pub async fn analyze(
        &self,
        resume_id: Uuid,
        vacancy_id: Uuid,
    ) -> Result<AnalyzeResponse, AnalysisError> {
        // None when the timeout is too large to represent; such a run has no deadline.
        let deadline = Instant::now().checked_add(self.request_timeout);

        let resume = self
            .within(deadline, self.repo.find_resume(resume_id))
            .await??
            .ok_or_else(|| AnalysisError::NotFound(format!("Resume {resume_id} not found")))?;
        let vacancy = self
            .within(deadline, self.repo.find_vacancy(vacancy_id))
            .await??
            .ok_or_else(|| AnalysisError::NotFound(format!("Vacancy {vacancy_id} not found")))?;
        enter(AnalysisStage::EntitiesLoaded);

        let vacancy_text = compose_vacancy_text(&vacancy);
        let score = self
            .within(
                deadline,
                self.scoring.match_score(&resume.raw_text, &vacancy_text),
            )
            .await?
            .map_err(AnalysisError::MatchFailed)?;
        enter(AnalysisStage::Matched);

        let parsed = self.parsed_data(&resume, deadline).await?;

        let result = AnalysisResult {
            id: Uuid::new_v4(),
            resume_id: resume.id,
            vacancy_id: vacancy.id,
            match_score: f64::from(score),
            details: parsed.clone(),
            created_at: Utc::now(),
        };
        self.within(deadline, self.repo.create_analysis_result(&result))
            .await?
            .map_err(AnalysisError::ResultPersistFailed)?;
        enter(AnalysisStage::ResultPersisted);
        info!(
            analysis_id = %result.id,
            "Persisted analysis result with score {}",
            result.match_score
        );

        enter(AnalysisStage::DetailsPersisting);
        let (details_saved, details_failed) = self.persist_details(&parsed, result.id).await;
        enter(AnalysisStage::Completed);

        let has_parsed = parsed.as_object().map(|m| !m.is_empty()).unwrap_or(false);
        Ok(AnalyzeResponse {
            analysis_id: result.id,
            resume_id: resume.id,
            vacancy_id: vacancy.id,
            match_score: format_percentage(result.match_score),
            candidate_id: resume.candidate_id,
            created_at: result.created_at,
            parsed_data: has_parsed.then_some(parsed),
            details_saved,
            details_failed,
        })
    }

    /// Returns a stored result together with its details.
    pub async fn get_analysis(&self, id: Uuid) -> Result<AnalysisReport, AnalysisError> {
        let result = self
            .repo
            .find_analysis_result(id)
            .await?
            .ok_or_else(|| AnalysisError::NotFound(format!("Analysis {id} not found")))?;
        let details = self.repo.list_analysis_details(id).await?;

        Ok(AnalysisReport {
            match_score_percent: format_percentage(result.match_score),
            result,
            details,
        })
    }

    /// Reuses parsed data stored on the resume, otherwise asks the scoring service.
    /// A failed parse degrades to an empty object.
    async fn parsed_data(
        &self,
        resume: &Resume,
        deadline: Option<Instant>,
    ) -> Result<Value, AnalysisError> {
        if resume.has_parsed_data() {
            enter(AnalysisStage::ParseSkipped);
            return Ok(resume.parsed_data.clone());
        }

        let outcome = self
            .within(deadline, self.scoring.parse(&resume.raw_text))
            .await?;
        enter(AnalysisStage::ParseAttempted);

        match outcome {
            Ok(parsed) => {
                let mut updated = resume.clone();
                updated.parsed_data = parsed.clone();
                match self.within(deadline, self.repo.save_resume(&updated)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        warn!(resume_id = %resume.id, "Failed to store parsed data on resume: {e}")
                    }
                    Err(e) => {
                        warn!(resume_id = %resume.id, "Gave up storing parsed data on resume: {e}")
                    }
                }
                Ok(parsed)
            }
            Err(e) => {
                warn!(resume_id = %resume.id, "Resume parse failed, continuing without parsed data: {e}");
                Ok(empty_object())
            }
        }
    }

    async fn persist_details(&self, parsed: &Value, analysis_result_id: Uuid) -> (usize, usize) {
        let details = derive_details(parsed, analysis_result_id, self.weighting.as_ref());
        let mut saved = 0;
        let mut failed = 0;

        for detail in &details {
            match self.repo.create_analysis_detail(detail).await {
                Ok(()) => saved += 1,
                Err(e) => {
                    failed += 1;
                    warn!(
                        detail_id = %detail.id,
                        category = %detail.category,
                        criteria = %detail.criteria,
                        "Failed to persist analysis detail: {e}"
                    );
                }
            }
        }

        debug!("Persisted {saved}/{} analysis details", details.len());
        (saved, failed)
    }

    async fn within<F: Future>(
        &self,
        deadline: Option<Instant>,
        fut: F,
    ) -> Result<F::Output, AnalysisError> {
        match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| AnalysisError::Cancelled(self.request_timeout)),
            None => Ok(fut.await),
        }
    }
}

fn enter(stage: AnalysisStage) {
    Span::current().record("stage", tracing::field::display(stage));
    debug!("Analysis stage: {stage}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::details::FixedWeighting;
    use crate::models::vacancy::{NewVacancy, Vacancy};
    use crate::testing::{MemoryRepository, StubScoring};
    use serde_json::json;

    struct Fixture {
        repo: Arc<MemoryRepository>,
        scoring: Arc<StubScoring>,
        analyzer: Analyzer,
        resume: Resume,
        vacancy: Vacancy,
    }

    fn fixture(scoring: StubScoring) -> Fixture {
        let repo = Arc::new(MemoryRepository::default());
        let scoring = Arc::new(scoring);

        let resume = Resume::new(
            Uuid::new_v4(),
            "5 years backend engineering".into(),
            "https://files.test/r.pdf".into(),
        );
        let vacancy = Vacancy::from(NewVacancy {
            title: "Backend Engineer".into(),
            requirements: "API design, SQL".into(),
            responsibilities: "Build services".into(),
            skills: "Distributed systems".into(),
            ..Default::default()
        });
        repo.insert_resume(resume.clone());
        repo.insert_vacancy(vacancy.clone());

        let analyzer = Analyzer::new(
            repo.clone(),
            scoring.clone(),
            Arc::new(FixedWeighting::default()),
            Duration::from_secs(5),
        );
        Fixture {
            repo,
            scoring,
            analyzer,
            resume,
            vacancy,
        }
    }

    #[tokio::test]
    async fn test_backend_engineer_scenario() {
        let f = fixture(StubScoring::new(0.87).with_parsed(json!({"skills": ["Go", "SQL"]})));

        let response = f.analyzer.analyze(f.resume.id, f.vacancy.id).await.unwrap();

        assert_eq!(response.match_score, "87.00%");
        assert_eq!(response.resume_id, f.resume.id);
        assert_eq!(response.vacancy_id, f.vacancy.id);
        assert_eq!(response.candidate_id, f.resume.candidate_id);
        assert_eq!(response.parsed_data, Some(json!({"skills": ["Go", "SQL"]})));
        assert_eq!(response.details_saved, 2);
        assert_eq!(response.details_failed, 0);
        assert_eq!(
            f.scoring.match_calls(),
            vec![(
                "5 years backend engineering".to_string(),
                "Backend Engineer API design, SQL Build services Distributed systems".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_exactly_one_result_with_identical_score() {
        let f = fixture(StubScoring::new(0.42));
        let response = f.analyzer.analyze(f.resume.id, f.vacancy.id).await.unwrap();

        let results = f.repo.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, response.analysis_id);
        assert_eq!(results[0].match_score, f64::from(0.42_f32));
        assert_eq!(results[0].resume_id, f.resume.id);
        assert_eq!(results[0].vacancy_id, f.vacancy.id);
    }

    #[tokio::test]
    async fn test_repeated_runs_are_not_deduplicated() {
        let f = fixture(StubScoring::new(0.5));
        f.analyzer.analyze(f.resume.id, f.vacancy.id).await.unwrap();
        f.analyzer.analyze(f.resume.id, f.vacancy.id).await.unwrap();

        assert_eq!(f.repo.results().len(), 2);
        let calls = f.scoring.match_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
    }

    #[tokio::test]
    async fn test_missing_resume_is_not_found_and_writes_nothing() {
        let f = fixture(StubScoring::new(0.9));
        let err = f
            .analyzer
            .analyze(Uuid::new_v4(), f.vacancy.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::NotFound(_)));
        assert!(f.repo.results().is_empty());
        assert!(f.repo.details().is_empty());
        assert!(f.scoring.match_calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_vacancy_is_not_found() {
        let f = fixture(StubScoring::new(0.9));
        let err = f
            .analyzer
            .analyze(f.resume.id, Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::NotFound(_)));
        assert!(f.repo.results().is_empty());
    }

    #[tokio::test]
    async fn test_match_failure_writes_no_result() {
        let f = fixture(
            StubScoring::new(0.9)
                .failing_match()
                .with_parsed(json!({"skills": ["Go"]})),
        );
        let err = f
            .analyzer
            .analyze(f.resume.id, f.vacancy.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::MatchFailed(_)));
        assert!(f.repo.results().is_empty());
        assert!(f.repo.details().is_empty());
        assert_eq!(f.scoring.parse_calls(), 0);
    }

    #[tokio::test]
    async fn test_parse_failure_still_persists_result() {
        let f = fixture(StubScoring::new(0.7).failing_parse());
        let response = f.analyzer.analyze(f.resume.id, f.vacancy.id).await.unwrap();

        assert_eq!(response.parsed_data, None);
        assert_eq!(response.details_saved, 0);
        let results = f.repo.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].details, json!({}));
        assert!(f.repo.details().is_empty());
    }

    #[tokio::test]
    async fn test_successful_parse_is_stored_on_resume() {
        let parsed = json!({"languages": ["English"]});
        let f = fixture(StubScoring::new(0.7).with_parsed(parsed.clone()));
        f.analyzer.analyze(f.resume.id, f.vacancy.id).await.unwrap();

        assert_eq!(f.repo.resume(f.resume.id).unwrap().parsed_data, parsed);
        assert_eq!(f.scoring.parse_calls(), 1);

        // Second run reuses the stored data instead of parsing again.
        f.analyzer.analyze(f.resume.id, f.vacancy.id).await.unwrap();
        assert_eq!(f.scoring.parse_calls(), 1);
    }

    #[tokio::test]
    async fn test_resume_save_failure_is_not_fatal() {
        let f = fixture(StubScoring::new(0.7).with_parsed(json!({"skills": ["Go"]})));
        f.repo.fail_resume_saves();

        let response = f.analyzer.analyze(f.resume.id, f.vacancy.id).await.unwrap();
        assert_eq!(response.details_saved, 1);
    }

    #[tokio::test]
    async fn test_result_persist_failure_aborts_before_details() {
        let f = fixture(StubScoring::new(0.7).with_parsed(json!({"skills": ["Go"]})));
        f.repo.fail_result_writes();

        let err = f
            .analyzer
            .analyze(f.resume.id, f.vacancy.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::ResultPersistFailed(_)));
        assert!(f.repo.details().is_empty());
        assert_eq!(f.repo.detail_attempts(), 0);
    }

    #[tokio::test]
    async fn test_failed_detail_does_not_stop_siblings() {
        let f = fixture(
            StubScoring::new(0.6).with_parsed(json!({"skills": ["Go", "Rust", "SQL", "Kafka"]})),
        );
        f.repo.fail_detail_attempt(1);

        let response = f.analyzer.analyze(f.resume.id, f.vacancy.id).await.unwrap();

        assert_eq!(f.repo.detail_attempts(), 4);
        assert_eq!(response.details_saved, 3);
        assert_eq!(response.details_failed, 1);
        let values: Vec<String> = f
            .repo
            .details()
            .into_iter()
            .map(|d| d.resume_value)
            .collect();
        assert_eq!(values, vec!["Go", "SQL", "Kafka"]);
        assert!(f
            .repo
            .details()
            .iter()
            .all(|d| d.analysis_result_id == response.analysis_id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cancels_before_any_write() {
        let repo = Arc::new(MemoryRepository::default());
        let scoring = Arc::new(StubScoring::new(0.9).with_delay(Duration::from_secs(30)));
        let resume = Resume::new(Uuid::new_v4(), "text".into(), "url".into());
        let vacancy = Vacancy::from(NewVacancy {
            title: "QA".into(),
            ..Default::default()
        });
        repo.insert_resume(resume.clone());
        repo.insert_vacancy(vacancy.clone());

        let analyzer = Analyzer::new(
            repo.clone(),
            scoring,
            Arc::new(FixedWeighting::default()),
            Duration::from_secs(1),
        );
        let err = analyzer.analyze(resume.id, vacancy.id).await.unwrap_err();

        assert!(matches!(err, AnalysisError::Cancelled(_)));
        assert!(repo.results().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_parsed_data_write_back_is_bounded_by_deadline() {
        let repo = Arc::new(MemoryRepository::default());
        repo.delay_resume_saves(Duration::from_secs(30));
        let scoring = Arc::new(StubScoring::new(0.6).with_parsed(json!({"skills": ["Go"]})));
        let resume = Resume::new(Uuid::new_v4(), "text".into(), "url".into());
        let vacancy = Vacancy::from(NewVacancy {
            title: "QA".into(),
            ..Default::default()
        });
        repo.insert_resume(resume.clone());
        repo.insert_vacancy(vacancy.clone());

        let analyzer = Analyzer::new(
            repo.clone(),
            scoring,
            Arc::new(FixedWeighting::default()),
            Duration::from_secs(1),
        );
        let started = Instant::now();
        let outcome = analyzer.analyze(resume.id, vacancy.id).await;

        assert!(started.elapsed() < Duration::from_secs(30));
        assert!(!repo.resume(resume.id).unwrap().has_parsed_data());
        if let Err(e) = outcome {
            assert!(matches!(e, AnalysisError::Cancelled(_)), "{e}");
        }
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_runs_without_deadline() {
        let repo = Arc::new(MemoryRepository::default());
        let resume = Resume::new(Uuid::new_v4(), "text".into(), "url".into());
        let vacancy = Vacancy::from(NewVacancy {
            title: "QA".into(),
            ..Default::default()
        });
        repo.insert_resume(resume.clone());
        repo.insert_vacancy(vacancy.clone());

        let analyzer = Analyzer::new(
            repo.clone(),
            Arc::new(StubScoring::new(0.5)),
            Arc::new(FixedWeighting::default()),
            Duration::from_secs(u64::MAX),
        );
        let response = analyzer.analyze(resume.id, vacancy.id).await.unwrap();

        assert_eq!(response.match_score, "50.00%");
        assert_eq!(repo.results().len(), 1);
    }

    #[tokio::test]
    async fn test_get_analysis_returns_result_and_details() {
        let f = fixture(StubScoring::new(0.87).with_parsed(json!({"skills": {"db": ["SQL"]}})));
        let response = f.analyzer.analyze(f.resume.id, f.vacancy.id).await.unwrap();

        let report = f.analyzer.get_analysis(response.analysis_id).await.unwrap();
        assert_eq!(report.match_score_percent, "87.00%");
        assert_eq!(report.details.len(), 1);
        assert_eq!(report.details[0].criteria, "db");

        assert!(matches!(
            f.analyzer.get_analysis(Uuid::new_v4()).await,
            Err(AnalysisError::NotFound(_))
        ));
    }
}
