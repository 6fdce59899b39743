//! In-process doubles for the repository, scoring service and file store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use uuid::Uuid;

use crate::models::analysis::{AnalysisDetail, AnalysisResult};
use crate::models::resume::Resume;
use crate::models::vacancy::Vacancy;
use crate::repository::{RepoError, Repository};
use crate::scoring::{ScoringClient, ScoringError};
use crate::storage::{FileStore, StoreError};

fn injected(what: &str) -> RepoError {
    RepoError::Database(sqlx::Error::Protocol(format!("injected {what} failure")))
}

/// Repository keeping rows in memory. Enforces the parent/child references the SQL
/// schema enforces with foreign keys.
#[derive(Default)]
pub struct MemoryRepository {
    resumes: Mutex<HashMap<Uuid, Resume>>,
    vacancies: Mutex<HashMap<Uuid, Vacancy>>,
    results: Mutex<Vec<AnalysisResult>>,
    details: Mutex<Vec<AnalysisDetail>>,
    detail_attempts: AtomicUsize,
    failing_detail_attempt: Mutex<Option<usize>>,
    fail_results: AtomicBool,
    fail_resume_saves: AtomicBool,
    resume_save_delay: Mutex<Option<Duration>>,
}

impl MemoryRepository {
    pub fn insert_resume(&self, resume: Resume) {
        self.resumes.lock().unwrap().insert(resume.id, resume);
    }

    pub fn insert_vacancy(&self, vacancy: Vacancy) {
        self.vacancies.lock().unwrap().insert(vacancy.id, vacancy);
    }

    pub fn resume(&self, id: Uuid) -> Option<Resume> {
        self.resumes.lock().unwrap().get(&id).cloned()
    }

    pub fn resume_count(&self) -> usize {
        self.resumes.lock().unwrap().len()
    }

    pub fn vacancy_count(&self) -> usize {
        self.vacancies.lock().unwrap().len()
    }

    pub fn results(&self) -> Vec<AnalysisResult> {
        self.results.lock().unwrap().clone()
    }

    pub fn details(&self) -> Vec<AnalysisDetail> {
        self.details.lock().unwrap().clone()
    }

    pub fn detail_attempts(&self) -> usize {
        self.detail_attempts.load(Ordering::SeqCst)
    }

    /// Makes the detail write with this zero-based attempt index fail.
    pub fn fail_detail_attempt(&self, index: usize) {
        *self.failing_detail_attempt.lock().unwrap() = Some(index);
    }

    pub fn fail_result_writes(&self) {
        self.fail_results.store(true, Ordering::SeqCst);
    }

    pub fn fail_resume_saves(&self) {
        self.fail_resume_saves.store(true, Ordering::SeqCst);
    }

    pub fn delay_resume_saves(&self, delay: Duration) {
        *self.resume_save_delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }

    async fn create_resume(&self, resume: &Resume) -> Result<(), RepoError> {
        self.insert_resume(resume.clone());
        Ok(())
    }

    async fn find_resume(&self, id: Uuid) -> Result<Option<Resume>, RepoError> {
        Ok(self.resume(id))
    }

    async fn save_resume(&self, resume: &Resume) -> Result<(), RepoError> {
        let delay = *self.resume_save_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_resume_saves.load(Ordering::SeqCst) {
            return Err(injected("resume save"));
        }
        self.insert_resume(resume.clone());
        Ok(())
    }

    async fn create_vacancy(&self, vacancy: &Vacancy) -> Result<(), RepoError> {
        self.insert_vacancy(vacancy.clone());
        Ok(())
    }

    async fn find_vacancy(&self, id: Uuid) -> Result<Option<Vacancy>, RepoError> {
        Ok(self.vacancies.lock().unwrap().get(&id).cloned())
    }

    async fn create_analysis_result(&self, result: &AnalysisResult) -> Result<(), RepoError> {
        if self.fail_results.load(Ordering::SeqCst) {
            return Err(injected("result write"));
        }
        if self.resume(result.resume_id).is_none()
            || !self.vacancies.lock().unwrap().contains_key(&result.vacancy_id)
        {
            return Err(injected("foreign key"));
        }
        self.results.lock().unwrap().push(result.clone());
        Ok(())
    }

    async fn find_analysis_result(&self, id: Uuid) -> Result<Option<AnalysisResult>, RepoError> {
        Ok(self
            .results
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn create_analysis_detail(&self, detail: &AnalysisDetail) -> Result<(), RepoError> {
        let attempt = self.detail_attempts.fetch_add(1, Ordering::SeqCst);
        if *self.failing_detail_attempt.lock().unwrap() == Some(attempt) {
            return Err(injected("detail write"));
        }
        let parent_exists = self
            .results
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.id == detail.analysis_result_id);
        if !parent_exists {
            return Err(injected("foreign key"));
        }
        self.details.lock().unwrap().push(detail.clone());
        Ok(())
    }

    async fn list_analysis_details(
        &self,
        analysis_result_id: Uuid,
    ) -> Result<Vec<AnalysisDetail>, RepoError> {
        Ok(self
            .details
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.analysis_result_id == analysis_result_id)
            .cloned()
            .collect())
    }
}

/// Scoring service returning a fixed score and, optionally, fixed parsed data.
pub struct StubScoring {
    score: f32,
    parsed: Option<Value>,
    match_fails: bool,
    delay: Option<Duration>,
    match_calls: Mutex<Vec<(String, String)>>,
    parse_calls: AtomicUsize,
}

impl StubScoring {
    /// Parse fails until `with_parsed` is called.
    pub fn new(score: f32) -> Self {
        Self {
            score,
            parsed: None,
            match_fails: false,
            delay: None,
            match_calls: Mutex::new(Vec::new()),
            parse_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_parsed(mut self, parsed: Value) -> Self {
        self.parsed = Some(parsed);
        self
    }

    pub fn failing_parse(mut self) -> Self {
        self.parsed = None;
        self
    }

    pub fn failing_match(mut self) -> Self {
        self.match_fails = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn match_calls(&self) -> Vec<(String, String)> {
        self.match_calls.lock().unwrap().clone()
    }

    pub fn parse_calls(&self) -> usize {
        self.parse_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoringClient for StubScoring {
    async fn parse(&self, _text: &str) -> Result<Value, ScoringError> {
        self.parse_calls.fetch_add(1, Ordering::SeqCst);
        self.parsed
            .clone()
            .ok_or_else(|| ScoringError::from(tonic::Status::internal("parse unavailable")))
    }

    async fn match_score(
        &self,
        resume_text: &str,
        vacancy_text: &str,
    ) -> Result<f32, ScoringError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.match_calls
            .lock()
            .unwrap()
            .push((resume_text.to_string(), vacancy_text.to_string()));
        if self.match_fails {
            return Err(ScoringError::Transport("connection refused".to_string()));
        }
        Ok(self.score)
    }
}

/// File store recording destinations and answering with a fake public URL.
#[derive(Default)]
pub struct RecordingStore {
    uploads: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileStore for RecordingStore {
    async fn ensure_folder(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn upload(
        &self,
        _bytes: Bytes,
        destination: &str,
        _content_type: &str,
    ) -> Result<String, StoreError> {
        self.uploads.lock().unwrap().push(destination.to_string());
        Ok(format!("https://files.test/{destination}"))
    }
}
