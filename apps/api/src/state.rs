use std::sync::Arc;

use crate::analysis::Analyzer;
use crate::config::Config;
use crate::repository::Repository;
use crate::resumes::ResumeIngestor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub analyzer: Arc<Analyzer>,
    pub ingestor: Arc<ResumeIngestor>,
    pub config: Config,
}
