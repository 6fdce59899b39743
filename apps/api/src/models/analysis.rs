use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One scoring run of a resume against a vacancy.
/// `match_score` is a raw fraction in [0, 1]; percentages exist only in responses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub vacancy_id: Uuid,
    pub match_score: f64,
    pub details: Value,
    pub created_at: DateTime<Utc>,
}

/// Per-criterion breakdown row. Always written after its parent result is committed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisDetail {
    pub id: Uuid,
    pub analysis_result_id: Uuid,
    pub category: String,
    pub criteria: String,
    pub resume_value: String,
    pub vacancy_value: String,
    pub match_score: f64, // 0.0 – 1.0
    pub weight: f64,      // 0.0 – 1.0
    pub created_at: DateTime<Utc>,
}

/// Formats a raw fraction as the two-decimal percentage used in API responses.
pub fn format_percentage(score: f64) -> String {
    format!("{:.2}%", score * 100.0)
}
