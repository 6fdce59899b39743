//! Client for the remote NLP service that parses resumes and scores
//! resume/vacancy pairs.
//!
//! The analyzer and the resume ingestor share an `Arc<dyn ScoringClient>`; production
//! uses `GrpcScoringClient`.
//! Parse failures are tolerated by callers, match failures are not.

pub mod grpc;
pub mod proto;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::vacancy::Vacancy;

pub use grpc::GrpcScoringClient;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("scoring service unreachable: {0}")]
    Transport(String),

    #[error("scoring service returned {code:?}: {message}")]
    Status { code: tonic::Code, message: String },

    #[error("scoring call timed out after {0:?}")]
    Timeout(Duration),

    #[error("scoring service returned out-of-range score {0}")]
    InvalidScore(f32),

    #[error("scoring service returned malformed parse data: {0}")]
    InvalidPayload(String),
}

impl ScoringError {
    /// Failures worth another attempt: the request may succeed unchanged.
    pub fn is_transient(&self) -> bool {
        match self {
            ScoringError::Transport(_) | ScoringError::Timeout(_) => true,
            ScoringError::Status { code, .. } => matches!(
                code,
                tonic::Code::Unavailable
                    | tonic::Code::DeadlineExceeded
                    | tonic::Code::ResourceExhausted
            ),
            ScoringError::InvalidScore(_) | ScoringError::InvalidPayload(_) => false,
        }
    }
}

impl From<tonic::Status> for ScoringError {
    fn from(status: tonic::Status) -> Self {
        ScoringError::Status {
            code: status.code(),
            message: status.message().to_string(),
        }
    }
}

#[async_trait]
pub trait ScoringClient: Send + Sync {
    /// Structured fields extracted from resume text. Always a JSON object.
    async fn parse(&self, text: &str) -> Result<Value, ScoringError>;

    /// Similarity of a resume to a vacancy, in [0, 1].
    async fn match_score(&self, resume_text: &str, vacancy_text: &str)
        -> Result<f32, ScoringError>;
}

/// The text a vacancy is scored as: title, requirements, responsibilities and skills,
/// single-space separated, always in that order.
pub fn compose_vacancy_text(vacancy: &Vacancy) -> String {
    [
        vacancy.title.as_str(),
        vacancy.requirements.as_str(),
        vacancy.responsibilities.as_str(),
        vacancy.skills.as_str(),
    ]
    .join(" ")
}

pub(crate) fn validate_score(score: f32) -> Result<f32, ScoringError> {
    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(ScoringError::InvalidScore(score))
    }
}

pub(crate) fn decode_parsed_data(raw: &str) -> Result<Value, ScoringError> {
    let mut value: Value =
        serde_json::from_str(raw).map_err(|e| ScoringError::InvalidPayload(e.to_string()))?;
    if !value.is_object() {
        return Err(ScoringError::InvalidPayload(
            "expected a JSON object".to_string(),
        ));
    }
    strip_nul(&mut value);
    Ok(value)
}

/// Removes NUL from every string and key; JSONB cannot store `\u0000`.
fn strip_nul(value: &mut Value) {
    match value {
        Value::String(s) => s.retain(|c| c != '\0'),
        Value::Array(items) => items.iter_mut().for_each(strip_nul),
        Value::Object(map) => {
            let entries = std::mem::take(map);
            *map = entries
                .into_iter()
                .map(|(mut key, mut v)| {
                    key.retain(|c| c != '\0');
                    strip_nul(&mut v);
                    (key, v)
                })
                .collect();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vacancy::NewVacancy;
    use serde_json::json;

    fn backend_vacancy() -> Vacancy {
        Vacancy::from(NewVacancy {
            title: "Backend Engineer".into(),
            requirements: "API design, SQL".into(),
            responsibilities: "Build services".into(),
            skills: "Distributed systems".into(),
            city: "Moscow".into(),
            languages: "English".into(),
            ..Default::default()
        })
    }

    #[test]
    fn test_vacancy_text_field_order() {
        assert_eq!(
            compose_vacancy_text(&backend_vacancy()),
            "Backend Engineer API design, SQL Build services Distributed systems"
        );
    }

    #[test]
    fn test_vacancy_text_keeps_separators_for_empty_fields() {
        let vacancy = Vacancy::from(NewVacancy {
            title: "QA".into(),
            skills: "Selenium".into(),
            ..Default::default()
        });
        assert_eq!(compose_vacancy_text(&vacancy), "QA   Selenium");
    }

    #[test]
    fn test_validate_score_range() {
        assert_eq!(validate_score(0.0).unwrap(), 0.0);
        assert_eq!(validate_score(1.0).unwrap(), 1.0);
        assert!(validate_score(1.01).is_err());
        assert!(validate_score(-0.1).is_err());
        assert!(validate_score(f32::NAN).is_err());
    }

    #[test]
    fn test_decode_parsed_data_requires_object() {
        let value = decode_parsed_data(r#"{"skills": ["Go", "Python"], "experience": 5}"#).unwrap();
        assert_eq!(value["skills"], json!(["Go", "Python"]));
        assert!(decode_parsed_data("[1, 2]").is_err());
        assert!(decode_parsed_data("").is_err());
    }

    #[test]
    fn test_decode_parsed_data_drops_nul() {
        let raw = r#"{"ski\u0000lls": {"db": ["SQL\u0000", "Go"]}, "city": "Mos\u0000cow"}"#;
        let value = decode_parsed_data(raw).unwrap();
        assert_eq!(value, json!({"skills": {"db": ["SQL", "Go"]}, "city": "Moscow"}));
    }

    #[test]
    fn test_transient_classification() {
        assert!(ScoringError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(ScoringError::from(tonic::Status::unavailable("down")).is_transient());
        assert!(!ScoringError::from(tonic::Status::invalid_argument("bad")).is_transient());
        assert!(!ScoringError::InvalidScore(2.0).is_transient());
    }
}
