use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resume {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub raw_text: String,
    /// Structured output of the scoring service's parse call. Always a JSON object;
    /// `{}` until a parse succeeds.
    pub parsed_data: Value,
    pub file_url: String,
    pub created_at: DateTime<Utc>,
}

impl Resume {
    pub fn new(candidate_id: Uuid, raw_text: String, file_url: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            candidate_id,
            raw_text,
            parsed_data: empty_object(),
            file_url,
            created_at: Utc::now(),
        }
    }

    /// True when a previous parse left a non-empty object behind.
    pub fn has_parsed_data(&self) -> bool {
        self.parsed_data
            .as_object()
            .map(|m| !m.is_empty())
            .unwrap_or(false)
    }
}

pub fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
