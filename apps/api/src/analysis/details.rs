//! Per-criterion breakdown derived from the scoring service's parsed resume data.
//!
//! The parsed data is an ordered JSON tree. Each top-level key is a category; its value
//! may be a map of criteria to item lists (`{"skills": {"backend": ["Go", "SQL"]}}`),
//! a map of criteria to single values, a plain list, or a single value. Anything else is
//! skipped rather than failing the analysis.
//!
//! There is no requirement matching yet: `vacancy_value` is always empty and the
//! scores come from a `WeightingPolicy`.

use chrono::Utc;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::models::analysis::AnalysisDetail;

pub const DEFAULT_DETAIL_MATCH_SCORE: f64 = 0.8;
pub const DEFAULT_DETAIL_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetailWeight {
    pub match_score: f64,
    pub weight: f64,
}

/// Assigns a match score and weight to one derived detail.
pub trait WeightingPolicy: Send + Sync {
    fn weigh(&self, category: &str, criteria: &str, resume_value: &str) -> DetailWeight;
}

/// Same score and weight for every detail. Default 0.8 / 0.3.
#[derive(Debug, Clone, Copy)]
pub struct FixedWeighting {
    pub match_score: f64,
    pub weight: f64,
}

impl Default for FixedWeighting {
    fn default() -> Self {
        Self {
            match_score: DEFAULT_DETAIL_MATCH_SCORE,
            weight: DEFAULT_DETAIL_WEIGHT,
        }
    }
}

impl WeightingPolicy for FixedWeighting {
    fn weigh(&self, _category: &str, _criteria: &str, _resume_value: &str) -> DetailWeight {
        DetailWeight {
            match_score: self.match_score,
            weight: self.weight,
        }
    }
}

/// Walks `parsed` and builds one detail per recognised item, in document order.
pub fn derive_details(
    parsed: &Value,
    analysis_result_id: Uuid,
    policy: &dyn WeightingPolicy,
) -> Vec<AnalysisDetail> {
    let Some(groups) = parsed.as_object() else {
        debug!("Parsed data is not an object; no details derived");
        return Vec::new();
    };

    let mut builder = DetailBuilder {
        analysis_result_id,
        policy,
        details: Vec::new(),
    };

    for (category, value) in groups {
        match value {
            Value::Object(criteria) => {
                for (criterion, items) in criteria {
                    builder.push_items(category, criterion, items);
                }
            }
            Value::Null => debug!(category = %category, "Skipping null category"),
            other => builder.push_items(category, category, other),
        }
    }

    builder.details
}

struct DetailBuilder<'a> {
    analysis_result_id: Uuid,
    policy: &'a dyn WeightingPolicy,
    details: Vec<AnalysisDetail>,
}

impl DetailBuilder<'_> {
    fn push_items(&mut self, category: &str, criteria: &str, value: &Value) {
        match value {
            Value::Array(items) => {
                for item in items {
                    match scalar_string(item) {
                        Some(s) => self.push(category, criteria, s),
                        None => debug!(category, criteria, "Skipping non-scalar list item"),
                    }
                }
            }
            other => match scalar_string(other) {
                Some(s) => self.push(category, criteria, s),
                None => debug!(category, criteria, "Skipping unrecognised value shape"),
            },
        }
    }

    fn push(&mut self, category: &str, criteria: &str, resume_value: String) {
        let weight = self.policy.weigh(category, criteria, &resume_value);
        self.details.push(AnalysisDetail {
            id: Uuid::new_v4(),
            analysis_result_id: self.analysis_result_id,
            category: category.to_string(),
            criteria: criteria.to_string(),
            resume_value,
            vacancy_value: String::new(),
            match_score: unit_interval(weight.match_score),
            weight: unit_interval(weight.weight),
            created_at: Utc::now(),
        });
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn unit_interval(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
