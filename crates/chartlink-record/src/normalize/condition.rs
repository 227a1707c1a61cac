use serde::Serialize;
use serde_json::Value;

use super::Normalize;
use super::extract::{code_text, first, first_note, string, string_at};

/// A problem-list condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub id: Option<String>,
    pub code: String,
    pub status: Option<String>,
    pub severity: Option<String>,
    pub onset_date: Option<String>,
    pub category: Option<String>,
    pub notes: String,
}

impl Normalize for Condition {
    fn normalize(condition: &Value) -> Self {
        Self {
            id: string(condition, "id"),
            code: code_text(condition.get("code")),
            status: string_at(condition, "/clinicalStatus/text"),
            severity: string_at(condition, "/severity/text"),
            onset_date: string(condition, "onsetDateTime"),
            category: first(condition, "category").and_then(|c| string(c, "text")),
            notes: first_note(condition),
        }
    }
}

/// An encounter diagnosis, reported as the reason for visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncounterDiagnosis {
    pub id: Option<String>,
    pub code: String,
    pub status: Option<String>,
    pub onset_date: Option<String>,
    pub notes: String,
}

impl Normalize for EncounterDiagnosis {
    fn normalize(condition: &Value) -> Self {
        Self {
            id: string(condition, "id"),
            code: code_text(condition.get("code")),
            status: string_at(condition, "/clinicalStatus/text"),
            onset_date: string(condition, "onsetDateTime"),
            notes: first_note(condition),
        }
    }
}
