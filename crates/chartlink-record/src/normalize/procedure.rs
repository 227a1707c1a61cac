use serde::Serialize;
use serde_json::Value;

use super::Normalize;
use super::extract::{code_text, display_or_unknown, first, first_note, string, string_at};

/// A procedure from the patient-reported surgical history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcedureRecord {
    pub id: Option<String>,
    pub name: String,
    pub status: Option<String>,
    pub date: Option<String>,
    pub performer: String,
    pub location: Option<String>,
    pub notes: String,
}

impl Normalize for ProcedureRecord {
    fn normalize(procedure: &Value) -> Self {
        Self {
            id: string(procedure, "id"),
            name: code_text(procedure.get("code")),
            status: string(procedure, "status"),
            date: string(procedure, "performedDateTime"),
            performer: display_or_unknown(first(procedure, "performer")),
            location: string_at(procedure, "/location/display"),
            notes: first_note(procedure),
        }
    }
}

/// A documented surgery: a procedure plus its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Surgery {
    #[serde(flatten)]
    pub procedure: ProcedureRecord,
    pub outcome: Option<String>,
}

impl Normalize for Surgery {
    fn normalize(procedure: &Value) -> Self {
        Self {
            procedure: ProcedureRecord::normalize(procedure),
            outcome: string_at(procedure, "/outcome/text"),
        }
    }
}
