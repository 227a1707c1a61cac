use serde::Serialize;
use serde_json::Value;

use super::Normalize;
use super::extract::{array, code_text, display_or_unknown, string, string_at};

/// The practitioner role associated with the patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PractitionerRole {
    pub id: Option<String>,
    pub role: String,
    pub specialty: Vec<String>,
    pub organization: Option<String>,
    pub practitioner: String,
    /// Defaults to `true` when the resource omits it.
    pub active: bool,
}

impl Normalize for PractitionerRole {
    fn normalize(role: &Value) -> Self {
        Self {
            id: string(role, "id"),
            role: code_text(role.get("code")),
            specialty: array(role, "specialty")
                .iter()
                .map(|specialty| code_text(Some(specialty)))
                .collect(),
            organization: string_at(role, "/organization/display"),
            practitioner: display_or_unknown(role.get("practitioner")),
            active: role.get("active").and_then(Value::as_bool).unwrap_or(true),
        }
    }
}
