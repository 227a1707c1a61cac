use serde::Serialize;
use serde_json::Value;

use super::Normalize;
use super::extract::{code_text, display_or_unknown, first, first_note, scalar, string};

/// A medication request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Medication {
    pub id: Option<String>,
    pub name: String,
    pub status: Option<String>,
    pub intent: Option<String>,
    /// `doseAndRate[0].doseQuantity.value` of the first dosage instruction.
    pub dosage: String,
    /// `timing.repeat.frequency` of the first dosage instruction.
    pub frequency: String,
    pub start_date: Option<String>,
    pub prescriber: String,
    pub notes: String,
}

impl Normalize for Medication {
    fn normalize(request: &Value) -> Self {
        let instruction = first(request, "dosageInstruction");
        Self {
            id: string(request, "id"),
            name: code_text(request.get("medicationCodeableConcept")),
            status: string(request, "status"),
            intent: string(request, "intent"),
            dosage: instruction
                .and_then(|i| first(i, "doseAndRate"))
                .and_then(|dr| dr.pointer("/doseQuantity/value"))
                .map(scalar)
                .unwrap_or_default(),
            frequency: instruction
                .and_then(|i| i.pointer("/timing/repeat/frequency"))
                .map(scalar)
                .unwrap_or_default(),
            start_date: string(request, "authoredOn"),
            prescriber: display_or_unknown(request.get("requester")),
            notes: first_note(request),
        }
    }
}
