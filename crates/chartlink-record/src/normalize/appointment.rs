use serde::Serialize;
use serde_json::Value;

use super::Normalize;
use super::extract::{code_text, display_or_unknown, first, string};

/// A scheduled appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Appointment {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Display of the first participant.
    pub participant: String,
    pub description: Option<String>,
    pub location: Option<String>,
}

impl Normalize for Appointment {
    fn normalize(appointment: &Value) -> Self {
        Self {
            id: string(appointment, "id"),
            kind: code_text(first(appointment, "serviceType")),
            status: string(appointment, "status"),
            start_time: string(appointment, "start"),
            end_time: string(appointment, "end"),
            participant: display_or_unknown(first(appointment, "participant")),
            description: string(appointment, "description"),
            location: first(appointment, "location").and_then(|l| string(l, "display")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_defaults() {
        let appointment = Appointment::normalize(&json!({}));
        assert_eq!(appointment.kind, "Unknown");
        assert_eq!(appointment.participant, "Unknown");
        assert_eq!(appointment.location, None);
        assert_eq!(appointment.start_time, None);
    }

    #[test]
    fn test_appointment() {
        let appointment = Appointment::normalize(&json!({
            "id": "a1",
            "status": "booked",
            "serviceType": [{"text": "Cardiology consult"}],
            "start": "2024-07-01T14:00:00Z",
            "end": "2024-07-01T14:30:00Z",
            "participant": [
                {"actor": {"reference": "Practitioner/1", "display": "Dr. Heart"}},
                {"actor": {"display": "Patient"}}
            ],
            "description": "Annual review",
            "location": [{"display": "Clinic B"}]
        }));
        assert_eq!(appointment.kind, "Cardiology consult");
        assert_eq!(appointment.participant, "Dr. Heart");
        assert_eq!(appointment.end_time.as_deref(), Some("2024-07-01T14:30:00Z"));
        assert_eq!(appointment.description.as_deref(), Some("Annual review"));
        assert_eq!(appointment.location.as_deref(), Some("Clinic B"));
    }
}
