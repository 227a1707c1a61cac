use serde::Serialize;
use serde_json::Value;

use super::Normalize;
use super::extract::{array, code_text, first_note, string, string_at};

/// An allergy or intolerance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allergy {
    pub id: Option<String>,
    pub substance: String,
    /// The allergy's `criticality`.
    pub severity: Option<String>,
    /// Every manifestation of every reaction, flattened in order.
    pub reaction: Vec<String>,
    pub onset_date: Option<String>,
    pub status: Option<String>,
    pub notes: String,
}

impl Normalize for Allergy {
    fn normalize(allergy: &Value) -> Self {
        Self {
            id: string(allergy, "id"),
            substance: code_text(allergy.get("code")),
            severity: string(allergy, "criticality"),
            reaction: array(allergy, "reaction")
                .iter()
                .flat_map(|reaction| array(reaction, "manifestation"))
                .map(|manifestation| code_text(Some(manifestation)))
                .collect(),
            onset_date: string(allergy, "onsetDateTime"),
            status: string_at(allergy, "/clinicalStatus/text"),
            notes: first_note(allergy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_defaults() {
        let allergy = Allergy::normalize(&json!({}));
        assert_eq!(allergy.substance, "Unknown");
        assert_eq!(allergy.severity, None);
        assert!(allergy.reaction.is_empty());
        assert_eq!(allergy.notes, "");
    }

    #[test]
    fn test_penicillin_allergy() {
        let allergy = Allergy::normalize(&json!({
            "code": {"text": "Penicillin"},
            "criticality": "high",
            "reaction": [{"manifestation": [{"text": "Rash"}]}]
        }));
        assert_eq!(allergy.substance, "Penicillin");
        assert_eq!(allergy.severity.as_deref(), Some("high"));
        assert_eq!(allergy.reaction, vec!["Rash"]);
    }

    #[test]
    fn test_reactions_flattened_in_order() {
        let allergy = Allergy::normalize(&json!({
            "reaction": [
                {"manifestation": [{"text": "Hives"}, {"coding": [{"display": "Wheezing"}]}]},
                {"severity": "mild"},
                {"manifestation": [{"text": "Nausea"}]}
            ]
        }));
        assert_eq!(allergy.reaction, vec!["Hives", "Wheezing", "Nausea"]);
    }
}
