use serde::Serialize;
use serde_json::Value;

use super::Normalize;
use super::extract::{code_text, first, observation_unit, observation_value, scalar_at, string};

/// A vital-signs observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VitalSign {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub unit: String,
    pub date: Option<String>,
    pub status: Option<String>,
}

impl Normalize for VitalSign {
    fn normalize(observation: &Value) -> Self {
        Self {
            kind: code_text(observation.get("code")),
            value: observation_value(observation),
            unit: observation_unit(observation),
            date: string(observation, "effectiveDateTime"),
            status: string(observation, "status"),
        }
    }
}

/// A laboratory result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabResult {
    pub id: Option<String>,
    pub name: String,
    pub value: String,
    pub unit: String,
    /// `"low-high"` from the first reference range, `""` without one.
    pub reference_range: String,
    pub status: Option<String>,
    pub date: Option<String>,
    /// See [`is_abnormal`].
    pub abnormal: bool,
}

impl Normalize for LabResult {
    fn normalize(observation: &Value) -> Self {
        Self {
            id: string(observation, "id"),
            name: code_text(observation.get("code")),
            value: observation_value(observation),
            unit: observation_unit(observation),
            reference_range: reference_range(observation),
            status: string(observation, "status"),
            date: string(observation, "effectiveDateTime"),
            abnormal: is_abnormal(observation),
        }
    }
}

/// A social-history observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocialDeterminant {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub date: Option<String>,
    pub status: Option<String>,
}

impl Normalize for SocialDeterminant {
    fn normalize(observation: &Value) -> Self {
        Self {
            id: string(observation, "id"),
            kind: code_text(observation.get("code")),
            value: observation_value(observation),
            date: string(observation, "effectiveDateTime"),
            status: string(observation, "status"),
        }
    }
}

fn reference_range(observation: &Value) -> String {
    match first(observation, "referenceRange") {
        Some(range) => {
            let low = range.get("low").map(|q| scalar_at(q, "value")).unwrap_or_default();
            let high = range.get("high").map(|q| scalar_at(q, "value")).unwrap_or_default();
            format!("{low}-{high}")
        }
        None => String::new(),
    }
}

/// Keyword heuristic over the first interpretation's text.
///
/// True when the lowercased text contains `abnormal`, `high` or `low`.
/// Coded interpretations without text (e.g. `H`, `L`, `A`) are not detected,
/// and any text that merely contains one of the words matches.
pub fn is_abnormal(observation: &Value) -> bool {
    first(observation, "interpretation")
        .and_then(|interpretation| string(interpretation, "text"))
        .map(|text| {
            let text = text.to_lowercase();
            ["abnormal", "high", "low"]
                .iter()
                .any(|keyword| text.contains(keyword))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_defaults() {
        let vital = VitalSign::normalize(&json!({}));
        assert_eq!(vital.kind, "Unknown");
        assert_eq!(vital.value, "");
        assert_eq!(vital.unit, "");
        assert_eq!(vital.date, None);
        assert_eq!(vital.status, None);

        let lab = LabResult::normalize(&json!({}));
        assert_eq!(lab.name, "Unknown");
        assert_eq!(lab.reference_range, "");
        assert!(!lab.abnormal);

        let social = SocialDeterminant::normalize(&json!({}));
        assert_eq!(social.kind, "Unknown");
        assert_eq!(social.value, "");
    }

    #[test]
    fn test_vital_sign() {
        let vital = VitalSign::normalize(&json!({
            "resourceType": "Observation",
            "code": {"coding": [{"display": "Heart rate"}]},
            "valueQuantity": {"value": 72, "unit": "beats/min"},
            "effectiveDateTime": "2024-03-01T10:00:00Z",
            "status": "final"
        }));
        assert_eq!(vital.kind, "Heart rate");
        assert_eq!(vital.value, "72");
        assert_eq!(vital.unit, "beats/min");
        assert_eq!(vital.date.as_deref(), Some("2024-03-01T10:00:00Z"));
    }

    #[test]
    fn test_lab_result() {
        let lab = LabResult::normalize(&json!({
            "id": "lab1",
            "code": {"text": "Potassium"},
            "valueQuantity": {"value": 5.9, "unit": "mmol/L"},
            "referenceRange": [{"low": {"value": 3.5}, "high": {"value": 5.1}}],
            "interpretation": [{"text": "High"}],
            "status": "final"
        }));
        assert_eq!(lab.name, "Potassium");
        assert_eq!(lab.value, "5.9");
        assert_eq!(lab.reference_range, "3.5-5.1");
        assert!(lab.abnormal);
    }

    #[test]
    fn test_reference_range_partial() {
        let obs = json!({"referenceRange": [{"high": {"value": 200}}]});
        assert_eq!(LabResult::normalize(&obs).reference_range, "-200");
        let obs = json!({"referenceRange": [{}]});
        assert_eq!(LabResult::normalize(&obs).reference_range, "-");
    }

    #[test]
    fn test_abnormal_heuristic() {
        assert!(is_abnormal(&json!({"interpretation": [{"text": "Abnormal"}]})));
        assert!(is_abnormal(&json!({"interpretation": [{"text": "Critically low"}]})));
        assert!(!is_abnormal(&json!({"interpretation": [{"text": "Normal"}]})));
        // Coded-only interpretations carry no text and are not flagged.
        assert!(!is_abnormal(
            &json!({"interpretation": [{"coding": [{"code": "H"}]}]})
        ));
        assert!(!is_abnormal(&json!({"interpretation": []})));
    }

    #[test]
    fn test_social_determinant() {
        let social = SocialDeterminant::normalize(&json!({
            "id": "s1",
            "code": {"text": "Tobacco use"},
            "valueCodeableConcept": {"coding": [{"display": "Never smoker"}]},
            "effectiveDateTime": "2023-01-01"
        }));
        assert_eq!(social.kind, "Tobacco use");
        assert_eq!(social.value, "Never smoker");
    }
}
