use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Media type for FHIR JSON payloads.
pub const FHIR_JSON: &str = "application/fhir+json";

/// FHIR resource types the record client reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    Patient,
    Observation,
    Condition,
    MedicationRequest,
    AllergyIntolerance,
    Procedure,
    Encounter,
    DiagnosticReport,
    DocumentReference,
    PractitionerRole,
    Appointment,
    #[serde(untagged)]
    Custom(String),
}

/// Resource types covered by the default backend-services scope set.
pub const DEFAULT_SYSTEM_SCOPES: [ResourceType; 9] = [
    ResourceType::Patient,
    ResourceType::Observation,
    ResourceType::Condition,
    ResourceType::MedicationRequest,
    ResourceType::AllergyIntolerance,
    ResourceType::Procedure,
    ResourceType::Encounter,
    ResourceType::DiagnosticReport,
    ResourceType::DocumentReference,
];

/// The nine `system/<Resource>.read` scopes requested when the caller names none.
pub fn default_system_scopes() -> Vec<String> {
    DEFAULT_SYSTEM_SCOPES
        .iter()
        .map(ResourceType::system_read_scope)
        .collect()
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::Patient => "Patient",
            ResourceType::Observation => "Observation",
            ResourceType::Condition => "Condition",
            ResourceType::MedicationRequest => "MedicationRequest",
            ResourceType::AllergyIntolerance => "AllergyIntolerance",
            ResourceType::Procedure => "Procedure",
            ResourceType::Encounter => "Encounter",
            ResourceType::DiagnosticReport => "DiagnosticReport",
            ResourceType::DocumentReference => "DocumentReference",
            ResourceType::PractitionerRole => "PractitionerRole",
            ResourceType::Appointment => "Appointment",
            ResourceType::Custom(name) => name,
        }
    }

    /// Backend-services read scope for this type, e.g. `system/Patient.read`.
    pub fn system_read_scope(&self) -> String {
        format!("system/{}.read", self.as_str())
    }

    /// Search parameter that restricts this type to a single patient.
    ///
    /// Patient itself is filtered by its logical id; every other
    /// compartment resource uses the `patient` reference parameter.
    pub fn subject_param(&self) -> &'static str {
        match self {
            ResourceType::Patient => "_id",
            _ => "patient",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Patient" => Ok(ResourceType::Patient),
            "Observation" => Ok(ResourceType::Observation),
            "Condition" => Ok(ResourceType::Condition),
            "MedicationRequest" => Ok(ResourceType::MedicationRequest),
            "AllergyIntolerance" => Ok(ResourceType::AllergyIntolerance),
            "Procedure" => Ok(ResourceType::Procedure),
            "Encounter" => Ok(ResourceType::Encounter),
            "DiagnosticReport" => Ok(ResourceType::DiagnosticReport),
            "DocumentReference" => Ok(ResourceType::DocumentReference),
            "PractitionerRole" => Ok(ResourceType::PractitionerRole),
            "Appointment" => Ok(ResourceType::Appointment),
            name => {
                if is_valid_resource_type_name(name) {
                    Ok(ResourceType::Custom(name.to_string()))
                } else {
                    Err(CoreError::invalid_resource_type(name.to_string()))
                }
            }
        }
    }
}

/// Validate if a string is a valid FHIR resource type name
pub fn is_valid_resource_type_name(name: &str) -> bool {
    // FHIR resource type names must start with uppercase letter and contain only letters
    !name.is_empty()
        && name
            .chars()
            .next()
            .map(|c| c.is_ascii_uppercase())
            .unwrap_or(false)
        && name.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_from_str() {
        assert_eq!(
            ResourceType::from_str("Patient").unwrap(),
            ResourceType::Patient
        );
        assert_eq!(
            ResourceType::from_str("PractitionerRole").unwrap(),
            ResourceType::PractitionerRole
        );
        assert_eq!(
            ResourceType::from_str("Immunization").unwrap(),
            ResourceType::Custom("Immunization".to_string())
        );

        assert!(ResourceType::from_str("patient").is_err());
        assert!(ResourceType::from_str("Observation2").is_err());
        assert!(ResourceType::from_str("").is_err());
    }

    #[test]
    fn test_resource_type_display_roundtrip() {
        for rt in DEFAULT_SYSTEM_SCOPES.iter() {
            let parsed = ResourceType::from_str(&rt.to_string()).unwrap();
            assert_eq!(&parsed, rt);
        }
        assert_eq!(ResourceType::Custom("Goal".into()).to_string(), "Goal");
    }

    #[test]
    fn test_default_system_scopes() {
        let scopes = default_system_scopes();
        assert_eq!(scopes.len(), 9);
        assert_eq!(scopes[0], "system/Patient.read");
        assert!(scopes.contains(&"system/DocumentReference.read".to_string()));
        assert!(scopes.iter().all(|s| s.starts_with("system/") && s.ends_with(".read")));
    }

    #[test]
    fn test_subject_param() {
        assert_eq!(ResourceType::Patient.subject_param(), "_id");
        assert_eq!(ResourceType::Observation.subject_param(), "patient");
        assert_eq!(ResourceType::Custom("Goal".into()).subject_param(), "patient");
    }

    #[test]
    fn test_resource_type_serialization() {
        let json = serde_json::to_string(&ResourceType::AllergyIntolerance).unwrap();
        assert_eq!(json, "\"AllergyIntolerance\"");

        let custom: ResourceType = serde_json::from_str("\"Goal\"").unwrap();
        assert_eq!(custom, ResourceType::Custom("Goal".into()));
    }
}
