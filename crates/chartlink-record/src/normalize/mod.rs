//! Per-concept normalizers.
//!
//! Each normalized entry type turns one raw FHIR resource into a flat,
//! stable shape through [`Normalize::normalize`]. Normalization never fails:
//! absent or malformed data is replaced by the documented default
//! (`"Unknown"`, `""`, `[]`, `false`, or `null` for optional fields).

pub mod extract;

mod allergy;
mod appointment;
mod condition;
mod demographics;
mod document;
mod medication;
mod observation;
mod practitioner;
mod procedure;

use serde_json::Value;

use chartlink_client::RawBundle;

pub use allergy::Allergy;
pub use appointment::Appointment;
pub use condition::{Condition, EncounterDiagnosis};
pub use demographics::{Demographics, ETHNICITY_EXTENSION_URL, RACE_EXTENSION_URL};
pub use document::ClinicalNote;
pub use medication::Medication;
pub use observation::{LabResult, SocialDeterminant, VitalSign};
pub use practitioner::PractitionerRole;
pub use procedure::{ProcedureRecord, Surgery};

/// Conversion of one raw FHIR resource into a normalized entry.
pub trait Normalize: Sized {
    /// Extracts the entry, substituting defaults for anything missing.
    fn normalize(resource: &Value) -> Self;
}

/// Normalizes every resource of `bundle`, preserving bundle order.
pub fn normalize_all<T: Normalize>(bundle: &RawBundle) -> Vec<T> {
    bundle.resources().into_iter().map(T::normalize).collect()
}

/// Normalizes the first resource of `bundle`, if any.
pub fn normalize_first<T: Normalize>(bundle: &RawBundle) -> Option<T> {
    bundle.first_resource().map(T::normalize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn allergy_bundle(names: &[&str]) -> RawBundle {
        let entries: Vec<Value> = names
            .iter()
            .map(|name| {
                json!({"resource": {"resourceType": "AllergyIntolerance", "code": {"text": name}}})
            })
            .collect();
        RawBundle::new(json!({"resourceType": "Bundle", "type": "searchset", "entry": entries}))
    }

    #[test]
    fn test_normalize_all_keeps_count_and_order() {
        let names = ["Penicillin", "Latex", "Peanut", "Sulfa", "Shellfish"];
        let allergies: Vec<Allergy> = normalize_all(&allergy_bundle(&names));

        assert_eq!(allergies.len(), names.len());
        for (allergy, name) in allergies.iter().zip(names) {
            assert_eq!(allergy.substance, name);
        }
    }

    #[test]
    fn test_normalize_all_empty_bundle() {
        let allergies: Vec<Allergy> = normalize_all(&allergy_bundle(&[]));
        assert!(allergies.is_empty());
    }

    #[test]
    fn test_normalize_first() {
        let first: Option<Allergy> = normalize_first(&allergy_bundle(&["Latex", "Peanut"]));
        assert_eq!(first.unwrap().substance, "Latex");

        let none: Option<Allergy> = normalize_first(&allergy_bundle(&[]));
        assert!(none.is_none());
    }
}
