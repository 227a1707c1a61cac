use serde::Serialize;
use serde_json::Value;

use chartlink_core::age_from_birth_date;

use super::Normalize;
use super::extract::{UNKNOWN, array, first, string, string_at, strings};

/// US Core race extension.
pub const RACE_EXTENSION_URL: &str =
    "http://hl7.org/fhir/us/core/StructureDefinition/us-core-race";

/// US Core ethnicity extension.
pub const ETHNICITY_EXTENSION_URL: &str =
    "http://hl7.org/fhir/us/core/StructureDefinition/us-core-ethnicity";

/// Patient demographics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Demographics {
    pub id: Option<String>,
    /// Prefix, given names, family name and suffix of the first name entry.
    pub name: String,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    /// Whole years since `birth_date`; 0 when unknown.
    pub age: u32,
    pub address: String,
    pub phone: String,
    pub marital_status: Option<String>,
    pub race: String,
    pub ethnicity: String,
}

impl Normalize for Demographics {
    fn normalize(patient: &Value) -> Self {
        let birth_date = string(patient, "birthDate");
        Self {
            id: string(patient, "id"),
            name: full_name(patient),
            gender: string(patient, "gender"),
            age: birth_date
                .as_deref()
                .and_then(age_from_birth_date)
                .unwrap_or(0),
            birth_date,
            address: address(patient),
            phone: phone(patient),
            marital_status: string_at(patient, "/maritalStatus/text"),
            race: us_core_text(patient, RACE_EXTENSION_URL),
            ethnicity: us_core_text(patient, ETHNICITY_EXTENSION_URL),
        }
    }
}

fn full_name(patient: &Value) -> String {
    let Some(name) = first(patient, "name") else {
        return UNKNOWN.to_string();
    };
    let mut parts = strings(name, "prefix");
    parts.extend(strings(name, "given"));
    parts.extend(string(name, "family"));
    parts.extend(strings(name, "suffix"));
    parts.join(" ")
}

fn address(patient: &Value) -> String {
    let Some(addr) = first(patient, "address") else {
        return UNKNOWN.to_string();
    };
    let mut parts = strings(addr, "line");
    parts.extend(string(addr, "city"));
    parts.extend(string(addr, "state"));
    parts.extend(string(addr, "postalCode"));
    parts.join(", ")
}

fn phone(patient: &Value) -> String {
    array(patient, "telecom")
        .iter()
        .find(|contact| contact.get("system").and_then(Value::as_str) == Some("phone"))
        .map(|contact| string(contact, "value").unwrap_or_else(|| UNKNOWN.to_string()))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Text of a US Core race/ethnicity extension.
///
/// Reads `valueCodeableConcept.text`, then the nested `text` sub-extension's
/// `valueString`.
fn us_core_text(patient: &Value, url: &str) -> String {
    array(patient, "extension")
        .iter()
        .find(|ext| ext.get("url").and_then(Value::as_str) == Some(url))
        .and_then(|ext| {
            string_at(ext, "/valueCodeableConcept/text").or_else(|| {
                array(ext, "extension")
                    .iter()
                    .find(|sub| sub.get("url").and_then(Value::as_str) == Some("text"))
                    .and_then(|sub| string(sub, "valueString"))
            })
        })
        .unwrap_or_else(|| UNKNOWN.to_string())
}
