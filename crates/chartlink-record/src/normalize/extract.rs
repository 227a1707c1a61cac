//! Optional-traversal helpers shared by the normalizers.
//!
//! Every helper tolerates missing keys, wrong JSON types and empty arrays,
//! returning `None` or the documented default instead of failing.

use serde_json::Value;

/// Placeholder for names and displays the source did not provide.
pub const UNKNOWN: &str = "Unknown";

/// String value at `key`.
pub fn string(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// String value at a JSON pointer such as `/clinicalStatus/text`.
pub fn string_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// First element of the array at `key`.
pub fn first<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).and_then(Value::as_array).and_then(|a| a.first())
}

/// Array at `key`, or an empty slice.
pub fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Strings of the array at `key`, skipping non-strings.
pub fn strings(value: &Value, key: &str) -> Vec<String> {
    array(value, key)
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Renders a scalar the way it appears on the wire: strings verbatim,
/// numbers and booleans in JSON notation. Null, objects and arrays render
/// as `""`.
pub fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Scalar at `key`, or `""`.
pub fn scalar_at(value: &Value, key: &str) -> String {
    value.get(key).map(scalar).unwrap_or_default()
}

/// Human-readable text of a CodeableConcept.
///
/// `text`, else `coding[0].display`, else `"Unknown"`. A concept given as
/// an array (some servers send `PractitionerRole.code` that way) uses its
/// first element.
pub fn code_text(concept: Option<&Value>) -> String {
    let concept = match concept {
        Some(Value::Array(items)) => items.first(),
        other => other,
    };
    concept
        .and_then(|c| {
            string(c, "text").or_else(|| first(c, "coding").and_then(|coding| string(coding, "display")))
        })
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// `display` of a reference, falling back to `actor.display`, else `"Unknown"`.
pub fn display_or_unknown(reference: Option<&Value>) -> String {
    reference
        .and_then(|r| string(r, "display").or_else(|| string_at(r, "/actor/display")))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Text of the first annotation in `note`, or `""`.
pub fn first_note(resource: &Value) -> String {
    first(resource, "note")
        .and_then(|note| string(note, "text"))
        .unwrap_or_default()
}

/// Observation value as text.
///
/// The first `value[x]` key present wins: `valueQuantity.value`, then
/// `valueString`, then the `valueCodeableConcept` text. No value yields `""`.
pub fn observation_value(observation: &Value) -> String {
    if let Some(quantity) = observation.get("valueQuantity") {
        scalar_at(quantity, "value")
    } else if let Some(text) = observation.get("valueString") {
        scalar(text)
    } else if let Some(concept) = observation.get("valueCodeableConcept") {
        code_text(Some(concept))
    } else {
        String::new()
    }
}

/// `valueQuantity.unit`, or `""`.
pub fn observation_unit(observation: &Value) -> String {
    observation
        .get("valueQuantity")
        .and_then(|q| string(q, "unit"))
        .unwrap_or_default()
}
