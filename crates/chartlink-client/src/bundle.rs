//! Raw search results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The unmodified JSON returned by a resource endpoint.
///
/// Usually a `searchset` Bundle; a read by id returns the bare resource,
/// which [`RawBundle::resources`] then yields as its only element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawBundle(Value);

impl RawBundle {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// `resourceType` of the payload.
    pub fn resource_type(&self) -> Option<&str> {
        self.0.get("resourceType").and_then(Value::as_str)
    }

    pub fn is_bundle(&self) -> bool {
        self.resource_type() == Some("Bundle")
    }

    /// Server-reported match count, when present.
    pub fn total(&self) -> Option<u64> {
        self.0.get("total").and_then(Value::as_u64)
    }

    /// Bundle entries, or an empty slice.
    pub fn entries(&self) -> &[Value] {
        self.0
            .get("entry")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Entry resources in bundle order.
    ///
    /// Entries without a `resource` are skipped. A non-bundle payload is
    /// yielded as a single resource; `OperationOutcome` payloads yield
    /// nothing.
    pub fn resources(&self) -> Vec<&Value> {
        if self.is_bundle() {
            return self
                .entries()
                .iter()
                .filter_map(|entry| entry.get("resource"))
                .collect();
        }
        match self.resource_type() {
            Some("OperationOutcome") | None => Vec::new(),
            Some(_) => vec![&self.0],
        }
    }

    /// First resource, if any.
    pub fn first_resource(&self) -> Option<&Value> {
        self.resources().into_iter().next()
    }

    pub fn is_empty(&self) -> bool {
        self.resources().is_empty()
    }
}

impl From<Value> for RawBundle {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
