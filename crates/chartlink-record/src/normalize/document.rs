use serde::Serialize;
use serde_json::Value;

use super::Normalize;
use super::extract::{code_text, display_or_unknown, first, string, string_at};

/// A clinical note document reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClinicalNote {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
    pub date: Option<String>,
    pub author: String,
    /// Title of the first attachment, not its data.
    pub content: String,
    pub status: Option<String>,
}

impl Normalize for ClinicalNote {
    fn normalize(document: &Value) -> Self {
        Self {
            id: string(document, "id"),
            kind: code_text(document.get("type")),
            title: string(document, "title"),
            date: string(document, "date"),
            author: display_or_unknown(first(document, "author")),
            content: first(document, "content")
                .and_then(|content| string_at(content, "/attachment/title"))
                .unwrap_or_default(),
            status: string(document, "status"),
        }
    }
}
