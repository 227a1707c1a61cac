pub mod error;
pub mod fhir;
pub mod text;
pub mod time;

pub use crate::error::{CoreError, Result};
pub use crate::fhir::{DEFAULT_SYSTEM_SCOPES, FHIR_JSON, ResourceType, default_system_scopes};
pub use crate::text::{MAX_LOGGED_BODY_CHARS, truncate_for_log};
pub use crate::time::{age_from_birth_date, age_on, now_utc, parse_fhir_date};
