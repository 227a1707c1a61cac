//! # chartlink-record
//!
//! Normalizes raw FHIR resources into flat, application-friendly entries and
//! aggregates a patient's clinical record across every supported category.
//!
//! ## Modules
//!
//! - [`normalize`] - One normalizer per clinical concept
//! - [`record`] - The consolidated [`PatientRecord`] and its sections
//! - [`aggregator`] - Concurrent section retrieval and assembly
//! - [`config`] - Aggregation settings

pub mod aggregator;
pub mod config;
pub mod normalize;
pub mod record;

pub use aggregator::PatientRecordAggregator;
pub use config::AggregatorConfig;
pub use normalize::{Normalize, normalize_all, normalize_first};
pub use record::{PatientRecord, Section, SectionOutcome};
