//! Patient record aggregation.
//!
//! [`PatientRecordAggregator::build`] runs one search per [`Section`] with
//! bounded concurrency, normalizes each result and assembles a
//! [`PatientRecord`]. A failed or empty section leaves that part of the
//! record empty and is reported in `fetch_status`; it never aborts the
//! aggregation.

use std::sync::Arc;
use std::time::Instant;

use futures_util::{StreamExt, stream};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use chartlink_client::{ClientResult, RawBundle, ResourceSource};

use crate::config::AggregatorConfig;
use crate::normalize::{VitalSign, normalize_all, normalize_first};
use crate::record::{PatientRecord, Section, SectionOutcome};

/// Builds consolidated patient records from a [`ResourceSource`].
#[derive(Clone)]
pub struct PatientRecordAggregator {
    source: Arc<dyn ResourceSource>,
    max_concurrency: usize,
}

impl PatientRecordAggregator {
    pub fn new(source: Arc<dyn ResourceSource>, config: &AggregatorConfig) -> Self {
        Self {
            source,
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    /// Fetches and normalizes every section for `patient_id`.
    ///
    /// Dropping the returned future cancels all in-flight section searches.
    pub async fn build(&self, patient_id: &str) -> PatientRecord {
        let started = Instant::now();
        tracing::info!(
            sections = Section::ALL.len(),
            max_concurrency = self.max_concurrency,
            "Building patient record"
        );

        let results: Vec<(Section, ClientResult<RawBundle>)> = stream::iter(Section::ALL)
            .map(|section| {
                let query = section.query(patient_id);
                let source = Arc::clone(&self.source);
                async move { (section, source.fetch_resources(&query).await) }
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut record = PatientRecord::default();
        for (section, result) in results {
            let outcome = match result {
                Ok(bundle) => match fill_section(&mut record, section, &bundle) {
                    0 => SectionOutcome::NoData,
                    entries => SectionOutcome::Retrieved { entries },
                },
                Err(e) => {
                    tracing::warn!(
                        section = %section,
                        resource_type = %section.resource_type(),
                        status = ?e.status(),
                        error = %e,
                        "Section unavailable"
                    );
                    SectionOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            tracing::debug!(section = %section, outcome = ?outcome, "Section done");
            record.fetch_status.insert(section, outcome);
        }

        let elapsed = started.elapsed();
        record.fetch_time = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        record.total_fetch_time_seconds = elapsed.as_secs_f64();

        tracing::info!(
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            failed = record.failed_sections().len(),
            "Patient record built"
        );

        record
    }
}

impl std::fmt::Debug for PatientRecordAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatientRecordAggregator")
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}

/// Normalizes `bundle` into the record's `section`, returning the number of
/// entries kept.
fn fill_section(record: &mut PatientRecord, section: Section, bundle: &RawBundle) -> usize {
    match section {
        Section::Demographics => {
            record.demographics = normalize_first(bundle);
            usize::from(record.demographics.is_some())
        }
        Section::VitalSigns => {
            // Readings without a value carry no information.
            record.vital_signs = normalize_all::<VitalSign>(bundle)
                .into_iter()
                .filter(|vital| !vital.value.is_empty())
                .collect();
            record.vital_signs.len()
        }
        Section::MedicalHistory => {
            record.medical_history = normalize_all(bundle);
            record.medical_history.len()
        }
        Section::ReasonForVisit => {
            record.reason_for_visit = normalize_all(bundle);
            record.reason_for_visit.len()
        }
        Section::Medications => {
            record.medications = normalize_all(bundle);
            record.medications.len()
        }
        Section::Labs => {
            record.labs = normalize_all(bundle);
            record.labs.len()
        }
        Section::SurgicalHistory => {
            record.surgical_history = normalize_all(bundle);
            record.surgical_history.len()
        }
        Section::Surgeries => {
            record.surgeries = normalize_all(bundle);
            record.surgeries.len()
        }
        Section::Allergies => {
            record.allergies = normalize_all(bundle);
            record.allergies.len()
        }
        Section::PractitionerRole => {
            record.practitioner_role = normalize_first(bundle);
            usize::from(record.practitioner_role.is_some())
        }
        Section::ClinicalNotes => {
            record.clinical_notes = normalize_all(bundle);
            record.clinical_notes.len()
        }
        Section::Appointments => {
            record.appointments = normalize_all(bundle);
            record.appointments.len()
        }
        Section::SocialDeterminants => {
            record.social_determinants = normalize_all(bundle);
            record.social_determinants.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fill_drops_empty_vitals() {
        let bundle = RawBundle::new(json!({
            "resourceType": "Bundle",
            "entry": [
                {"resource": {"code": {"text": "Pulse"}, "valueQuantity": {"value": 60}}},
                {"resource": {"code": {"text": "Pending"}}},
                {"resource": {"code": {"text": "Temp"}, "valueQuantity": {"value": 37.1}}}
            ]
        }));
        let mut record = PatientRecord::default();

        assert_eq!(fill_section(&mut record, Section::VitalSigns, &bundle), 2);
        let kinds: Vec<&str> = record.vital_signs.iter().map(|v| v.kind.as_str()).collect();
        assert_eq!(kinds, vec!["Pulse", "Temp"]);
    }

    #[test]
    fn test_fill_preserves_count_and_order() {
        let bundle = RawBundle::new(json!({
            "resourceType": "Bundle",
            "entry": (0..5)
                .map(|i| json!({"resource": {"id": format!("c{i}"), "code": {"text": format!("Condition {i}")}}}))
                .collect::<Vec<_>>()
        }));
        let mut record = PatientRecord::default();

        assert_eq!(fill_section(&mut record, Section::MedicalHistory, &bundle), 5);
        let ids: Vec<_> = record
            .medical_history
            .iter()
            .map(|c| c.id.clone().unwrap_or_default())
            .collect();
        assert_eq!(ids, vec!["c0", "c1", "c2", "c3", "c4"]);
    }

    #[test]
    fn test_fill_first_entry_only() {
        let bundle = RawBundle::new(json!({
            "resourceType": "Bundle",
            "entry": [
                {"resource": {"resourceType": "Patient", "id": "first"}},
                {"resource": {"resourceType": "Patient", "id": "second"}}
            ]
        }));
        let mut record = PatientRecord::default();

        assert_eq!(fill_section(&mut record, Section::Demographics, &bundle), 1);
        assert_eq!(
            record.demographics.and_then(|d| d.id).as_deref(),
            Some("first")
        );
    }

    #[test]
    fn test_fill_empty_bundle() {
        let bundle = RawBundle::new(json!({"resourceType": "Bundle", "total": 0}));
        let mut record = PatientRecord::default();

        assert_eq!(fill_section(&mut record, Section::PractitionerRole, &bundle), 0);
        assert!(record.practitioner_role.is_none());
    }
}
