//! The consolidated patient record.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use chartlink_client::ResourceQuery;
use chartlink_core::ResourceType;

use crate::normalize::{
    Allergy, Appointment, ClinicalNote, Condition, Demographics, EncounterDiagnosis, LabResult,
    Medication, PractitionerRole, ProcedureRecord, SocialDeterminant, Surgery, VitalSign,
};

/// One section of the patient record and the search that fills it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Demographics,
    VitalSigns,
    MedicalHistory,
    ReasonForVisit,
    Medications,
    Labs,
    SurgicalHistory,
    Surgeries,
    Allergies,
    PractitionerRole,
    ClinicalNotes,
    Appointments,
    SocialDeterminants,
}

impl Section {
    /// Every section, in record order.
    pub const ALL: [Section; 13] = [
        Section::Demographics,
        Section::VitalSigns,
        Section::MedicalHistory,
        Section::ReasonForVisit,
        Section::Medications,
        Section::Labs,
        Section::SurgicalHistory,
        Section::Surgeries,
        Section::Allergies,
        Section::PractitionerRole,
        Section::ClinicalNotes,
        Section::Appointments,
        Section::SocialDeterminants,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Demographics => "demographics",
            Section::VitalSigns => "vital_signs",
            Section::MedicalHistory => "medical_history",
            Section::ReasonForVisit => "reason_for_visit",
            Section::Medications => "medications",
            Section::Labs => "labs",
            Section::SurgicalHistory => "surgical_history",
            Section::Surgeries => "surgeries",
            Section::Allergies => "allergies",
            Section::PractitionerRole => "practitioner_role",
            Section::ClinicalNotes => "clinical_notes",
            Section::Appointments => "appointments",
            Section::SocialDeterminants => "social_determinants",
        }
    }

    /// Resource type searched for this section.
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Section::Demographics => ResourceType::Patient,
            Section::VitalSigns | Section::Labs | Section::SocialDeterminants => {
                ResourceType::Observation
            }
            Section::MedicalHistory | Section::ReasonForVisit => ResourceType::Condition,
            Section::Medications => ResourceType::MedicationRequest,
            Section::SurgicalHistory | Section::Surgeries => ResourceType::Procedure,
            Section::Allergies => ResourceType::AllergyIntolerance,
            Section::PractitionerRole => ResourceType::PractitionerRole,
            Section::ClinicalNotes => ResourceType::DocumentReference,
            Section::Appointments => ResourceType::Appointment,
        }
    }

    /// Category-style filter narrowing the search, as `(name, value)`.
    pub fn filter(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Section::VitalSigns => Some(("category", "vital-signs")),
            Section::MedicalHistory => Some(("category", "problem-list-item")),
            Section::ReasonForVisit => Some(("category", "encounter-diagnosis")),
            Section::Labs => Some(("category", "laboratory")),
            Section::SurgicalHistory => Some(("category", "patient-reported-surgical-history")),
            Section::Surgeries => Some(("category", "surgery")),
            Section::ClinicalNotes => Some(("type", "clinical-notes")),
            Section::SocialDeterminants => Some(("category", "social-history")),
            Section::Demographics
            | Section::Medications
            | Section::Allergies
            | Section::PractitionerRole
            | Section::Appointments => None,
        }
    }

    /// The search for this section, restricted to `patient_id`.
    pub fn query(&self, patient_id: &str) -> ResourceQuery {
        let query = ResourceQuery::new(self.resource_type()).for_patient(patient_id);
        match self.filter() {
            Some((name, value)) => query.param(name, value),
            None => query,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a section's fetch went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionOutcome {
    /// The search succeeded and yielded entries.
    Retrieved { entries: usize },
    /// The search succeeded but yielded nothing.
    NoData,
    /// The search failed; the section is left empty.
    Failed { error: String },
}

impl SectionOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, SectionOutcome::Failed { .. })
    }
}

/// A patient's consolidated clinical record.
///
/// `demographics` and `practitioner_role` serialize as `{}` when absent;
/// list sections serialize as `[]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatientRecord {
    #[serde(serialize_with = "empty_object_if_none")]
    pub demographics: Option<Demographics>,
    pub vital_signs: Vec<VitalSign>,
    pub medical_history: Vec<Condition>,
    pub reason_for_visit: Vec<EncounterDiagnosis>,
    pub medications: Vec<Medication>,
    pub labs: Vec<LabResult>,
    pub surgical_history: Vec<ProcedureRecord>,
    pub surgeries: Vec<Surgery>,
    pub allergies: Vec<Allergy>,
    #[serde(serialize_with = "empty_object_if_none")]
    pub practitioner_role: Option<PractitionerRole>,
    pub clinical_notes: Vec<ClinicalNote>,
    pub appointments: Vec<Appointment>,
    pub social_determinants: Vec<SocialDeterminant>,
    /// Completion time, RFC 3339.
    pub fetch_time: String,
    pub total_fetch_time_seconds: f64,
    pub fetch_status: BTreeMap<Section, SectionOutcome>,
}

impl PatientRecord {
    /// Sections whose fetch failed.
    pub fn failed_sections(&self) -> Vec<Section> {
        self.fetch_status
            .iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .map(|(section, _)| *section)
            .collect()
    }
}

fn empty_object_if_none<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(value) => value.serialize(serializer),
        None => serde_json::Map::new().serialize(serializer),
    }
}
