//! Aggregation over a scripted resource source.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use chartlink_client::{ClientError, ClientResult, RawBundle, ResourceQuery, ResourceSource};
use chartlink_record::{AggregatorConfig, PatientRecordAggregator, Section, SectionOutcome};

/// Answers each section from a script keyed by `Type:filter`.
#[derive(Default)]
struct ScriptedSource {
    bundles: HashMap<String, Value>,
    failing: Vec<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    patients_seen: std::sync::Mutex<Vec<String>>,
}

fn key(query: &ResourceQuery) -> String {
    let filter = query
        .get_param("category")
        .or_else(|| query.get_param("type"))
        .unwrap_or("");
    format!("{}:{filter}", query.resource_type())
}

impl ScriptedSource {
    fn with(mut self, key: &str, resources: Vec<Value>) -> Self {
        self.bundles.insert(key.to_string(), bundle(resources));
        self
    }

    fn failing(mut self, key: &str) -> Self {
        self.failing.push(key.to_string());
        self
    }
}

#[async_trait]
impl ResourceSource for ScriptedSource {
    async fn fetch_resources(&self, query: &ResourceQuery) -> ClientResult<RawBundle> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let chartlink_client::SubjectFilter::Patient(id) = query.subject() {
            self.patients_seen.lock().unwrap().push(id.clone());
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let key = key(query);
        if self.failing.contains(&key) {
            return Err(ClientError::request_failed(
                query.resource_type().as_str(),
                500,
                "upstream error",
            ));
        }
        Ok(RawBundle::new(
            self.bundles
                .get(&key)
                .cloned()
                .unwrap_or_else(|| bundle(vec![])),
        ))
    }
}

fn bundle(resources: Vec<Value>) -> Value {
    json!({
        "resourceType": "Bundle",
        "type": "searchset",
        "total": resources.len(),
        "entry": resources.into_iter().map(|r| json!({"resource": r})).collect::<Vec<_>>()
    })
}

fn full_source() -> ScriptedSource {
    ScriptedSource::default()
        .with(
            "Patient:",
            vec![json!({"resourceType": "Patient", "id": "p1", "name": [{"given": ["Ada"], "family": "King"}]})],
        )
        .with(
            "Observation:vital-signs",
            vec![json!({"code": {"text": "Pulse"}, "valueQuantity": {"value": 64, "unit": "/min"}})],
        )
        .with(
            "Condition:problem-list-item",
            vec![json!({"id": "c1", "code": {"text": "Asthma"}})],
        )
        .with(
            "Condition:encounter-diagnosis",
            vec![json!({"id": "d1", "code": {"text": "Cough"}})],
        )
        .with(
            "MedicationRequest:",
            vec![json!({"id": "m1", "medicationCodeableConcept": {"text": "Albuterol"}})],
        )
        .with(
            "Observation:laboratory",
            vec![json!({"id": "l1", "code": {"text": "CBC"}})],
        )
        .with(
            "Procedure:patient-reported-surgical-history",
            vec![json!({"id": "h1", "code": {"text": "Tonsillectomy"}})],
        )
        .with(
            "Procedure:surgery",
            vec![json!({"id": "s1", "code": {"text": "Appendectomy"}, "outcome": {"text": "Good"}})],
        )
        .with(
            "AllergyIntolerance:",
            vec![json!({
                "code": {"text": "Penicillin"},
                "criticality": "high",
                "reaction": [{"manifestation": [{"text": "Rash"}]}]
            })],
        )
        .with(
            "PractitionerRole:",
            vec![json!({"id": "r1", "practitioner": {"display": "Dr. Lin"}})],
        )
        .with(
            "DocumentReference:clinical-notes",
            vec![json!({"id": "n1", "title": "Visit"})],
        )
        .with("Appointment:", vec![json!({"id": "a1", "status": "booked"})])
        .with(
            "Observation:social-history",
            vec![json!({"id": "sd1", "code": {"text": "Tobacco"}, "valueString": "Never"})],
        )
}

fn aggregator(source: ScriptedSource, max_concurrency: usize) -> (PatientRecordAggregator, Arc<ScriptedSource>) {
    let source = Arc::new(source);
    let aggregator = PatientRecordAggregator::new(source.clone(), &AggregatorConfig { max_concurrency });
    (aggregator, source)
}

#[tokio::test]
async fn test_complete_record() {
    let (aggregator, source) = aggregator(full_source(), 4);

    let record = aggregator.build("p1").await;

    assert_eq!(source.calls.load(Ordering::SeqCst), 13);
    assert!(source.patients_seen.lock().unwrap().iter().all(|p| p == "p1"));

    assert_eq!(record.demographics.as_ref().unwrap().name, "Ada King");
    assert_eq!(record.vital_signs.len(), 1);
    assert_eq!(record.medical_history[0].code, "Asthma");
    assert_eq!(record.reason_for_visit[0].code, "Cough");
    assert_eq!(record.medications[0].name, "Albuterol");
    assert_eq!(record.labs[0].name, "CBC");
    assert_eq!(record.surgical_history[0].name, "Tonsillectomy");
    assert_eq!(record.surgeries[0].outcome.as_deref(), Some("Good"));
    assert_eq!(record.practitioner_role.as_ref().unwrap().practitioner, "Dr. Lin");
    assert_eq!(record.clinical_notes[0].title.as_deref(), Some("Visit"));
    assert_eq!(record.appointments[0].status.as_deref(), Some("booked"));
    assert_eq!(record.social_determinants[0].value, "Never");

    let allergy = &record.allergies[0];
    assert_eq!(allergy.substance, "Penicillin");
    assert_eq!(allergy.severity.as_deref(), Some("high"));
    assert_eq!(allergy.reaction, vec!["Rash"]);

    assert_eq!(record.fetch_status.len(), 13);
    assert!(record.failed_sections().is_empty());
    assert!(record.total_fetch_time_seconds >= 0.0);
    assert!(!record.fetch_time.is_empty());
}

#[tokio::test]
async fn test_failed_section_is_isolated() {
    let (aggregator, _) = aggregator(full_source().failing("Observation:vital-signs"), 4);

    let record = aggregator.build("p1").await;

    assert!(record.vital_signs.is_empty());
    assert_eq!(record.failed_sections(), vec![Section::VitalSigns]);
    assert!(matches!(
        record.fetch_status[&Section::VitalSigns],
        SectionOutcome::Failed { .. }
    ));

    // Everything else is intact.
    assert!(record.demographics.is_some());
    assert_eq!(record.labs.len(), 1);
    assert_eq!(record.allergies.len(), 1);
    assert_eq!(record.social_determinants.len(), 1);
    assert_eq!(
        record.fetch_status[&Section::Labs],
        SectionOutcome::Retrieved { entries: 1 }
    );

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["vital_signs"], json!([]));
}

#[tokio::test]
async fn test_everything_failing_still_yields_record() {
    let mut source = ScriptedSource::default();
    for section in Section::ALL {
        source = source.failing(&key(&section.query("p1")));
    }
    let (aggregator, _) = aggregator(source, 4);

    let record = aggregator.build("p1").await;

    assert_eq!(record.failed_sections().len(), 13);
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["demographics"], json!({}));
    assert_eq!(json["practitioner_role"], json!({}));
    assert_eq!(json["allergies"], json!([]));
}

#[tokio::test]
async fn test_empty_sections_report_no_data() {
    let (aggregator, _) = aggregator(ScriptedSource::default(), 4);

    let record = aggregator.build("p1").await;

    assert!(
        record
            .fetch_status
            .values()
            .all(|outcome| *outcome == SectionOutcome::NoData)
    );
    assert!(record.demographics.is_none());
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let source = ScriptedSource {
        delay: Duration::from_millis(20),
        ..full_source()
    };
    let (aggregator, source) = aggregator(source, 3);

    aggregator.build("p1").await;

    let peak = source.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency {peak} exceeded the bound");
    assert!(peak >= 2, "sections were not fetched concurrently");
}

#[tokio::test]
async fn test_cancellation_drops_in_flight_searches() {
    let source = ScriptedSource {
        delay: Duration::from_secs(5),
        ..full_source()
    };
    let (aggregator, source) = aggregator(source, 4);

    let result = tokio::time::timeout(Duration::from_millis(50), aggregator.build("p1")).await;

    assert!(result.is_err());
    assert!(source.calls.load(Ordering::SeqCst) <= 4);
}
