//! Resource queries.
//!
//! A [`ResourceQuery`] names a resource type, an optional logical id and
//! search parameters. Collection searches are additionally restricted to one
//! patient (the implicit subject filter) unless the caller already supplied
//! that filter or opted out.

use chartlink_core::ResourceType;

/// How the implicit patient filter applies to a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubjectFilter {
    /// Use the subject bound to the fetcher, if any.
    #[default]
    Inherit,
    /// Restrict to this patient id.
    Patient(String),
    /// Never add a patient filter (e.g. cross-patient searches).
    Disabled,
}

/// A single FHIR read or search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceQuery {
    resource_type: ResourceType,
    id: Option<String>,
    params: Vec<(String, String)>,
    subject: SubjectFilter,
}

impl ResourceQuery {
    /// A search over `resource_type`.
    #[must_use]
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            id: None,
            params: Vec::new(),
            subject: SubjectFilter::Inherit,
        }
    }

    /// Reads one resource by logical id instead of searching.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds a search parameter. Repeated names are kept in order.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Restricts the search to `patient_id`.
    #[must_use]
    pub fn for_patient(mut self, patient_id: impl Into<String>) -> Self {
        self.subject = SubjectFilter::Patient(patient_id.into());
        self
    }

    /// Disables the implicit patient filter.
    #[must_use]
    pub fn without_subject(mut self) -> Self {
        self.subject = SubjectFilter::Disabled;
        self
    }

    pub fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn subject(&self) -> &SubjectFilter {
        &self.subject
    }

    /// Value of the first parameter named `name`.
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// URL path segments below the FHIR base: `Type` or `Type/id`.
    pub fn path_segments(&self) -> Vec<&str> {
        let mut segments = vec![self.resource_type.as_str()];
        if let Some(id) = &self.id {
            segments.push(id);
        }
        segments
    }

    /// Final query string parameters.
    ///
    /// For searches (no id) the patient filter is appended when a subject is
    /// known (from the query, else `bound_subject`) and the caller has not
    /// set the filter parameter themselves. `page_size` becomes `_count`
    /// unless already present.
    pub fn query_pairs(
        &self,
        bound_subject: Option<&str>,
        page_size: Option<u32>,
    ) -> Vec<(String, String)> {
        let mut pairs = self.params.clone();

        if self.id.is_none() {
            let subject = match &self.subject {
                SubjectFilter::Inherit => bound_subject,
                SubjectFilter::Patient(id) => Some(id.as_str()),
                SubjectFilter::Disabled => None,
            };
            let filter = self.resource_type.subject_param();
            if let Some(subject) = subject
                && self.get_param(filter).is_none()
            {
                pairs.push((filter.to_string(), subject.to_string()));
            }

            if let Some(count) = page_size
                && self.get_param("_count").is_none()
            {
                pairs.push(("_count".to_string(), count.to_string()));
            }
        }

        pairs
    }
}
