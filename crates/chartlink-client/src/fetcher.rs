//! Authenticated FHIR resource retrieval.
//!
//! [`ResourceFetcher`] issues `GET {base}/{Type}[/{id}]` requests with a
//! bearer token from the shared [`TokenIssuer`]. A `401` response triggers
//! exactly one forced token refresh and one retry; every other failure is
//! reported without retrying.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use chartlink_auth::{AccessToken, TokenIssuer};
use chartlink_core::{FHIR_JSON, ResourceType, truncate_for_log};

use crate::ClientResult;
use crate::bundle::RawBundle;
use crate::config::FetcherConfig;
use crate::error::ClientError;
use crate::query::ResourceQuery;
use crate::rate_limit::RateLimiter;

/// A source of FHIR resources.
///
/// Implemented by [`ResourceFetcher`]; the record aggregator depends on this
/// trait so it can run against any backend.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    /// Runs `query` and returns the raw payload.
    async fn fetch_resources(&self, query: &ResourceQuery) -> ClientResult<RawBundle>;
}

/// Criteria for a cross-patient Patient search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientSearch {
    pub family: Option<String>,
    pub given: Option<String>,
    /// Birth date as `YYYY-MM-DD`.
    pub birthdate: Option<String>,
    pub identifier: Option<String>,
}

impl PatientSearch {
    /// Builds the Patient search query. The bound subject never applies.
    pub fn into_query(self) -> ResourceQuery {
        let mut query = ResourceQuery::new(ResourceType::Patient).without_subject();
        for (name, value) in [
            ("family", self.family),
            ("given", self.given),
            ("birthdate", self.birthdate),
            ("identifier", self.identifier),
        ] {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                query = query.param(name, value);
            }
        }
        query
    }
}

/// Authenticated FHIR REST client.
///
/// Cheap to clone; clones share the token issuer, HTTP connection pool and
/// rate limiter.
#[derive(Clone)]
pub struct ResourceFetcher {
    issuer: Arc<TokenIssuer>,
    base_url: Url,
    http: reqwest::Client,
    subject: Option<String>,
    page_size: Option<u32>,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl ResourceFetcher {
    /// Builds a fetcher for `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if the base URL cannot be used and
    /// `ClientError::Network` if the HTTP client cannot be built.
    pub fn new(issuer: Arc<TokenIssuer>, config: &FetcherConfig) -> ClientResult<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::invalid_url(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::invalid_url(format!(
                "{} cannot be a base URL",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::network("-", e.to_string()))?;

        Ok(Self {
            issuer,
            base_url,
            http,
            subject: None,
            page_size: config.page_size,
            rate_limiter: config
                .rate_limit
                .as_ref()
                .map(|limit| Arc::new(RateLimiter::from_config(limit))),
        })
    }

    /// A clone whose searches are restricted to `patient_id` by default.
    #[must_use]
    pub fn for_subject(&self, patient_id: impl Into<String>) -> Self {
        Self {
            subject: Some(patient_id.into()),
            ..self.clone()
        }
    }

    /// The bound patient id, if any.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn issuer(&self) -> &Arc<TokenIssuer> {
        &self.issuer
    }

    /// Runs `query`, logging and swallowing any failure.
    pub async fn fetch(&self, query: &ResourceQuery) -> Option<RawBundle> {
        match self.try_fetch(query).await {
            Ok(bundle) => Some(bundle),
            Err(e) => {
                tracing::warn!(
                    resource_type = %query.resource_type(),
                    status = ?e.status(),
                    error = %e,
                    "FHIR request unavailable"
                );
                None
            }
        }
    }

    /// Runs `query`.
    ///
    /// # Errors
    ///
    /// - `ClientError::TokenUnavailable` when no token can be obtained; no
    ///   resource request is sent in that case
    /// - `ClientError::RequestFailed` for non-success responses, including a
    ///   second `401` after the refresh
    /// - `ClientError::Network` for transport errors and timeouts
    /// - `ClientError::InvalidResponse` for bodies that are not JSON
    pub async fn try_fetch(&self, query: &ResourceQuery) -> ClientResult<RawBundle> {
        let token = self
            .issuer
            .get_token(None, false)
            .await
            .ok_or(ClientError::TokenUnavailable)?;

        let url = self.url_for(query)?;
        let params = query.query_pairs(self.subject.as_deref(), self.page_size);

        let response = self.send(query, &url, &params, &token).await?;
        let response = if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(
                resource_type = %query.resource_type(),
                "Access token rejected, refreshing and retrying once"
            );
            let token = self
                .issuer
                .refresh_rejected(&token)
                .await
                .ok_or(ClientError::TokenUnavailable)?;
            self.send(query, &url, &params, &token).await?
        } else {
            response
        };

        read_body(query.resource_type(), response).await
    }

    /// Searches patients across the whole system.
    ///
    /// Empty criteria are omitted. The bound subject never applies.
    pub async fn search_patients(&self, criteria: PatientSearch) -> Option<RawBundle> {
        self.fetch(&criteria.into_query()).await
    }

    /// Observations for `patient_id`, optionally limited to one category
    /// (e.g. `vital-signs`, `laboratory`).
    pub async fn patient_observations(
        &self,
        patient_id: &str,
        category: Option<&str>,
    ) -> Option<RawBundle> {
        let mut query = ResourceQuery::new(ResourceType::Observation).for_patient(patient_id);
        if let Some(category) = category {
            query = query.param("category", category);
        }
        self.fetch(&query).await
    }

    fn url_for(&self, query: &ResourceQuery) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::invalid_url(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(query.path_segments());
        Ok(url)
    }

    async fn send(
        &self,
        query: &ResourceQuery,
        url: &Url,
        params: &[(String, String)],
        token: &AccessToken,
    ) -> ClientResult<reqwest::Response> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let started = Instant::now();
        let result = self
            .http
            .get(url.clone())
            .bearer_auth(token.value())
            .header(reqwest::header::ACCEPT, FHIR_JSON)
            .header(reqwest::header::CONTENT_TYPE, FHIR_JSON)
            .query(params)
            .send()
            .await;
        let elapsed_ms = millis(started.elapsed());

        match result {
            Ok(response) => {
                tracing::info!(
                    resource_type = %query.resource_type(),
                    id = query.id().unwrap_or(""),
                    status = response.status().as_u16(),
                    elapsed_ms,
                    "FHIR request"
                );
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(
                    resource_type = %query.resource_type(),
                    elapsed_ms,
                    timeout = e.is_timeout(),
                    error = %e,
                    "FHIR request error"
                );
                Err(ClientError::network(
                    query.resource_type().as_str(),
                    e.to_string(),
                ))
            }
        }
    }
}

impl std::fmt::Debug for ResourceFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceFetcher")
            .field("base_url", &self.base_url.as_str())
            .field("subject", &self.subject)
            .field("page_size", &self.page_size)
            .field("rate_limited", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ResourceSource for ResourceFetcher {
    async fn fetch_resources(&self, query: &ResourceQuery) -> ClientResult<RawBundle> {
        self.try_fetch(query).await
    }
}

async fn read_body(
    resource_type: &ResourceType,
    response: reqwest::Response,
) -> ClientResult<RawBundle> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ClientError::network(resource_type.as_str(), e.to_string()))?;

    if !status.is_success() {
        let message = operation_outcome_message(&body).unwrap_or_else(|| truncate_for_log(&body));
        tracing::warn!(
            resource_type = %resource_type,
            status = status.as_u16(),
            body = %truncate_for_log(&body),
            "FHIR request failed"
        );
        return Err(ClientError::request_failed(
            resource_type.as_str(),
            status.as_u16(),
            message,
        ));
    }

    serde_json::from_str::<Value>(&body)
        .map(RawBundle::new)
        .map_err(|e| ClientError::invalid_response(resource_type.as_str(), e.to_string()))
}

/// Joined `issue[].diagnostics` of an OperationOutcome body.
fn operation_outcome_message(body: &str) -> Option<String> {
    let json = serde_json::from_str::<Value>(body).ok()?;
    if json.get("resourceType").and_then(Value::as_str) != Some("OperationOutcome") {
        return None;
    }
    let messages: Vec<&str> = json
        .get("issue")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(|issue| {
            issue
                .get("diagnostics")
                .or_else(|| issue.pointer("/details/text"))
                .and_then(Value::as_str)
        })
        .collect();
    (!messages.is_empty()).then(|| truncate_for_log(&messages.join("; ")))
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
