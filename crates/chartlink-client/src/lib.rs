//! # chartlink-client
//!
//! Authenticated FHIR resource retrieval on top of [`chartlink_auth`].
//!
//! ## Modules
//!
//! - [`config`] - Base URL, timeout, page size and rate limit settings
//! - [`query`] - Resource queries and the implicit patient filter
//! - [`bundle`] - Raw search results
//! - [`fetcher`] - The authenticated fetcher and the [`ResourceSource`] seam
//! - [`rate_limit`] - Sliding-window request limiter
//! - [`error`] - Error types

pub mod bundle;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod query;
pub mod rate_limit;

pub use bundle::RawBundle;
pub use chartlink_auth::ConfigError;
pub use config::{FetcherConfig, RateLimitConfig};
pub use error::ClientError;
pub use fetcher::{PatientSearch, ResourceFetcher, ResourceSource};
pub use query::{ResourceQuery, SubjectFilter};
pub use rate_limit::RateLimiter;

/// Type alias for resource client results.
pub type ClientResult<T> = Result<T, ClientError>;
