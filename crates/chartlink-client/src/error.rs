//! Resource client error types.

/// Errors raised while fetching FHIR resources.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No access token could be obtained. No resource request was sent.
    #[error("Access token unavailable")]
    TokenUnavailable,

    /// The resource endpoint answered with a non-success status.
    #[error("{resource_type} request failed (HTTP {status}): {message}")]
    RequestFailed {
        /// Resource type that was requested.
        resource_type: String,
        /// HTTP status code.
        status: u16,
        /// OperationOutcome diagnostics or the truncated response body.
        message: String,
    },

    /// The request could not be sent or timed out.
    #[error("{resource_type} request error: {message}")]
    Network {
        /// Resource type that was requested.
        resource_type: String,
        /// Transport error description.
        message: String,
    },

    /// The response body is not valid JSON.
    #[error("{resource_type} returned an invalid response: {message}")]
    InvalidResponse {
        /// Resource type that was requested.
        resource_type: String,
        /// Parse error description.
        message: String,
    },

    /// The resource URL could not be built.
    #[error("Invalid resource URL: {message}")]
    InvalidUrl {
        /// Description of the problem.
        message: String,
    },
}

impl ClientError {
    /// Creates a new `RequestFailed` error.
    #[must_use]
    pub fn request_failed(
        resource_type: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::RequestFailed {
            resource_type: resource_type.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates a new `Network` error.
    #[must_use]
    pub fn network(resource_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            resource_type: resource_type.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidResponse` error.
    #[must_use]
    pub fn invalid_response(resource_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            resource_type: resource_type.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidUrl` error.
    #[must_use]
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            message: message.into(),
        }
    }

    /// HTTP status of a rejected request, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` when the endpoint rejected the bearer token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}
