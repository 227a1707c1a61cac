use thiserror::Error;

/// Core error types shared by the chartlink crates
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid FHIR resource type: {0}")]
    InvalidResourceType(String),

    #[error("Invalid FHIR date: {0}")]
    InvalidDate(String),
}

impl CoreError {
    /// Create a new InvalidResourceType error
    pub fn invalid_resource_type(resource_type: impl Into<String>) -> Self {
        Self::InvalidResourceType(resource_type.into())
    }

    /// Create a new InvalidDate error
    pub fn invalid_date(date: impl Into<String>) -> Self {
        Self::InvalidDate(date.into())
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid_resource_type("patient");
        assert_eq!(err.to_string(), "Invalid FHIR resource type: patient");

        let err = CoreError::invalid_date("1990-13-45");
        assert_eq!(err.to_string(), "Invalid FHIR date: 1990-13-45");
    }
}
