//! Error types for Emploi Store API operations.

use thiserror::Error;

/// Errors that can occur during Emploi Store API operations.
#[derive(Debug, Error)]
pub enum EmploiStoreError {
    /// Configuration is missing or incomplete.
    #[error("Emploi Store configuration required: {0}")]
    ConfigMissing(String),

    /// The authorization server rejected the credentials or sent a
    /// malformed token response.
    #[error("Authentication failed: {message}")]
    Authentication {
        message: String,
        status_code: Option<u16>,
    },

    /// A data call returned a non-success status or an unparseable body.
    #[error("Emploi Store API error (HTTP {status_code}): {body}")]
    ApiRequest { status_code: u16, body: String },

    /// No package or resource matches the given selector.
    #[error("{entity_type} '{id}' not found")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A call was made with arguments the endpoint cannot accept.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// Resource name pattern could not be compiled.
    #[error("Invalid resource name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// CSV writing error.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// File system error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EmploiStoreError {
    /// HTTP status code attached to this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Authentication { status_code, .. } => *status_code,
            Self::ApiRequest { status_code, .. } => Some(*status_code),
            Self::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if this is a `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for Emploi Store operations.
pub type Result<T> = core::result::Result<T, EmploiStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_request_error_carries_status_and_body() {
        let err = EmploiStoreError::ApiRequest {
            status_code: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.status_code(), Some(500));
        assert!(err.to_string().contains("HTTP 500"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_not_found_display() {
        let err = EmploiStoreError::NotFound {
            entity_type: "Package",
            id: "bmo".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Package 'bmo' not found");
    }
}
