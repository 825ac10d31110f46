//! # Link Error Types
//!
//! Typed error handling for the payment-links service.
//! All link operations return `Result<T, LinkError>`.

use thiserror::Error;

/// Core error type for all link operations
#[derive(Debug, Error)]
pub enum LinkError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Reference collides with an existing link
    #[error("Reference must be unique: {reference}")]
    DuplicateReference { reference: String },

    /// Link does not exist
    #[error("Payment not found: {payment_id}")]
    LinkNotFound { payment_id: String },

    /// Link has passed its expiry timestamp
    #[error("This payment link has expired: {payment_id}")]
    LinkExpired { payment_id: String },

    /// Link has already been paid
    #[error("This payment link has already been paid: {payment_id}")]
    AlreadyPaid { payment_id: String },

    /// Currency not supported
    #[error("Unsupported currency: {currency}")]
    UnsupportedCurrency { currency: String },

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParseError(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LinkError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LinkError::NetworkError(_) | LinkError::ProviderError { .. }
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            LinkError::Configuration(_) => 500,
            LinkError::InvalidRequest(_) => 400,
            LinkError::DuplicateReference { .. } => 400,
            LinkError::LinkNotFound { .. } => 404,
            LinkError::LinkExpired { .. } => 403,
            LinkError::AlreadyPaid { .. } => 403,
            LinkError::UnsupportedCurrency { .. } => 400,
            LinkError::ProviderError { .. } => 502,
            LinkError::NetworkError(_) => 503,
            LinkError::WebhookVerificationFailed(_) => 401,
            LinkError::WebhookParseError(_) => 400,
            LinkError::Storage(_) => 500,
            LinkError::Serialization(_) => 500,
            LinkError::Internal(_) => 500,
        }
    }
}

/// Result type alias for link operations
pub type LinkResult<T> = Result<T, LinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(LinkError::NetworkError("timeout".into()).is_retryable());
        assert!(LinkError::ProviderError {
            provider: "adyen".into(),
            message: "502".into()
        }
        .is_retryable());
        assert!(!LinkError::InvalidRequest("bad data".into()).is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            LinkError::DuplicateReference {
                reference: "R".into()
            }
            .status_code(),
            400
        );
        assert_eq!(
            LinkError::LinkNotFound {
                payment_id: "x".into()
            }
            .status_code(),
            404
        );
        assert_eq!(
            LinkError::AlreadyPaid {
                payment_id: "x".into()
            }
            .status_code(),
            403
        );
        assert_eq!(
            LinkError::WebhookVerificationFailed("mismatch".into()).status_code(),
            401
        );
    }
}
