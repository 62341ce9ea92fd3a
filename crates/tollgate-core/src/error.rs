// ── Core error types ──
//
// User-facing errors from tollgate-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<tollgate_api::Error>`
// impl translates transport-layer errors into domain variants.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::import::{ExportError, ParseError};
use crate::model::RedeemError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Backend request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    // ── Input errors ─────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Import failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Redemption refused: {0}")]
    Redeem(#[from] RedeemError),

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation rejected: {message}")]
    Rejected { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Backend-specific error code (e.g. "voucher.code.duplicate").
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity_type: &str, identifier: impl fmt::Display) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_owned(),
            identifier: identifier.to_string(),
        }
    }
}

// ── Validation errors ───────────────────────────────────────────────

/// Ordered field → message map. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(IndexMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem with `field`. The first message per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tollgate_api::Error> for CoreError {
    fn from(err: tollgate_api::Error) -> Self {
        match err {
            tollgate_api::Error::InvalidApiKey => CoreError::AuthenticationFailed {
                message: "Invalid API key".into(),
            },
            tollgate_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            tollgate_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            tollgate_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            tollgate_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            tollgate_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            tollgate_api::Error::Api {
                message, status, ..
            } if status == 404 => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: message,
            },
            tollgate_api::Error::Api {
                message, status, ..
            } if status == 409 => CoreError::Conflict { message },
            tollgate_api::Error::Api {
                message,
                code,
                status,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            tollgate_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_keep_order_and_first_message() {
        let mut errors = ValidationErrors::new();
        errors.add("packageKey", "is required");
        errors.add("count", "must be between 1 and 1000");
        errors.add("packageKey", "ignored");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("packageKey"), Some("is required"));
        assert_eq!(
            errors.to_string(),
            "packageKey: is required; count: must be between 1 and 1000"
        );
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn api_conflict_maps_to_conflict() {
        let err = CoreError::from(tollgate_api::Error::Api {
            message: "code taken".into(),
            code: None,
            status: 409,
        });
        assert!(matches!(err, CoreError::Conflict { .. }));
    }

    #[test]
    fn invalid_key_maps_to_auth_failure() {
        let err = CoreError::from(tollgate_api::Error::InvalidApiKey);
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }
}
