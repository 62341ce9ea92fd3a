use thiserror::Error;

/// Top-level error type for the `tollgate-api` crate.
///
/// Covers every failure mode of a single request against the entitlement
/// backend: authentication, transport, structured API errors, and response
/// decoding. `tollgate-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Invalid API key (rejected by the backend with HTTP 401).
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Request was authenticated but not permitted (HTTP 403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Structured error from the backend (`{ "message", "code" }` body).
    #[error("API error (HTTP {status}): {message}")]
    Api {
        message: String,
        code: Option<String>,
        status: u16,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// The core never retries on its own; callers that wrap the client
    /// with a retry policy use this to decide.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the backend rejected a write as conflicting
    /// (e.g. a voucher code that is already assigned).
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Api { status: 409, .. })
    }

    /// Extract the API error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Api {
            message: "upstream unavailable".into(),
            code: None,
            status: 503,
        };
        assert!(err.is_transient());
        assert!(!err.is_conflict());
    }

    #[test]
    fn conflict_is_not_transient() {
        let err = Error::Api {
            message: "code already assigned".into(),
            code: Some("voucher.code.duplicate".into()),
            status: 409,
        };
        assert!(err.is_conflict());
        assert!(!err.is_transient());
        assert_eq!(err.api_error_code(), Some("voucher.code.duplicate"));
    }

    #[test]
    fn not_found_from_api_status() {
        let err = Error::Api {
            message: "no such voucher".into(),
            code: None,
            status: 404,
        };
        assert!(err.is_not_found());
    }
}
