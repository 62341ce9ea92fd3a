//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use tollgate_config::ConfigError;
use tollgate_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const PARTIAL_FAILURE: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to backend at {url}")]
    #[diagnostic(
        code(tollgate::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             Use --insecure (-k) for self-signed staging certificates."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(tollgate::auth_failed),
        help(
            "Verify the API key for this profile.\n\
             Run: tollgate config set-key"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(tollgate::no_credentials),
        help(
            "Configure credentials with: tollgate config init\n\
             Or set the TOLLGATE_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(tollgate::not_found),
        help("Run: tollgate {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Conflict: {message}")]
    #[diagnostic(
        code(tollgate::conflict),
        help("Voucher codes are unique and never reused, even after deletion.")
    )]
    Conflict { message: String },

    #[error("Rejected: {message}")]
    #[diagnostic(code(tollgate::rejected))]
    Rejected { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(tollgate::api_error))]
    ApiError { code: String, message: String },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tollgate::validation))]
    Validation { field: String, reason: String },

    #[error("Invalid input: {details}")]
    #[diagnostic(
        code(tollgate::invalid_input),
        help("Nothing was written. Fix the listed fields and retry.")
    )]
    InvalidInput { details: String },

    #[error("Could not read import file: {reason}")]
    #[diagnostic(
        code(tollgate::import),
        help(
            "Delimited files need a header line and at least one data line.\n\
             JSON files need an object or an array of objects."
        )
    )]
    ImportFailed { reason: String },

    #[error("Could not export vouchers: {reason}")]
    #[diagnostic(code(tollgate::export))]
    ExportFailed { reason: String },

    // ── Batches ──────────────────────────────────────────────────────
    #[error("{operation}: {failed} of {total} records failed")]
    #[diagnostic(
        code(tollgate::partial_failure),
        help("Successful records were kept. The report above lists each failure.")
    )]
    PartialFailure {
        operation: String,
        failed: usize,
        total: usize,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(tollgate::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: tollgate config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(tollgate::no_config),
        help(
            "Create one with: tollgate config init\n\
             Or pass --backend and --api-key.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(tollgate::config))]
    Config(Box<figment::Error>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(tollgate::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(tollgate::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(tollgate::render))]
    Render(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::InvalidInput { .. }
            | Self::ImportFailed { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::PartialFailure { .. } => exit_code::PARTIAL_FAILURE,
            _ => exit_code::GENERAL,
        }
    }
}

/// `tollgate <command>` that lists entities of `entity_type`.
fn list_command_for(entity_type: &str) -> String {
    match entity_type.trim_end_matches('s') {
        "voucher" => "vouchers list".into(),
        "subscription" => "subscriptions list".into(),
        "payment" => "payments list".into(),
        _ => "--help".into(),
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: list_command_for(&entity_type),
                resource_type: entity_type,
                identifier,
            },

            CoreError::Conflict { message } => CliError::Conflict { message },

            CoreError::Validation(errors) => CliError::InvalidInput {
                details: errors.to_string(),
            },

            CoreError::Parse(e) => CliError::ImportFailed {
                reason: e.to_string(),
            },

            CoreError::Export(e) => CliError::ExportFailed {
                reason: e.to_string(),
            },

            CoreError::Redeem(e) => CliError::Rejected {
                message: e.to_string(),
            },

            CoreError::Rejected { message } => CliError::Rejected { message },

            CoreError::Api {
                message,
                code,
                status,
            } => CliError::ApiError {
                code: code
                    .or_else(|| status.map(|s| s.to_string()))
                    .unwrap_or_else(|| "unknown".into()),
                message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Serialization(e) => CliError::Render(e.to_string()),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::ValidationErrors;

    #[test]
    fn validation_is_a_usage_error() {
        let mut errors = ValidationErrors::new();
        errors.add("count", "must be between 1 and 1000");
        let err = CliError::from(CoreError::Validation(errors));
        assert_eq!(err.exit_code(), exit_code::USAGE);
        assert!(err.to_string().contains("count"));
    }

    #[test]
    fn store_not_found_points_at_list_command() {
        let err = CliError::from(CoreError::not_found("vouchers", "V_1"));
        match err {
            CliError::NotFound { list_command, .. } => assert_eq!(list_command, "vouchers list"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let conflict = CliError::from(CoreError::Conflict {
            message: "code taken".into(),
        });
        assert_eq!(conflict.exit_code(), exit_code::CONFLICT);

        let auth = CliError::from(CoreError::AuthenticationFailed {
            message: "Invalid API key".into(),
        });
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let partial = CliError::PartialFailure {
            operation: "import".into(),
            failed: 2,
            total: 5,
        };
        assert_eq!(partial.exit_code(), exit_code::PARTIAL_FAILURE);
    }
}
