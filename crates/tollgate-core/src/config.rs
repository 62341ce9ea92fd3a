// ── Runtime console configuration ──
//
// These types describe *how* to reach the backend and how codes and
// files look. They carry credential data but never touch disk: the CLI
// builds a `ConsoleConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::codegen::{Charset, DEFAULT_BODY_LENGTH};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed staging backends).
    DangerAcceptInvalid,
}

/// How generated voucher codes look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSettings {
    pub charset: Charset,
    pub body_length: usize,
    /// Prefix used when a command does not name one.
    pub default_prefix: String,
}

impl Default for CodeSettings {
    fn default() -> Self {
        Self {
            charset: Charset::default(),
            body_length: DEFAULT_BODY_LENGTH,
            default_prefix: "VOUCHER".into(),
        }
    }
}

/// Everything a `Console` needs besides its store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub codes: CodeSettings,
    /// Column delimiter for delimited-text import and export.
    pub delimiter: char,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            codes: CodeSettings::default(),
            delimiter: ',',
        }
    }
}

/// Configuration for talking to one backend.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Backend URL (e.g. `https://billing.example.com`).
    pub url: Url,
    pub api_key: SecretString,
    pub tls: TlsVerification,
    pub timeout: Duration,
    pub settings: ConsoleSettings,
}

impl ConsoleConfig {
    pub(crate) fn transport(&self) -> tollgate_api::TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => tollgate_api::TlsMode::System,
            TlsVerification::CustomCa(path) => tollgate_api::TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => tollgate_api::TlsMode::DangerAcceptInvalid,
        };
        tollgate_api::TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
