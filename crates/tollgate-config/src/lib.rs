//! Shared configuration for the tollgate CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `tollgate_core::ConsoleConfig`. The CLI adds
//! flag-aware wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tollgate_core::{Charset, CodeSettings, ConsoleConfig, ConsoleSettings, TlsVerification};

/// Service name under which API keys live in the system keyring.
pub const KEYRING_SERVICE: &str = "tollgate";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_CODE_LENGTH: usize = 64;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Profile names, sorted.
    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// A named backend profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "https://billing.example.com").
    pub backend: String,

    /// API key (plaintext -- prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid TLS certificates.
    pub insecure: Option<bool>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,

    /// Prefix for generated voucher codes.
    pub voucher_prefix: Option<String>,

    /// Random characters per generated code.
    pub code_length: Option<usize>,

    /// Symbols codes are drawn from.
    pub code_charset: Option<String>,

    /// Column delimiter for import and export files.
    pub delimiter: Option<String>,
}

impl Profile {
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            ..Self::default()
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "tollgate", "tollgate").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("tollgate");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path`, then `TOLLGATE_*` variables
/// (`__` separates nested keys, e.g. `TOLLGATE_DEFAULTS__TIMEOUT`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TOLLGATE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Keyring account holding the API key of `profile_name`.
pub fn keyring_account(profile_name: &str) -> String {
    format!("{profile_name}/api-key")
}

/// Resolve an API key: `api_key_env` variable, then keyring, then plaintext.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(profile_name)) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store `secret` as the API key of `profile_name` in the system keyring.
pub fn store_api_key(profile_name: &str, secret: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(profile_name))
        .map_err(|e| invalid("keyring", format!("failed to access keyring: {e}")))?;
    entry
        .set_password(secret)
        .map_err(|e| invalid("keyring", format!("failed to store API key in keyring: {e}")))
}

// ── Translation to core config ──────────────────────────────────────

pub fn parse_backend_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw
        .parse()
        .map_err(|_| invalid("backend", format!("invalid URL: {raw}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("backend", format!("unsupported scheme: {}", url.scheme())));
    }
    Ok(url)
}

/// A one-character delimiter other than a quote or line break.
pub fn parse_delimiter(raw: &str) -> Result<char, ConfigError> {
    let raw = if raw == "\\t" { "\t" } else { raw };
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !matches!(c, '"' | '\n' | '\r') => Ok(c),
        _ => Err(invalid(
            "delimiter",
            format!("{raw:?} must be a single character other than a quote"),
        )),
    }
}

/// Code and file settings carried by `profile`, defaults for the rest.
pub fn profile_settings(profile: &Profile) -> Result<ConsoleSettings, ConfigError> {
    let mut settings = ConsoleSettings::default();
    let codes: &mut CodeSettings = &mut settings.codes;

    if let Some(ref symbols) = profile.code_charset {
        codes.charset = Charset::new(symbols).map_err(|e| invalid("code_charset", e.to_string()))?;
    }
    if let Some(length) = profile.code_length {
        if length == 0 || length > MAX_CODE_LENGTH {
            return Err(invalid(
                "code_length",
                format!("must be between 1 and {MAX_CODE_LENGTH}"),
            ));
        }
        codes.body_length = length;
    }
    if let Some(ref prefix) = profile.voucher_prefix {
        codes.default_prefix = prefix.trim().to_owned();
    }
    if let Some(ref delimiter) = profile.delimiter {
        settings.delimiter = parse_delimiter(delimiter)?;
    }
    Ok(settings)
}

pub fn profile_tls(profile: &Profile) -> TlsVerification {
    if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build a `ConsoleConfig` from a profile, no flag overrides.
pub fn profile_to_console_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ConsoleConfig, ConfigError> {
    let url = parse_backend_url(&profile.backend)?;
    let settings = profile_settings(profile)?;
    let api_key = resolve_api_key(profile, profile_name)?;

    Ok(ConsoleConfig {
        url,
        api_key,
        tls: profile_tls(profile),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        settings,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    #[test]
    fn loads_profiles_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "shop"

[defaults]
timeout = 10

[profiles.shop]
backend = "https://billing.example.com"
voucher_prefix = "SHOP"
code_length = 8
delimiter = ";"
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("shop"));
        assert_eq!(cfg.defaults.timeout, 10);
        assert_eq!(cfg.defaults.output, "table");

        let shop = &cfg.profiles["shop"];
        assert_eq!(shop.backend, "https://billing.example.com");
        assert_eq!(shop.code_length, Some(8));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.profiles.is_empty());
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles
            .insert("b".into(), Profile::new("https://b.example.com"));
        cfg.profiles
            .insert("a".into(), Profile::new("https://a.example.com"));
        save_config_to(&cfg, &path).unwrap();

        let back = load_config_from(&path).unwrap();
        assert_eq!(back.profile_names(), ["a", "b"]);
        assert_eq!(back.profiles["a"], cfg.profiles["a"]);
    }

    #[test]
    fn profile_settings_override_defaults() {
        let profile = Profile {
            voucher_prefix: Some(" SHOP ".into()),
            code_length: Some(8),
            code_charset: Some("ABC123".into()),
            delimiter: Some("\\t".into()),
            ..Profile::new("https://billing.example.com")
        };
        let settings = profile_settings(&profile).unwrap();
        assert_eq!(settings.codes.default_prefix, "SHOP");
        assert_eq!(settings.codes.body_length, 8);
        assert_eq!(settings.codes.charset.as_str(), "ABC123");
        assert_eq!(settings.delimiter, '\t');
    }

    #[test]
    fn bad_settings_name_the_field() {
        let bad_charset = Profile {
            code_charset: Some("AB_".into()),
            ..Profile::default()
        };
        assert!(matches!(
            profile_settings(&bad_charset),
            Err(ConfigError::Validation { ref field, .. }) if field == "code_charset"
        ));

        let bad_length = Profile {
            code_length: Some(0),
            ..Profile::default()
        };
        assert!(matches!(
            profile_settings(&bad_length),
            Err(ConfigError::Validation { ref field, .. }) if field == "code_length"
        ));

        assert!(parse_delimiter("\"").is_err());
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_backend_url("ftp://example.com").is_err());
    }

    #[test]
    fn console_config_from_env_key() {
        // PATH is always set, so resolution stops at the env step.
        let profile = Profile {
            api_key_env: Some("PATH".into()),
            insecure: Some(true),
            timeout: Some(5),
            ..Profile::new("https://billing.example.com/api")
        };
        let cfg = profile_to_console_config(&profile, "shop").unwrap();

        assert_eq!(cfg.url.as_str(), "https://billing.example.com/api");
        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(
            cfg.api_key.expose_secret(),
            std::env::var("PATH").unwrap()
        );
    }

    #[test]
    fn tls_prefers_insecure_then_ca() {
        let mut profile = Profile {
            ca_cert: Some("/etc/tollgate/ca.pem".into()),
            ..Profile::default()
        };
        assert_eq!(
            profile_tls(&profile),
            TlsVerification::CustomCa("/etc/tollgate/ca.pem".into())
        );
        profile.insecure = Some(true);
        assert_eq!(profile_tls(&profile), TlsVerification::DangerAcceptInvalid);
        assert_eq!(
            profile_tls(&Profile::default()),
            TlsVerification::SystemDefaults
        );
    }
}
