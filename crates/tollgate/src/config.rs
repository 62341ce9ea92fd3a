//! CLI configuration: thin wrapper around `tollgate_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--backend, --api-key, --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use tollgate_core::{ConsoleConfig, ConsoleSettings, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use tollgate_config::{
    Config, Defaults, Profile, config_path, load_config, load_config_or_default, save_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Translate a `Profile` + global flags into a `ConsoleConfig`.
///
/// Flags win over profile values, profile values over `[defaults]`.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<ConsoleConfig, CliError> {
    let url_str = global.backend.as_deref().unwrap_or(&profile.backend);
    let url = tollgate_config::parse_backend_url(url_str)?;

    let api_key = match global.api_key {
        Some(ref key) => SecretString::from(key.clone()),
        None => tollgate_config::resolve_api_key(profile, profile_name)?,
    };

    let tls = if global.insecure || defaults.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        tollgate_config::profile_tls(profile)
    };

    let timeout = global
        .timeout
        .or(profile.timeout)
        .unwrap_or(defaults.timeout);

    Ok(ConsoleConfig {
        url,
        api_key,
        tls,
        timeout: Duration::from_secs(timeout),
        settings: tollgate_config::profile_settings(profile)?,
    })
}

/// Build a `ConsoleConfig` from the config file, profile, and CLI overrides.
///
/// Without a matching profile, `--backend` and `--api-key` alone suffice.
pub fn build_console_config(global: &GlobalOpts) -> Result<ConsoleConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg.defaults, global);
    }

    // An explicitly named profile must exist.
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        });
    }

    let url_str = global.backend.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let url = tollgate_config::parse_backend_url(url_str)?;

    let Some(ref key) = global.api_key else {
        return Err(CliError::NoCredentials {
            profile: profile_name,
        });
    };

    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(ConsoleConfig {
        url,
        api_key: SecretString::from(key.clone()),
        tls,
        timeout: Duration::from_secs(global.timeout.unwrap_or(cfg.defaults.timeout)),
        settings: ConsoleSettings::default(),
    })
}

/// Comma-separated profile names, or "(none)".
pub fn available_profiles(cfg: &Config) -> String {
    let names = cfg.profile_names();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}
