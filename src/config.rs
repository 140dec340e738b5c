//! Environment-driven configuration, loaded once at process start.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub const CLIENT_SECRET_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const TOKEN_PATH_ENV: &str = "GSHEETS_TOKEN_PATH";
pub const AUTH_MODE_ENV: &str = "GSHEETS_AUTH_MODE";
pub const SUBJECT_ENV: &str = "GSHEETS_SUBJECT";
pub const CONSENT_TIMEOUT_ENV: &str = "GSHEETS_CONSENT_TIMEOUT_SECS";

const DEFAULT_CLIENT_SECRET: &str = "credentials.json";
const TOKEN_FILE_NAME: &str = "token.json";
const DEFAULT_CONSENT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GSHEETS_AUTH_MODE must be 'interactive' or 'headless', got '{0}'")]
    AuthMode(String),
    #[error("GSHEETS_CONSENT_TIMEOUT_SECS must be a whole number of seconds, got '{0}'")]
    ConsentTimeout(String),
}

/// How a fresh credential is obtained when none can be reused or refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Browser consent with a loopback redirect.
    Interactive,
    /// Service-account JWT bearer grant, no user interaction.
    Headless,
}

impl AuthMode {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "interactive" => Ok(Self::Interactive),
            "headless" | "service_account" => Ok(Self::Headless),
            _ => Err(ConfigError::AuthMode(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Client-secret file in interactive mode, service-account key in headless mode.
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    pub auth_mode: AuthMode,
    pub subject: Option<String>,
    pub consent_timeout: Duration,
}

impl Config {
    /// Read configuration from the process environment (after `.env`, if any).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials_path = lookup(CLIENT_SECRET_ENV)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CLIENT_SECRET));

        let token_path = lookup(TOKEN_PATH_ENV)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_token_path);

        let auth_mode = match lookup(AUTH_MODE_ENV) {
            Some(raw) => AuthMode::parse(&raw)?,
            None => AuthMode::Interactive,
        };

        let subject = lookup(SUBJECT_ENV).filter(|value| !value.trim().is_empty());

        let consent_timeout = match lookup(CONSENT_TIMEOUT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::ConsentTimeout(raw.clone()))?,
            None => DEFAULT_CONSENT_TIMEOUT_SECS,
        };

        Ok(Self {
            credentials_path,
            token_path,
            auth_mode,
            subject,
            consent_timeout: Duration::from_secs(consent_timeout),
        })
    }
}

/// `token.json` beside the running executable, falling back to the working directory.
fn default_token_path() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(TOKEN_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.credentials_path, PathBuf::from("credentials.json"));
        assert!(config.token_path.ends_with("token.json"));
        assert_eq!(config.auth_mode, AuthMode::Interactive);
        assert!(config.subject.is_none());
        assert_eq!(config.consent_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (CLIENT_SECRET_ENV, "/etc/gsheets/sa.json"),
            (TOKEN_PATH_ENV, "/var/lib/gsheets/token.json"),
            (AUTH_MODE_ENV, "Headless"),
            (SUBJECT_ENV, "ops@example.com"),
            (CONSENT_TIMEOUT_ENV, "45"),
        ]))
        .unwrap();

        assert_eq!(config.credentials_path, PathBuf::from("/etc/gsheets/sa.json"));
        assert_eq!(config.token_path, PathBuf::from("/var/lib/gsheets/token.json"));
        assert_eq!(config.auth_mode, AuthMode::Headless);
        assert_eq!(config.subject.as_deref(), Some("ops@example.com"));
        assert_eq!(config.consent_timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_unknown_auth_mode_rejected() {
        let err = Config::from_lookup(lookup_from(&[(AUTH_MODE_ENV, "kiosk")])).unwrap_err();
        assert!(matches!(err, ConfigError::AuthMode(mode) if mode == "kiosk"));
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let err =
            Config::from_lookup(lookup_from(&[(CONSENT_TIMEOUT_ENV, "five")])).unwrap_err();
        assert!(matches!(err, ConfigError::ConsentTimeout(_)));
    }
}
