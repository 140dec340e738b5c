//! Google OAuth client-secret file (`credentials.json`), as downloaded from the
//! Cloud console for "Desktop app" or "Web application" clients.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{DEFAULT_AUTH_URI, DEFAULT_TOKEN_URI};
use crate::error::AuthError;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let raw = fs::read_to_string(path).map_err(|err| AuthError::ClientSecret {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Self::parse(path, &raw)
    }

    pub fn parse(path: &Path, raw: &str) -> Result<Self, AuthError> {
        let invalid = |reason: String| AuthError::ClientSecret {
            path: path.to_path_buf(),
            reason,
        };

        let file: ClientSecretFile =
            serde_json::from_str(raw).map_err(|err| invalid(err.to_string()))?;

        let secret = file
            .installed
            .or(file.web)
            .ok_or_else(|| invalid("expected an 'installed' or 'web' section".to_string()))?;

        if secret.client_id.trim().is_empty() {
            return Err(invalid("client_id is empty".to_string()));
        }
        Ok(secret)
    }
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}
