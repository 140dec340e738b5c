//! The persisted credential record.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::token::TokenResponse;
use super::DEFAULT_TOKEN_URI;

/// Bumped whenever the on-disk layout changes; older files are regenerated.
pub const CREDENTIAL_SCHEMA_VERSION: u32 = 1;

/// Tokens this close to expiry are treated as already expired.
pub const REFRESH_MARGIN_SECS: i64 = 300;

/// Access token plus everything needed to refresh it without the client-secret file.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub version: u32,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expiry: DateTime<Utc>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

/// Where a stored credential stands relative to the scopes the server needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
    Valid,
    /// Usable once refreshed.
    Expired,
    /// Cannot be reused or refreshed; a new consent is needed.
    Invalid(String),
}

/// OAuth client identity recorded alongside a credential for later refreshes.
#[derive(Debug, Clone, Copy)]
pub struct ClientIdentity<'a> {
    pub token_uri: &'a str,
    pub client_id: Option<&'a str>,
    pub client_secret: Option<&'a str>,
}

impl Credential {
    /// Build a credential from a fresh grant (consent or service account).
    pub fn issued(
        response: TokenResponse,
        requested_scopes: &[&str],
        client: ClientIdentity<'_>,
        now: DateTime<Utc>,
    ) -> Self {
        let scopes = match response.scope.as_deref() {
            Some(granted) => split_scopes(granted),
            None => requested_scopes.iter().map(|s| s.to_string()).collect(),
        };

        Self {
            version: CREDENTIAL_SCHEMA_VERSION,
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expiry: now + Duration::seconds(response.expires_in),
            scopes,
            token_uri: client.token_uri.to_string(),
            client_id: client.client_id.map(str::to_string),
            client_secret: client.client_secret.map(str::to_string),
        }
    }

    /// Apply a refresh response. Google omits the refresh token and scope when
    /// they are unchanged, so those are only replaced when present.
    pub fn refreshed(&self, response: TokenResponse, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.access_token = response.access_token;
        next.expiry = now + Duration::seconds(response.expires_in);
        if let Some(refresh_token) = response.refresh_token {
            next.refresh_token = Some(refresh_token);
        }
        if let Some(scope) = response.scope {
            next.scopes = split_scopes(&scope);
        }
        next
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry - Duration::seconds(REFRESH_MARGIN_SECS) <= now
    }

    pub fn covers(&self, required: &[&str]) -> bool {
        required
            .iter()
            .all(|scope| self.scopes.iter().any(|granted| granted == scope))
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
            && self.client_id.is_some()
    }

    pub fn check(&self, required: &[&str], now: DateTime<Utc>) -> Validity {
        if self.version != CREDENTIAL_SCHEMA_VERSION {
            return Validity::Invalid(format!("unsupported schema version {}", self.version));
        }
        if self.access_token.is_empty() {
            return Validity::Invalid("access token is empty".to_string());
        }
        if !self.covers(required) {
            return Validity::Invalid("granted scopes do not cover the required scopes".to_string());
        }
        if self.is_expired_at(now) {
            return Validity::Expired;
        }
        Validity::Valid
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("version", &self.version)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expiry", &self.expiry)
            .field("scopes", &self.scopes)
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

fn split_scopes(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}
