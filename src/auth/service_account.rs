//! Headless credential minting from a service-account key (JWT bearer grant).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::credential::{ClientIdentity, Credential};
use super::token::OAuthClient;
use super::{ConsentFlow, DEFAULT_TOKEN_URI};
use crate::error::AuthError;

const ASSERTION_LIFETIME_SECONDS: i64 = 60 * 60; // Google's maximum

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: Option<String>,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// Claims of the signed assertion sent to the token endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

impl ServiceAccountKey {
    pub fn parse(path: &Path, raw: &str) -> Result<Self, AuthError> {
        let key: Self = serde_json::from_str(raw).map_err(|err| AuthError::ServiceAccount {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        if key.key_type.as_deref() != Some("service_account") {
            return Err(AuthError::ServiceAccount {
                path: path.to_path_buf(),
                reason: "key file is not of type 'service_account'".to_string(),
            });
        }
        Ok(key)
    }

    pub fn claims(
        &self,
        scopes: &[&str],
        subject: Option<&str>,
        now: DateTime<Utc>,
    ) -> AssertionClaims {
        let iat = now.timestamp();
        AssertionClaims {
            iss: self.client_email.clone(),
            scope: scopes.join(" "),
            aud: self.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECONDS,
            sub: subject.map(str::to_string),
        }
    }

    pub fn sign(&self, claims: &AssertionClaims) -> Result<String, jsonwebtoken::errors::Error> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        encode(&header, claims, &key)
    }
}

pub struct HeadlessFlow {
    key_path: PathBuf,
    subject: Option<String>,
    oauth: OAuthClient,
}

impl HeadlessFlow {
    pub fn new(key_path: PathBuf, subject: Option<String>, oauth: OAuthClient) -> Self {
        Self {
            key_path,
            subject,
            oauth,
        }
    }

    fn load_key(&self) -> Result<ServiceAccountKey, AuthError> {
        match fs::read_to_string(&self.key_path) {
            Ok(raw) => ServiceAccountKey::parse(&self.key_path, &raw),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(AuthError::InteractionUnavailable(format!(
                    "headless mode needs a service account key at {}",
                    self.key_path.display()
                )))
            }
            Err(err) => Err(AuthError::ServiceAccount {
                path: self.key_path.clone(),
                reason: err.to_string(),
            }),
        }
    }
}

#[async_trait]
impl ConsentFlow for HeadlessFlow {
    async fn obtain(&self, scopes: &[&str]) -> Result<Credential, AuthError> {
        let key = self.load_key()?;
        let now = Utc::now();
        let claims = key.claims(scopes, self.subject.as_deref(), now);
        let assertion = key.sign(&claims).map_err(|err| AuthError::ServiceAccount {
            path: self.key_path.clone(),
            reason: format!("failed to sign assertion: {}", err),
        })?;

        log::info!("Requesting access token for service account {}", key.client_email);
        let response = self.oauth.exchange_assertion(&key.token_uri, &assertion).await?;

        let identity = ClientIdentity {
            token_uri: &key.token_uri,
            client_id: None,
            client_secret: None,
        };
        Ok(Credential::issued(response, scopes, identity, now))
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}
