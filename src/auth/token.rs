//! Token endpoint exchanges: authorization code, refresh token, JWT bearer.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use super::credential::Credential;
use crate::error::AuthError;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

/// Exchanges a refresh token for a new access token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError>;
}

/// HTTP client for the OAuth 2.0 token endpoint.
#[derive(Clone)]
pub struct OAuthClient {
    http: Client,
}

impl OAuthClient {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    pub async fn exchange_code(
        &self,
        token_uri: &str,
        client_id: &str,
        client_secret: Option<&str>,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AuthError> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("client_id", client_id),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", redirect_uri),
        ];
        if let Some(secret) = client_secret {
            params.push(("client_secret", secret));
        }
        self.post_form(token_uri, &params).await
    }

    pub async fn exchange_assertion(
        &self,
        token_uri: &str,
        assertion: &str,
    ) -> Result<TokenResponse, AuthError> {
        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion)];
        self.post_form(token_uri, &params).await
    }

    async fn post_form(
        &self,
        token_uri: &str,
        params: &[(&str, &str)],
    ) -> Result<TokenResponse, AuthError> {
        let response = self
            .http
            .post(token_uri)
            .form(params)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchange(describe_token_error(
                status.as_u16(),
                &body,
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(AuthError::Transport)
    }
}

#[async_trait]
impl TokenRefresher for OAuthClient {
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::TokenExchange("no refresh token stored".to_string()))?;
        let client_id = credential
            .client_id
            .as_deref()
            .ok_or_else(|| AuthError::TokenExchange("no client id stored".to_string()))?;

        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
        ];
        if let Some(secret) = credential.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }

        let response = self.post_form(&credential.token_uri, &params).await?;
        Ok(credential.refreshed(response, Utc::now()))
    }
}

/// Render Google's `{"error": ..., "error_description": ...}` body.
pub fn describe_token_error(status: u16, body: &str) -> String {
    let parsed: TokenErrorBody = serde_json::from_str(body).unwrap_or_default();
    match (parsed.error, parsed.error_description) {
        (Some(error), Some(description)) => format!("{} {}: {}", status, error, description),
        (Some(error), None) => format!("{} {}", status, error),
        _ if body.trim().is_empty() => format!("HTTP {}", status),
        _ => format!("{} {}", status, body.trim()),
    }
}
