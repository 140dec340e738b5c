//! Browser consent with a loopback redirect (installed-app flow).

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;

use super::callback::{CallbackOutcome, CallbackServer};
use super::client_secret::ClientSecret;
use super::credential::{ClientIdentity, Credential};
use super::pkce::{generate_pkce, generate_state};
use super::token::OAuthClient;
use super::ConsentFlow;
use crate::error::AuthError;

pub struct InteractiveFlow {
    client_secret_path: PathBuf,
    oauth: OAuthClient,
    timeout: Duration,
}

impl InteractiveFlow {
    pub fn new(client_secret_path: PathBuf, oauth: OAuthClient, timeout: Duration) -> Self {
        Self {
            client_secret_path,
            oauth,
            timeout,
        }
    }
}

/// Authorization URL asking for offline access so a refresh token is issued.
pub fn authorization_url(
    secret: &ClientSecret,
    redirect_uri: &str,
    scopes: &[&str],
    state: &str,
    challenge: &str,
) -> Result<Url, String> {
    let scope = scopes.join(" ");
    Url::parse_with_params(
        &secret.auth_uri,
        &[
            ("response_type", "code"),
            ("client_id", secret.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
            ("state", state),
            ("code_challenge", challenge),
            ("code_challenge_method", "S256"),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|err| format!("invalid auth_uri '{}': {}", secret.auth_uri, err))
}

#[async_trait]
impl ConsentFlow for InteractiveFlow {
    async fn obtain(&self, scopes: &[&str]) -> Result<Credential, AuthError> {
        let secret = ClientSecret::load(&self.client_secret_path)?;
        let pkce = generate_pkce();
        let state = generate_state();

        let server = CallbackServer::start(state.clone())?;
        let redirect_uri = server.redirect_uri();
        let url = match authorization_url(&secret, &redirect_uri, scopes, &state, &pkce.challenge)
        {
            Ok(url) => url,
            Err(reason) => {
                server.stop().await;
                return Err(AuthError::ClientSecret {
                    path: self.client_secret_path.clone(),
                    reason,
                });
            }
        };

        log::info!("Opening browser for Google consent");
        match open::that_detached(url.as_str()) {
            Ok(()) => log::info!("If the browser did not open, visit:\n{}", url),
            Err(err) => log::warn!(
                "Could not open a browser ({}). Visit this URL to continue:\n{}",
                err,
                url
            ),
        }

        let code = match server.wait(self.timeout).await? {
            CallbackOutcome::Code(code) => code,
            CallbackOutcome::Denied(reason) => return Err(AuthError::ConsentDenied(reason)),
        };

        log::info!("Exchanging authorization code for tokens");
        let response = self
            .oauth
            .exchange_code(
                &secret.token_uri,
                &secret.client_id,
                secret.client_secret.as_deref(),
                &code,
                &pkce.verifier,
                &redirect_uri,
            )
            .await?;

        let identity = ClientIdentity {
            token_uri: &secret.token_uri,
            client_id: Some(&secret.client_id),
            client_secret: secret.client_secret.as_deref(),
        };
        Ok(Credential::issued(response, scopes, identity, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_authorization_url_parameters() {
        let secret = ClientSecret {
            client_id: "client-1".to_string(),
            client_secret: Some("secret".to_string()),
            auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
        };

        let url = authorization_url(
            &secret,
            "http://127.0.0.1:8765/",
            &["scope.a", "scope.b"],
            "state-1",
            "challenge-1",
        )
        .unwrap();

        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(params["client_id"], "client-1");
        assert_eq!(params["redirect_uri"], "http://127.0.0.1:8765/");
        assert_eq!(params["scope"], "scope.a scope.b");
        assert_eq!(params["state"], "state-1");
        assert_eq!(params["code_challenge"], "challenge-1");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["access_type"], "offline");
        assert!(!params.contains_key("client_secret"));
    }
}
