//! Credential lifecycle: load, reuse, refresh, or run a consent flow.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::credential::{Credential, Validity};
use super::interactive::InteractiveFlow;
use super::service_account::HeadlessFlow;
use super::store::{CredentialStore, LoadOutcome};
use super::token::{OAuthClient, TokenRefresher};
use super::{ConsentFlow, SCOPES};
use crate::config::{AuthMode, Config};
use crate::error::Error;

/// Anything that can hand out a usable credential.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn acquire(&self) -> Result<Credential, Error>;
}

pub struct CredentialManager {
    store: CredentialStore,
    refresher: Arc<dyn TokenRefresher>,
    flow: Arc<dyn ConsentFlow>,
    scopes: Vec<&'static str>,
    // Serializes refresh and consent so two callers never race on the file.
    lock: Mutex<()>,
}

impl CredentialManager {
    pub fn new(
        store: CredentialStore,
        refresher: Arc<dyn TokenRefresher>,
        flow: Arc<dyn ConsentFlow>,
    ) -> Self {
        Self {
            store,
            refresher,
            flow,
            scopes: SCOPES.to_vec(),
            lock: Mutex::new(()),
        }
    }

    /// Wire the manager the way the configured auth mode asks for.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        let oauth = OAuthClient::new(http);
        let flow: Arc<dyn ConsentFlow> = match config.auth_mode {
            AuthMode::Interactive => Arc::new(InteractiveFlow::new(
                config.credentials_path.clone(),
                oauth.clone(),
                config.consent_timeout,
            )),
            AuthMode::Headless => Arc::new(HeadlessFlow::new(
                config.credentials_path.clone(),
                config.subject.clone(),
                oauth.clone(),
            )),
        };

        Self::new(
            CredentialStore::new(config.token_path.clone()),
            Arc::new(oauth),
            flow,
        )
    }

    pub async fn acquire(&self) -> Result<Credential, Error> {
        let _guard = self.lock.lock().await;
        let path = self.store.path().display().to_string();

        let stored = match self.store.load()? {
            LoadOutcome::Loaded(credential) => Some(credential),
            LoadOutcome::Missing => {
                log::info!("No stored credential at {}", path);
                None
            }
            LoadOutcome::Corrupt(reason) => {
                log::warn!("Discarding unreadable credential file {}: {}", path, reason);
                None
            }
        };

        if let Some(credential) = stored {
            match credential.check(&self.scopes, Utc::now()) {
                Validity::Valid => return Ok(credential),
                Validity::Expired if credential.can_refresh() => {
                    log::info!("Access token expired, refreshing");
                    let refreshed = self.refresher.refresh(&credential).await?;
                    self.store.save(&refreshed)?;
                    log::info!("Access token refreshed (valid until {})", refreshed.expiry);
                    return Ok(refreshed);
                }
                Validity::Expired => {
                    log::info!("Access token expired and cannot be refreshed");
                }
                Validity::Invalid(reason) => {
                    log::warn!("Stored credential cannot be reused: {}", reason);
                }
            }
        }

        log::info!("Requesting a new credential");
        let credential = self.flow.obtain(&self.scopes).await?;
        self.store.save(&credential)?;
        log::info!("Credential stored at {}", path);
        Ok(credential)
    }
}

#[async_trait]
impl CredentialSource for CredentialManager {
    async fn acquire(&self) -> Result<Credential, Error> {
        CredentialManager::acquire(self).await
    }
}
