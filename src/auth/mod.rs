//! Google OAuth credential management.
//!
//! - `credential` - the persisted, versioned credential record
//! - `store` - atomic JSON persistence with an explicit corrupt branch
//! - `manager` - reuse / refresh / consent lifecycle
//! - `interactive` - browser consent with a loopback redirect
//! - `service_account` - headless JWT bearer grant

pub mod callback;
pub mod client_secret;
pub mod credential;
pub mod interactive;
pub mod manager;
pub mod pkce;
pub mod service_account;
pub mod store;
pub mod token;


use async_trait::async_trait;

pub use credential::{Credential, Validity};
pub use manager::{CredentialManager, CredentialSource};
pub use store::{CredentialStore, LoadOutcome};
pub use token::{OAuthClient, TokenRefresher, TokenResponse};

use crate::error::AuthError;

/// Edit spreadsheets, edit form bodies, list Drive files.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/forms.body",
    "https://www.googleapis.com/auth/drive.readonly",
];

pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Obtains a brand-new credential when nothing stored can be used.
#[async_trait]
pub trait ConsentFlow: Send + Sync {
    async fn obtain(&self, scopes: &[&str]) -> Result<Credential, AuthError>;
}
