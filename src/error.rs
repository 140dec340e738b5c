//! Error taxonomy shared by the credential manager, the remote backend and
//! the tool dispatcher.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while obtaining or refreshing a credential.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("client secret file {path} is unusable: {reason}")]
    ClientSecret { path: PathBuf, reason: String },
    #[error("service account key {path} is unusable: {reason}")]
    ServiceAccount { path: PathBuf, reason: String },
    #[error("consent was not granted: {0}")]
    ConsentDenied(String),
    #[error("no consent received within {0} seconds")]
    ConsentTimeout(u64),
    #[error("interactive consent is not available: {0}")]
    InteractionUnavailable(String),
    #[error("failed to start the OAuth callback listener: {0}")]
    Callback(#[source] std::io::Error),
    #[error("token endpoint rejected the request: {0}")]
    TokenExchange(String),
    #[error("token endpoint request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Failures reading or writing the persisted credential.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read credential file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write credential file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode credential: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Failures reported by (or while talking to) Sheets, Forms or Drive.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{service} API returned {status}: {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },
    #[error("{service} API request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected {service} API response: {reason}")]
    Decode {
        service: &'static str,
        reason: String,
    },
    #[error("form {form_id} was created but its description could not be set: {source}")]
    FormDescription {
        form_id: String,
        #[source]
        source: Box<RemoteError>,
    },
}

/// Any failure that ends a tool invocation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("authorization failed: {0}")]
    Auth(#[from] AuthError),
    #[error("credential storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}
