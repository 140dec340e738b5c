use std::sync::Arc;

use anyhow::Context;

pub mod auth;
pub mod config;
pub mod error;
pub mod google;
pub mod mcp;

pub use crate::config::Config;
pub use crate::error::{AuthError, Error, RemoteError, StorageError};

use crate::auth::CredentialManager;
use crate::google::GoogleWorkspace;
use crate::mcp::tools::ToolRegistry;
use crate::mcp::McpService;

/// Wire the dispatcher from the environment and serve stdio until EOF.
pub async fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    log::info!(
        "Starting {} v{} ({:?} auth, credential file {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.auth_mode,
        config.token_path.display()
    );

    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let credentials = Arc::new(CredentialManager::from_config(&config, http.clone()));
    let backend = Arc::new(GoogleWorkspace::new(http));
    let service = McpService::new(ToolRegistry::new(credentials, backend));

    mcp::serve_stdio(&service)
        .await
        .context("stdio transport failed")?;
    Ok(())
}
