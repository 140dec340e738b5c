//! Google Workspace remote surface (Sheets, Forms, Drive).
//!
//! Tools describe what they want as a [`RemoteOp`]; a [`RemoteBackend`]
//! carries it out with a credential and hands back the raw JSON response.

pub mod handle;
pub mod ops;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::auth::Credential;
use crate::error::RemoteError;

pub use handle::ServiceHandle;
pub use ops::{Endpoints, RemoteOp, RequestSpec, Service};

#[async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn execute(&self, credential: &Credential, op: &RemoteOp) -> Result<Value, RemoteError>;
}

/// REST implementation of [`RemoteBackend`].
pub struct GoogleWorkspace {
    http: Client,
    endpoints: Endpoints,
}

impl GoogleWorkspace {
    pub fn new(http: Client) -> Self {
        Self::with_endpoints(http, Endpoints::default())
    }

    pub fn with_endpoints(http: Client, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }
}

#[async_trait]
impl RemoteBackend for GoogleWorkspace {
    async fn execute(&self, credential: &Credential, op: &RemoteOp) -> Result<Value, RemoteError> {
        let handle = ServiceHandle::new(&self.http, op.service(), &credential.access_token);
        let created = handle.send(op.request(&self.endpoints)?).await?;

        if let RemoteOp::CreateForm {
            description: Some(description),
            ..
        } = op
        {
            if !description.is_empty() {
                let form_id = created
                    .get("formId")
                    .and_then(Value::as_str)
                    .ok_or_else(|| RemoteError::Decode {
                        service: Service::Forms.label(),
                        reason: "forms.create response has no formId".to_string(),
                    })?;
                let spec = ops::form_description_request(&self.endpoints, form_id, description)?;
                if let Err(err) = handle.send(spec).await {
                    log::warn!("Form {} created without its description: {}", form_id, err);
                    return Err(RemoteError::FormDescription {
                        form_id: form_id.to_string(),
                        source: Box::new(err),
                    });
                }
            }
        }

        Ok(created)
    }
}
