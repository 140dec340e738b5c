//! Authorized HTTP handle for a single remote call.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::ops::{RequestSpec, Service};
use crate::error::RemoteError;

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: Option<GoogleErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: Option<String>,
    status: Option<String>,
}

/// Bearer-authorized view of one service. Built per invocation so a
/// refreshed access token is always the one sent.
pub struct ServiceHandle<'a> {
    http: &'a Client,
    service: Service,
    access_token: &'a str,
}

impl<'a> ServiceHandle<'a> {
    pub fn new(http: &'a Client, service: Service, access_token: &'a str) -> Self {
        Self {
            http,
            service,
            access_token,
        }
    }

    pub async fn send(&self, spec: RequestSpec) -> Result<Value, RemoteError> {
        let label = self.service.label();
        log::debug!("{} {} {}", label, spec.method, spec.url.path());

        let mut request = self
            .http
            .request(spec.method, spec.url)
            .bearer_auth(self.access_token);
        if let Some(body) = spec.body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| RemoteError::Transport {
                service: label,
                source,
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| RemoteError::Transport {
                service: label,
                source,
            })?;

        if !status.is_success() {
            return Err(RemoteError::Api {
                service: label,
                status: status.as_u16(),
                message: describe_api_error(&body),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&body).map_err(|err| RemoteError::Decode {
            service: label,
            reason: err.to_string(),
        })
    }
}

/// Pull `error.message` out of a Google error envelope, falling back to the raw body.
pub fn describe_api_error(body: &str) -> String {
    match serde_json::from_str::<GoogleErrorBody>(body) {
        Ok(GoogleErrorBody {
            error: Some(detail),
        }) => match (detail.message, detail.status) {
            (Some(message), _) if !message.is_empty() => message,
            (_, Some(status)) => status,
            _ => body.trim().to_string(),
        },
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_error_message_is_extracted() {
        let body = r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;
        assert_eq!(describe_api_error(body), "Requested entity was not found.");
    }

    #[test]
    fn test_status_used_when_message_missing() {
        let body = r#"{"error":{"code":403,"status":"PERMISSION_DENIED"}}"#;
        assert_eq!(describe_api_error(body), "PERMISSION_DENIED");
    }

    #[test]
    fn test_non_json_body_is_passed_through() {
        assert_eq!(describe_api_error("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(describe_api_error(""), "empty response body");
    }
}
