//! Loopback HTTP listener that receives the OAuth redirect.
//!
//! Binds `127.0.0.1` on an OS-assigned port, serves `GET /` and hands the
//! first callback carrying the expected `state` back to the waiting flow.

use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::oneshot;

use crate::error::AuthError;

const SUCCESS_PAGE: &str = "<html><body><h1>Authentication complete</h1>\
    <p>You can close this window and return to your assistant.</p></body></html>";
const DENIED_PAGE: &str = "<html><body><h1>Authentication was not completed</h1>\
    <p>Access was not granted. You can close this window.</p></body></html>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(String),
    Denied(String),
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Shared between the listener's handler and the waiting flow.
pub struct CallbackState {
    expected_state: String,
    sender: Mutex<Option<oneshot::Sender<CallbackOutcome>>>,
}

impl CallbackState {
    pub fn new(expected_state: String, sender: oneshot::Sender<CallbackOutcome>) -> Self {
        Self {
            expected_state,
            sender: Mutex::new(Some(sender)),
        }
    }

    /// Decide what a redirect means. `Err` leaves the flow waiting.
    pub fn classify(&self, query: &CallbackQuery) -> Result<CallbackOutcome, &'static str> {
        if query.state.as_deref() != Some(self.expected_state.as_str()) {
            return Err("state parameter does not match this sign-in attempt");
        }
        if let Some(error) = &query.error {
            let reason = match &query.error_description {
                Some(description) => format!("{}: {}", error, description),
                None => error.clone(),
            };
            return Ok(CallbackOutcome::Denied(reason));
        }
        match &query.code {
            Some(code) if !code.is_empty() => Ok(CallbackOutcome::Code(code.clone())),
            _ => Err("authorization code is missing"),
        }
    }

    fn deliver(&self, outcome: CallbackOutcome) {
        if let Some(sender) = self.sender.lock().take() {
            let _ = sender.send(outcome);
        }
    }
}

/// GET / handler for the OAuth redirect.
pub async fn oauth_callback(
    state: web::Data<CallbackState>,
    query: web::Query<CallbackQuery>,
) -> impl Responder {
    match state.classify(&query) {
        Ok(outcome) => {
            let page = match outcome {
                CallbackOutcome::Code(_) => SUCCESS_PAGE,
                CallbackOutcome::Denied(_) => DENIED_PAGE,
            };
            state.deliver(outcome);
            HttpResponse::Ok().content_type("text/html").body(page)
        }
        Err(reason) => {
            log::warn!("Ignoring OAuth callback: {}", reason);
            HttpResponse::BadRequest().body(reason)
        }
    }
}

/// Configure callback routes.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(oauth_callback)));
}

/// A running loopback listener. Must be started inside an actix system.
pub struct CallbackServer {
    port: u16,
    handle: ServerHandle,
    receiver: oneshot::Receiver<CallbackOutcome>,
}

impl CallbackServer {
    pub fn start(expected_state: String) -> Result<Self, AuthError> {
        let (sender, receiver) = oneshot::channel();
        let state = web::Data::new(CallbackState::new(expected_state, sender));

        let server = HttpServer::new(move || App::new().app_data(state.clone()).configure(config))
            .workers(1)
            .disable_signals()
            .bind(("127.0.0.1", 0))
            .map_err(AuthError::Callback)?;

        let port = server
            .addrs()
            .first()
            .map(|addr| addr.port())
            .ok_or_else(|| {
                AuthError::Callback(std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "listener has no bound address",
                ))
            })?;

        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        log::debug!("OAuth callback listener bound to 127.0.0.1:{}", port);
        Ok(Self {
            port,
            handle,
            receiver,
        })
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/", self.port)
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }

    /// Wait for the redirect, then shut the listener down.
    pub async fn wait(self, timeout: Duration) -> Result<CallbackOutcome, AuthError> {
        let result = tokio::time::timeout(timeout, self.receiver).await;
        self.handle.stop(false).await;

        match result {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(_)) => Err(AuthError::ConsentDenied(
                "callback listener closed before a response arrived".to_string(),
            )),
            Err(_) => Err(AuthError::ConsentTimeout(timeout.as_secs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test as actix_test;

    fn callback_state(expected: &str) -> (CallbackState, oneshot::Receiver<CallbackOutcome>) {
        let (sender, receiver) = oneshot::channel();
        (CallbackState::new(expected.to_string(), sender), receiver)
    }

    #[test]
    fn test_classify_accepts_matching_state() {
        let (state, _rx) = callback_state("s1");
        let query = CallbackQuery {
            code: Some("4/abc".to_string()),
            state: Some("s1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            state.classify(&query),
            Ok(CallbackOutcome::Code("4/abc".to_string()))
        );
    }

    #[test]
    fn test_classify_rejects_foreign_state() {
        let (state, _rx) = callback_state("s1");
        let query = CallbackQuery {
            code: Some("4/abc".to_string()),
            state: Some("other".to_string()),
            ..Default::default()
        };
        assert!(state.classify(&query).is_err());
    }

    #[test]
    fn test_classify_reports_denial() {
        let (state, _rx) = callback_state("s1");
        let query = CallbackQuery {
            state: Some("s1".to_string()),
            error: Some("access_denied".to_string()),
            ..Default::default()
        };
        assert_eq!(
            state.classify(&query),
            Ok(CallbackOutcome::Denied("access_denied".to_string()))
        );
    }

    #[actix_web::test]
    async fn test_callback_route_delivers_code() {
        let (state, receiver) = callback_state("xyz");
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(config),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/?state=xyz&code=4%2Fabc&scope=email")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        assert_eq!(
            receiver.await.unwrap(),
            CallbackOutcome::Code("4/abc".to_string())
        );
    }

    #[actix_web::test]
    async fn test_callback_route_rejects_wrong_state() {
        let (state, _receiver) = callback_state("xyz");
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(config),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/?state=nope&code=abc")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_listener_times_out_without_redirect() {
        let server = CallbackServer::start("never".to_string()).unwrap();
        assert!(server.redirect_uri().starts_with("http://127.0.0.1:"));

        let err = server.wait(Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, AuthError::ConsentTimeout(0)));
    }
}
