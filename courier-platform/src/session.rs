//! Session flows: thin call sites over the engine's public contract.
//!
//! Each flow builds an [`HttpRequest`], enqueues it, and finishes inside the
//! drain callback on the host's own thread. Transport and HTTP failures
//! arrive as [`PlatformError::Request`]; missing or invalid payload fields
//! are detected here and arrive as [`PlatformError::Payload`].

use std::sync::Arc;

use courier_http_client::{HttpEngine, HttpRequest, HttpResponse, OAuthCredentials};
use courier_queue::{Handle, QueueResult, Request};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::debug;

use crate::env::Credentials;
use crate::error::{PlatformError, Result};
use crate::query;

/// An OAuth token/secret pair obtained from a session flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenPair {
    /// The token.
    pub token: String,
    /// The token secret.
    pub secret: String,
}

fn check_request(response: &HttpResponse) -> Result<()> {
    match &response.error {
        Some(error) => Err(PlatformError::Request(error.clone())),
        None => Ok(()),
    }
}

fn text_body(response: &HttpResponse) -> Result<&str> {
    response
        .text()
        .ok_or_else(|| PlatformError::Payload("empty response body".to_string()))
}

/// Client-side session: user login and token authorization.
pub struct UserSession {
    base_url: String,
    credentials: Credentials,
    device_id: String,
    tokens: Arc<Mutex<Option<TokenPair>>>,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    success: bool,
    oauth_token: String,
    oauth_secret: String,
}

#[derive(Debug, Deserialize)]
struct AuthorizePayload {
    success: bool,
    oauth_verifier: String,
}

impl UserSession {
    /// Create a session against the given base endpoint.
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            device_id: device_id.into(),
            tokens: Arc::new(Mutex::new(None)),
        }
    }

    /// The token pair obtained by a completed login, if any.
    pub fn tokens(&self) -> Option<TokenPair> {
        self.tokens.lock().clone()
    }

    /// Start a login exchange.
    ///
    /// On success the session stores the returned token pair before the
    /// completion callback fires. The callback runs during a later
    /// [`drain`](courier_queue::Engine::drain) on the host's thread.
    pub fn login(
        &self,
        engine: &HttpEngine,
        username: &str,
        password: &str,
        on_complete: impl FnOnce(Result<()>) + Send + 'static,
    ) -> QueueResult<Handle> {
        let url = format!("{}/session", self.base_url);
        let body = query::query_string([
            ("username", username),
            ("password", password),
            ("device_id", self.device_id.as_str()),
        ]);

        let request = HttpRequest::post(url)
            .header("Accept", "application/json")
            .form_body(body);

        let tokens = Arc::clone(&self.tokens);
        engine.enqueue(Request::new(request).on_complete(move |response| {
            on_complete(Self::finish_login(response.output(), &tokens));
        }))
    }

    fn finish_login(response: &HttpResponse, tokens: &Mutex<Option<TokenPair>>) -> Result<()> {
        check_request(response)?;
        let payload: LoginPayload = serde_json::from_str(text_body(response)?)
            .map_err(|e| PlatformError::Payload(e.to_string()))?;

        if !payload.success {
            return Err(PlatformError::Payload("success is false".to_string()));
        }

        debug!("login succeeded");
        *tokens.lock() = Some(TokenPair {
            token: payload.oauth_token,
            secret: payload.oauth_secret,
        });
        Ok(())
    }

    /// Ask the platform to authorize a token, yielding the verifier.
    ///
    /// Signs with the session's consumer credentials and the token pair
    /// stored by [`login`](UserSession::login).
    pub fn authorize_token(
        &self,
        engine: &HttpEngine,
        token: &str,
        on_complete: impl FnOnce(Result<String>) + Send + 'static,
    ) -> QueueResult<Handle> {
        let url = format!("{}/oauth/authorize", self.base_url);
        let session_tokens = self.tokens().unwrap_or_default();
        let body = query::query_string([
            ("authorize", "1"),
            ("device_id", self.device_id.as_str()),
            ("oauth_token", token),
        ]);

        // A GET body travels as the query string and is covered by the
        // signature.
        let request = HttpRequest::get(url).form_body(body).oauth(OAuthCredentials::new(
            self.credentials.consumer_key.clone(),
            self.credentials.consumer_secret.clone(),
            session_tokens.token,
            session_tokens.secret,
        ));

        engine.enqueue(Request::new(request).on_complete(move |response| {
            on_complete(Self::finish_authorize(response.output()));
        }))
    }

    fn finish_authorize(response: &HttpResponse) -> Result<String> {
        check_request(response)?;
        let payload: AuthorizePayload = serde_json::from_str(text_body(response)?)
            .map_err(|e| PlatformError::Payload(e.to_string()))?;

        if !payload.success {
            return Err(PlatformError::Payload("success is false".to_string()));
        }
        Ok(payload.oauth_verifier)
    }
}

/// Server-side session: temporary-credential and token-request exchanges.
///
/// Both flows respond with `application/x-www-form-urlencoded` bodies; any
/// other content type is rejected before parsing.
pub struct ServiceSession {
    base_url: String,
    credentials: Credentials,
    device_id: String,
    tokens: Arc<Mutex<Option<TokenPair>>>,
}

impl ServiceSession {
    /// Create a session against the given base endpoint.
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            device_id: device_id.into(),
            tokens: Arc::new(Mutex::new(None)),
        }
    }

    /// The token pair obtained from the last completed exchange, if any.
    pub fn tokens(&self) -> Option<TokenPair> {
        self.tokens.lock().clone()
    }

    /// Request temporary credentials (signed without a token).
    pub fn request_temporary_credential(
        &self,
        engine: &HttpEngine,
        on_complete: impl FnOnce(Result<()>) + Send + 'static,
    ) -> QueueResult<Handle> {
        let url = format!("{}/request_temporary_credential", self.base_url);
        self.token_exchange(engine, url, TokenPair::default(), on_complete)
    }

    /// Exchange the temporary credentials for a token (signed with the
    /// stored pair).
    pub fn request_token(
        &self,
        engine: &HttpEngine,
        on_complete: impl FnOnce(Result<()>) + Send + 'static,
    ) -> QueueResult<Handle> {
        let url = format!("{}/request_token", self.base_url);
        let tokens = self.tokens().unwrap_or_default();
        self.token_exchange(engine, url, tokens, on_complete)
    }

    fn token_exchange(
        &self,
        engine: &HttpEngine,
        url: String,
        signing_tokens: TokenPair,
        on_complete: impl FnOnce(Result<()>) + Send + 'static,
    ) -> QueueResult<Handle> {
        let body = query::query_string([("device_id", self.device_id.as_str())]);
        let request = HttpRequest::get(url).form_body(body).oauth(OAuthCredentials::new(
            self.credentials.consumer_key.clone(),
            self.credentials.consumer_secret.clone(),
            signing_tokens.token,
            signing_tokens.secret,
        ));

        let tokens = Arc::clone(&self.tokens);
        engine.enqueue(Request::new(request).on_complete(move |response| {
            on_complete(Self::finish_token_exchange(response.output(), &tokens));
        }))
    }

    fn finish_token_exchange(
        response: &HttpResponse,
        tokens: &Mutex<Option<TokenPair>>,
    ) -> Result<()> {
        check_request(response)?;

        let content_type = response
            .content_type()
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            .unwrap_or_default();
        if content_type != "application/x-www-form-urlencoded" {
            return Err(PlatformError::Payload(format!(
                "invalid content-type: {content_type}"
            )));
        }

        let pair = parse_form_tokens(text_body(response)?).ok_or_else(|| {
            PlatformError::Payload("missing fields from server response".to_string())
        })?;

        debug!("token exchange succeeded");
        *tokens.lock() = Some(pair);
        Ok(())
    }
}

/// Pull `oauth_token` and `oauth_token_secret` out of a form-encoded body.
fn parse_form_tokens(body: &str) -> Option<TokenPair> {
    let mut token = None;
    let mut secret = None;

    for pair in body.split('&') {
        let mut parts = pair.splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some("oauth_token"), Some(value)) => token = Some(value.to_string()),
            (Some("oauth_token_secret"), Some(value)) => secret = Some(value.to_string()),
            _ => {}
        }
    }

    match (token, secret) {
        (Some(token), Some(secret)) => Some(TokenPair { token, secret }),
        _ => None,
    }
}
