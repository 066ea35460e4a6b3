//! Integration tests for courier-platform
//!
//! Each test drives a real engine (worker thread and all) against a mock
//! platform server, the way an embedding host would.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use courier_http_client::{HttpEngine, HttpProcessor};
use courier_platform::prelude::*;
use courier_queue::Engine;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_server() -> (Runtime, MockServer) {
    let runtime = Runtime::new().expect("tokio runtime");
    let server = runtime.block_on(MockServer::start());
    (runtime, server)
}

fn started_engine() -> HttpEngine {
    let mut engine = Engine::new(HttpProcessor::new().expect("processor"));
    engine.start().expect("engine start");
    engine
}

fn await_result<T>(engine: &HttpEngine, receiver: &mpsc::Receiver<T>) -> T {
    let start = Instant::now();
    loop {
        engine.drain();
        if let Ok(result) = receiver.try_recv() {
            return result;
        }
        assert!(
            start.elapsed() < Duration::from_secs(10),
            "timed out waiting for a session callback"
        );
        thread::sleep(Duration::from_millis(5));
    }
}

fn client_credentials() -> Credentials {
    Credentials::new("app-c", "consumer-key", "consumer-secret")
}

#[test]
fn login_stores_the_token_pair() {
    let (runtime, server) = mock_server();

    runtime.block_on(
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "{\"success\":true,\"oauth_token\":\"tok\",\"oauth_secret\":\"sec\"}",
            ))
            .expect(1)
            .mount(&server),
    );

    let engine = started_engine();
    let session = UserSession::new(server.uri(), client_credentials(), "device-1");

    let (sender, receiver) = mpsc::channel();
    session
        .login(&engine, "player", "hunter2", move |result| {
            let _ = sender.send(result);
        })
        .expect("enqueue login");

    let result = await_result(&engine, &receiver);
    assert_eq!(result, Ok(()));
    assert_eq!(
        session.tokens(),
        Some(TokenPair {
            token: "tok".to_string(),
            secret: "sec".to_string()
        })
    );

    let requests = runtime.block_on(server.received_requests()).unwrap_or_default();
    let body = String::from_utf8_lossy(&requests[0].body).into_owned();
    assert!(body.contains("username=player"));
    assert!(body.contains("password=hunter2"));
    assert!(body.contains("device_id=device-1"));
    assert_eq!(
        requests[0]
            .headers
            .get("Content-Type")
            .and_then(|value| value.to_str().ok()),
        Some("application/x-www-form-urlencoded")
    );
}

#[test]
fn login_with_missing_fields_is_a_payload_error() {
    let (runtime, server) = mock_server();

    runtime.block_on(
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"success\":true}"))
            .mount(&server),
    );

    let engine = started_engine();
    let session = UserSession::new(server.uri(), client_credentials(), "device-1");

    let (sender, receiver) = mpsc::channel();
    session
        .login(&engine, "player", "hunter2", move |result| {
            let _ = sender.send(result);
        })
        .expect("enqueue login");

    let result = await_result(&engine, &receiver);
    assert!(matches!(result, Err(PlatformError::Payload(_))));
    assert!(session.tokens().is_none());
}

#[test]
fn login_http_error_reaches_the_callback() {
    let (runtime, server) = mock_server();

    // A non-200 status is surfaced immediately, never retried.
    runtime.block_on(
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server),
    );

    let engine = started_engine();
    let session = UserSession::new(server.uri(), client_credentials(), "device-1");

    let (sender, receiver) = mpsc::channel();
    session
        .login(&engine, "player", "hunter2", move |result| {
            let _ = sender.send(result);
        })
        .expect("enqueue login");

    let result = await_result(&engine, &receiver);
    assert!(matches!(result, Err(PlatformError::Request(message)) if message.contains("HTTP error")));
    runtime.block_on(server.verify());
}

#[test]
fn authorize_token_yields_the_verifier() {
    let (runtime, server) = mock_server();

    runtime.block_on(
        Mock::given(method("GET"))
            .and(path("/oauth/authorize"))
            .and(query_param("authorize", "1"))
            .and(query_param("oauth_token", "temp-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{\"success\":true,\"oauth_verifier\":\"v-123\"}"),
            )
            .mount(&server),
    );

    let engine = started_engine();
    let session = UserSession::new(server.uri(), client_credentials(), "device-1");

    let (sender, receiver) = mpsc::channel();
    session
        .authorize_token(&engine, "temp-token", move |result| {
            let _ = sender.send(result);
        })
        .expect("enqueue authorize");

    let result = await_result(&engine, &receiver);
    assert_eq!(result, Ok("v-123".to_string()));

    // The GET body rode in the URL and the request was signed.
    let requests = runtime.block_on(server.received_requests()).unwrap_or_default();
    assert!(requests[0].body.is_empty());
    let authorization = requests[0]
        .headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(authorization.starts_with("OAuth "));
}

#[test]
fn temporary_credential_flow_parses_form_tokens() {
    let (runtime, server) = mock_server();

    runtime.block_on(
        Mock::given(method("GET"))
            .and(path("/request_temporary_credential"))
            .and(query_param("device_id", "device-9"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    "oauth_token=temp&oauth_token_secret=temp-secret",
                    "application/x-www-form-urlencoded",
                ),
            )
            .mount(&server),
    );

    let engine = started_engine();
    let session = ServiceSession::new(server.uri(), client_credentials(), "device-9");

    let (sender, receiver) = mpsc::channel();
    session
        .request_temporary_credential(&engine, move |result| {
            let _ = sender.send(result);
        })
        .expect("enqueue exchange");

    let result = await_result(&engine, &receiver);
    assert_eq!(result, Ok(()));
    assert_eq!(
        session.tokens(),
        Some(TokenPair {
            token: "temp".to_string(),
            secret: "temp-secret".to_string()
        })
    );

    // Temporary-credential requests sign without a token.
    let requests = runtime.block_on(server.received_requests()).unwrap_or_default();
    let authorization = requests[0]
        .headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(authorization.starts_with("OAuth "));
    assert!(!authorization.contains("oauth_token=\""));
}

#[test]
fn request_token_signs_with_stored_tokens() {
    let (runtime, server) = mock_server();

    runtime.block_on(
        Mock::given(method("GET"))
            .and(path("/request_temporary_credential"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    "oauth_token=temp&oauth_token_secret=temp-secret",
                    "application/x-www-form-urlencoded",
                ),
            )
            .mount(&server),
    );
    runtime.block_on(
        Mock::given(method("GET"))
            .and(path("/request_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    "oauth_token=final&oauth_token_secret=final-secret",
                    "application/x-www-form-urlencoded",
                ),
            )
            .mount(&server),
    );

    let engine = started_engine();
    let session = ServiceSession::new(server.uri(), client_credentials(), "device-9");

    let (sender, receiver) = mpsc::channel();
    session
        .request_temporary_credential(&engine, move |result| {
            let _ = sender.send(result);
        })
        .expect("enqueue exchange");
    await_result(&engine, &receiver).expect("temporary credential");

    let (sender, receiver) = mpsc::channel();
    session
        .request_token(&engine, move |result| {
            let _ = sender.send(result);
        })
        .expect("enqueue exchange");
    await_result(&engine, &receiver).expect("request token");

    assert_eq!(
        session.tokens(),
        Some(TokenPair {
            token: "final".to_string(),
            secret: "final-secret".to_string()
        })
    );

    let requests = runtime.block_on(server.received_requests()).unwrap_or_default();
    let token_request = requests
        .iter()
        .find(|request| request.url.path() == "/request_token")
        .expect("request_token hit");
    let authorization = token_request
        .headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(authorization.contains("oauth_token=\"temp\""));
}

#[test]
fn wrong_content_type_is_rejected() {
    let (runtime, server) = mock_server();

    runtime.block_on(
        Mock::given(method("GET"))
            .and(path("/request_temporary_credential"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "text/plain")
                    .set_body_string("oauth_token=temp&oauth_token_secret=temp-secret"),
            )
            .mount(&server),
    );

    let engine = started_engine();
    let session = ServiceSession::new(server.uri(), client_credentials(), "device-9");

    let (sender, receiver) = mpsc::channel();
    session
        .request_temporary_credential(&engine, move |result| {
            let _ = sender.send(result);
        })
        .expect("enqueue exchange");

    let result = await_result(&engine, &receiver);
    assert!(matches!(result, Err(PlatformError::Payload(message)) if message.contains("content-type")));
    assert!(session.tokens().is_none());
}
