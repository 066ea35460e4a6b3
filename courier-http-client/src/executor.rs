//! The blocking HTTP execution pipeline behind the engine's worker thread.

use std::thread;
use std::time::Instant;

use courier_queue::{Processor, QueueError, QueueResult};
use http::Method;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::HttpClientConfig;
use crate::error::{HttpClientError, Result};
use crate::fault;
use crate::oauth;
use crate::request::{HttpRequest, RequestBody};
use crate::response::{HttpResponse, ResponseBody};

/// Processes [`HttpRequest`]s into [`HttpResponse`]s.
///
/// Exactly one processor lives inside an engine and runs on its worker
/// thread, so the possibly-blocking exchange never touches the caller's
/// execution context. All legitimate failures are encoded into the response;
/// the engine's fault path only fires for unexpected processing errors.
pub struct HttpProcessor {
    client: Client,
    config: HttpClientConfig,
}

impl HttpProcessor {
    /// Create a processor with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a processor with custom configuration.
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = build_client(&config, None)?;
        Ok(Self { client, config })
    }

    /// The processor configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    fn execute_with_retry(&self, request: &mut HttpRequest) -> HttpResponse {
        loop {
            match self.execute_once(request) {
                Ok(response) => return response,
                Err(error) => {
                    if request.retry && error.is_retryable() && request.retries > 0 {
                        request.retries -= 1;
                        warn!(
                            error = %error,
                            remaining = request.retries,
                            "transport error, retrying"
                        );
                        continue;
                    }
                    return HttpResponse::from_error(format!("Exception: {error}"));
                }
            }
        }
    }

    fn execute_once(&self, request: &HttpRequest) -> Result<HttpResponse> {
        if fault::triggered(request.faults.unreachable_probability) {
            return Err(HttpClientError::Connection(
                "injected fault: server unreachable".to_string(),
            ));
        }

        let started = Instant::now();
        let url = effective_url(request)?;

        // Pinning is a per-request parameter: a pinned request gets its own
        // client whose trust store holds only the pinned certificate.
        let pinned;
        let client = match request.pinned_cert.as_deref() {
            Some(pem) => {
                pinned = build_client(&self.config, Some(pem))?;
                &pinned
            }
            None => &self.client,
        };

        if request.trace {
            info!(method = %request.method, url = %url, "http request");
        }

        let mut builder = client.request(request.method.clone(), url.clone());
        for (name, value) in &request.headers {
            if request.trace {
                info!(header = %name, value = %value, "request header");
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(credentials) = &request.oauth {
            let nonce = oauth::generate_nonce();
            let timestamp = oauth::generate_timestamp();
            // The signature covers the URL as transmitted, including query
            // parameters that arrived as a GET body.
            let authorization = oauth::build_authorization(
                url.as_str(),
                request.method.as_str(),
                credentials,
                &timestamp,
                &nonce,
            )?;
            if request.trace {
                info!(authorization = %authorization, "signed request");
            }
            builder = builder.header("Authorization", authorization);
        }

        builder = write_body(builder, request);

        let http_response = builder.send()?;

        if fault::triggered(request.faults.api_error_probability) {
            warn!(url = %request.url, "injected fault: synthetic api error");
            return Ok(HttpResponse::from_error("API error: injected fault"));
        }

        let response = capture_response(request, http_response)?;

        if request.profile {
            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                url = %request.url,
                "request completed"
            );
        }
        Ok(response)
    }
}

impl Processor for HttpProcessor {
    type Payload = HttpRequest;
    type Output = HttpResponse;

    fn process(&mut self, request: &mut HttpRequest) -> QueueResult<Option<HttpResponse>> {
        // A canned response short-circuits the network entirely.
        if let Some(canned) = request.debug_response.as_ref().filter(|c| !c.is_empty()) {
            debug!(url = %request.url, "returning canned response");
            return Ok(Some(HttpResponse::from_text(canned.clone())));
        }

        if fault::triggered(request.faults.delay_probability) {
            warn!(delay = ?request.faults.delay, "injected fault: delaying request");
            thread::sleep(request.faults.delay);
        }

        let response = self.execute_with_retry(request);

        if fault::triggered(request.faults.lose_response_probability) {
            warn!(url = %request.url, "injected fault: dropping response");
            return Ok(None);
        }

        Ok(Some(response))
    }

    fn fault(&mut self, _request: &HttpRequest, error: &QueueError) -> HttpResponse {
        HttpResponse::from_error(format!("Exception: {error}"))
    }
}

fn build_client(config: &HttpClientConfig, pinned_cert: Option<&str>) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(&config.user_agent)
        .gzip(true);

    if let Some(pem) = pinned_cert {
        let certificate = reqwest::Certificate::from_pem(pem.as_bytes())
            .map_err(|e| HttpClientError::Tls(e.to_string()))?;
        builder = builder
            .add_root_certificate(certificate)
            .tls_built_in_root_certs(false);
    }

    builder.build().map_err(HttpClientError::from)
}

/// The URL actually transmitted: for GET with a non-empty form body the body
/// becomes the query string and no request body is written.
fn effective_url(request: &HttpRequest) -> Result<Url> {
    let mut raw = request.url.clone();
    if request.method == Method::GET
        && let RequestBody::Form(query) = &request.body
        && !query.is_empty()
    {
        raw.push('?');
        raw.push_str(query);
    }
    Url::parse(&raw).map_err(|e| HttpClientError::InvalidUrl(format!("{raw}: {e}")))
}

fn write_body(builder: RequestBuilder, request: &HttpRequest) -> RequestBuilder {
    if request.method == Method::GET || request.body.is_empty() {
        return builder;
    }

    match &request.body {
        RequestBody::Empty => builder,
        RequestBody::Form(form) => {
            let builder = if request.has_content_type() {
                builder
            } else {
                builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            };
            builder
                .header(CONTENT_LENGTH, form.len())
                .body(form.clone())
        }
        RequestBody::Raw(bytes) => {
            let builder = if request.has_content_type() {
                builder
            } else {
                builder.header(CONTENT_TYPE, "application/octet-stream")
            };
            builder
                .header(CONTENT_LENGTH, bytes.len())
                .body(bytes.clone())
        }
    }
}

fn capture_response(
    request: &HttpRequest,
    http_response: reqwest::blocking::Response,
) -> Result<HttpResponse> {
    let status = http_response.status();

    let mut response = HttpResponse {
        status: Some(status),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        ..HttpResponse::default()
    };

    for (name, value) in http_response.headers() {
        if let Ok(value) = value.to_str() {
            if request.trace {
                info!(header = %name, value = %value, "response header");
            }
            response
                .headers
                .insert(name.as_str().to_string(), value.to_string());
        }
    }

    if status == http::StatusCode::OK {
        let is_octet_stream = response
            .content_type()
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            == Some("application/octet-stream");

        // Gzip-encoded bodies are decompressed transparently before either
        // read; gzip is always offered via Accept-Encoding.
        if is_octet_stream {
            response.body = ResponseBody::Bytes(http_response.bytes()?);
        } else {
            response.body = ResponseBody::Text(http_response.text()?);
        }
    } else {
        response.error = Some(format!("HTTP error: {status}"));
    }

    Ok(response)
}
