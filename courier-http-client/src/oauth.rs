//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1).
//!
//! Every function is pure and stateless: identical inputs, including an
//! injected nonce and timestamp, always produce identical output, which is
//! what reproducible signing tests rely on. Nonce and timestamp generation
//! are the only sources of entropy and live in their own functions so tests
//! can substitute fixed values.

use std::borrow::Cow;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use url::Url;

use crate::error::{HttpClientError, Result};
use crate::request::OAuthCredentials;

type HmacSha1 = Hmac<Sha1>;

/// Signature method attached to signed requests.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";

/// Generate a random nonce (16 bytes, hex-encoded).
pub fn generate_nonce() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// Current Unix timestamp as a decimal string.
pub fn generate_timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

/// Percent-encode with the RFC 3986 unreserved set.
fn encode(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Build the OAuth 1.0a signature base string.
///
/// The base string is `METHOD&enc(normalized-url)&enc(param-string)` where
/// the parameter string merges the URL query parameters with the `oauth_*`
/// protocol parameters, percent-encoded and byte-sorted. `oauth_token` is
/// included only when non-empty (temporary-credential requests sign without
/// a token).
pub fn signature_base_string(
    url: &str,
    consumer_key: &str,
    token: &str,
    method: &str,
    timestamp: &str,
    nonce: &str,
    signature_method: &str,
) -> Result<String> {
    let parsed = Url::parse(url)?;
    let normalized = normalized_url(&parsed)?;

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(key, value)| (encode(&key).into_owned(), encode(&value).into_owned()))
        .collect();
    pairs.push(("oauth_consumer_key".to_string(), encode(consumer_key).into_owned()));
    pairs.push(("oauth_nonce".to_string(), encode(nonce).into_owned()));
    pairs.push((
        "oauth_signature_method".to_string(),
        encode(signature_method).into_owned(),
    ));
    pairs.push(("oauth_timestamp".to_string(), encode(timestamp).into_owned()));
    if !token.is_empty() {
        pairs.push(("oauth_token".to_string(), encode(token).into_owned()));
    }
    pairs.push(("oauth_version".to_string(), "1.0".to_string()));
    pairs.sort();

    let param_string = pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(&normalized),
        encode(&param_string)
    ))
}

/// Scheme, host, optional non-default port, and path; no query or fragment.
fn normalized_url(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| HttpClientError::InvalidUrl(format!("{url}: missing host")))?;

    let mut normalized = format!("{}://{}", url.scheme(), host);
    // `Url::port` already hides the scheme's default port.
    if let Some(port) = url.port() {
        normalized.push_str(&format!(":{port}"));
    }
    normalized.push_str(url.path());
    Ok(normalized)
}

/// HMAC-SHA1 signature over the base string, base64-encoded.
///
/// The key is `enc(consumer_secret)&enc(token_secret)`; the token secret may
/// be empty.
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> String {
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take any size key");
    mac.update(base_string.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Assemble the `Authorization` header value.
///
/// Parameters are percent-encoded, double-quoted, comma-separated, and kept
/// in sorted order; `oauth_token` is included only when non-empty.
pub fn authorization_header(
    consumer_key: &str,
    token: &str,
    timestamp: &str,
    nonce: &str,
    signature_method: &str,
    signature: &str,
) -> String {
    let mut parts = vec![
        ("oauth_consumer_key", consumer_key),
        ("oauth_nonce", nonce),
        ("oauth_signature", signature),
        ("oauth_signature_method", signature_method),
        ("oauth_timestamp", timestamp),
    ];
    if !token.is_empty() {
        parts.push(("oauth_token", token));
    }
    parts.push(("oauth_version", "1.0"));

    let rendered = parts
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", key, encode(value)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {rendered}")
}

/// Sign a request and assemble its `Authorization` header in one step.
pub fn build_authorization(
    url: &str,
    method: &str,
    credentials: &OAuthCredentials,
    timestamp: &str,
    nonce: &str,
) -> Result<String> {
    let base = signature_base_string(
        url,
        &credentials.consumer_key,
        &credentials.token,
        method,
        timestamp,
        nonce,
        SIGNATURE_METHOD,
    )?;
    let signature = sign(&base, &credentials.consumer_secret, &credentials.token_secret);
    Ok(authorization_header(
        &credentials.consumer_key,
        &credentials.token,
        timestamp,
        nonce,
        SIGNATURE_METHOD,
        &signature,
    ))
}
