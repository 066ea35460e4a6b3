//! Percent-encoded query string assembly.

/// Build a query string from key/value pairs.
///
/// Keys and values are percent-encoded with the RFC 3986 unreserved set; an
/// empty value renders as `key=`. An empty pair list yields an empty string.
pub fn query_string<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .map(|(key, value)| {
            if value.is_empty() {
                format!("{}=", urlencoding::encode(key))
            } else {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Build a query string repeating one key across multiple values.
pub fn query_string_repeat(key: &str, values: &[&str]) -> String {
    values
        .iter()
        .map(|value| {
            if value.is_empty() {
                format!("{}=", urlencoding::encode(key))
            } else {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}
