//! Marathon request headers

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::errors::DeployError;

const HIDDEN_HEADERS: &[&str] = &["oauthaccesstoken", "authorization"];

/// Header name and value, in the order given; a name may repeat
pub type HeaderPair = (String, String);

/// Parse the `-H "Key: Value"` options of a curl command line.
///
/// Only `-H` is understood; segments that are not `Key: Value` are skipped.
/// Repeated names are all kept.
pub fn parse_curl_headers(curl_opts: &str) -> Vec<HeaderPair> {
    curl_opts
        .split("-H")
        .map(|opt| opt.trim().trim_matches('"').trim_matches('\'').trim())
        .filter(|opt| !opt.is_empty())
        .filter_map(|opt| opt.split_once(": "))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Convert configured headers into a request header map
pub fn to_header_map(headers: &[HeaderPair]) -> Result<HeaderMap, DeployError> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| DeployError::ConfigError(format!("Invalid header name '{}': {}", key, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| DeployError::ConfigError(format!("Invalid value for header '{}': {}", key, e)))?;
        map.append(name, value);
    }
    Ok(map)
}

/// Headers with credential values masked, for display
pub fn redacted(headers: &[HeaderPair]) -> Vec<HeaderPair> {
    headers
        .iter()
        .map(|(key, value)| {
            if HIDDEN_HEADERS.contains(&key.to_lowercase().as_str()) {
                (key.clone(), "[hidden]".to_string())
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}
