use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, StatusCode};

/// Default timeout for HTTP requests in seconds
const DEFAULT_TIMEOUT: u64 = 15;

const USER_AGENT: &str = concat!("subgen/", env!("CARGO_PKG_VERSION"));

/// Makes an HTTP GET request to the specified URL
///
/// Proxies configured through the usual `HTTP(S)_PROXY` environment
/// variables are honoured by the client.
///
/// # Arguments
/// * `url` - The URL to request
/// * `headers` - Optional custom headers
///
/// # Returns
/// * `Ok(String)` - The response body as a string
/// * `Err(String)` - Error message if the request failed
pub async fn web_get_async(
    url: &str,
    headers: Option<&HashMap<String, String>>,
) -> Result<String, String> {
    let client = Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

    let mut request_builder = client.get(url);
    if let Some(custom_headers) = headers {
        for (key, value) in custom_headers {
            request_builder = request_builder.header(key.as_str(), value.as_str());
        }
    }

    let response = request_builder
        .send()
        .await
        .map_err(|e| format!("Failed to send request: {}", e))?;

    if response.status() != StatusCode::OK {
        return Err(format!("HTTP error: {}", response.status()));
    }

    response
        .text()
        .await
        .map_err(|e| format!("Failed to read response body: {}", e))
}

/// Whether `path` should be fetched over HTTP rather than read from disk.
pub fn is_link(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}
