// ABOUTME: Resource handling module for fetching upstream JSON documents.
// ABOUTME: Handles HTTP fetching with URL validation, content-length limits, status checks, and decoding.

use std::collections::HashMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Options for fetching a resource.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub headers: HashMap<String, String>,
}

/// Body of a 200 response, with the URL it was requested from.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub url: String,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body as JSON into `T`.
    pub fn json<T: DeserializeOwned>(&self, op: &str) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            ApiError::decode(
                &self.url,
                op,
                Some(anyhow::anyhow!("invalid JSON body: {}", e)),
            )
        })
    }
}

fn request_error(url: &str, op: &str, err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::timeout(url, op, Some(anyhow::anyhow!("request timed out: {}", err)))
    } else {
        ApiError::fetch(url, op, Some(anyhow::anyhow!("request failed: {}", err)))
    }
}

/// Fetch a resource from the given URL. Any status other than 200 is a Fetch error.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    op: &str,
    opts: &FetchOptions,
) -> Result<FetchResult, ApiError> {
    if url.is_empty() {
        return Err(ApiError::invalid_url(url, op, None));
    }

    let parsed_url = url::Url::parse(url).map_err(|e| {
        ApiError::invalid_url(url, op, Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;

    let scheme = parsed_url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ApiError::invalid_url(
            url,
            op,
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }

    let mut request = client.get(parsed_url);
    for (key, value) in &opts.headers {
        request = request.header(key, value);
    }

    let response = request.send().await.map_err(|e| request_error(url, op, e))?;

    // Check Content-Length header before reading body
    if let Some(len) = response.content_length() {
        if len as usize > MAX_CONTENT_LENGTH {
            return Err(ApiError::fetch(
                url,
                op,
                Some(anyhow::anyhow!("content too large")),
            ));
        }
    }

    let status = response.status().as_u16();
    let body = response.bytes().await.map_err(|e| request_error(url, op, e))?;

    if body.len() > MAX_CONTENT_LENGTH {
        return Err(ApiError::fetch(
            url,
            op,
            Some(anyhow::anyhow!("content too large")),
        ));
    }

    if status != 200 {
        return Err(ApiError::fetch(
            url,
            op,
            Some(anyhow::anyhow!("HTTP status {}", status)),
        ));
    }

    Ok(FetchResult {
        url: url.to_string(),
        body,
    })
}
