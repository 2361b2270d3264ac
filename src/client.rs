//! # WebUI client
//!
//! Bridges the core [`Generator`] trait to a Stable Diffusion WebUI started with
//! `--api`, posting each payload to `{base}/sdapi/v1/txt2img`.
//!
//! - Construct [`WebUiClient`] from the configured base URL, optional bearer token
//!   and request timeout.
//! - Base URLs pasted with `/sdapi/v1`, `/sdapi` or `/docs` suffixes are normalized.
//! - Transport failures, non-2xx statuses and unreadable bodies all map to
//!   [`GenerateError`]; the sweep decides whether to skip or abort.

use std::time::Duration;

use async_trait::async_trait;
use grid_sweep_core::contract::{GenerateError, GenerationResponse, Generator};
use grid_sweep_core::request::GenerationRequest;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;

const SDAPI_PREFIX: &str = "/sdapi/v1";

pub struct WebUiClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl WebUiClient {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut headers = HeaderMap::new();
        if let Some(token) = api_key.map(str::trim).filter(|t| !t.is_empty()) {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        let endpoint = build_sdapi_endpoint(base_url, "txt2img");
        tracing::info!(
            endpoint = %endpoint,
            auth = api_key.is_some(),
            timeout_secs = timeout.as_secs(),
            "Initialized WebUiClient"
        );
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, error: &reqwest::Error) -> GenerateError {
        let message = if error.is_timeout() {
            format!(
                "request to {} timed out after {} seconds",
                self.endpoint,
                self.timeout.as_secs()
            )
        } else if error.is_connect() {
            format!(
                "connection to {} failed; verify the WebUI is running with --api",
                self.endpoint
            )
        } else {
            format!("transport error at {}: {}", self.endpoint, error)
        };
        GenerateError::Transport(message)
    }
}

#[async_trait]
impl Generator for WebUiClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerateError> {
        tracing::debug!(endpoint = %self.endpoint, seed = request.seed, "Submitting txt2img request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, endpoint = %self.endpoint, "txt2img request failed");
                self.transport_error(&e)
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "txt2img response received");
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            if status == StatusCode::NOT_FOUND {
                tracing::error!(
                    endpoint = %self.endpoint,
                    "txt2img endpoint not found; start the WebUI with --api and use its base URL"
                );
            }
            return Err(GenerateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<GenerationResponse>()
            .await
            .map_err(|e| GenerateError::InvalidResponse(e.to_string()))
    }
}

fn build_sdapi_endpoint(base_url: &str, endpoint: &str) -> String {
    let normalized = normalize_base_url(base_url);
    let path = endpoint.trim_start_matches('/');
    format!("{normalized}{SDAPI_PREFIX}/{path}")
}

fn normalize_base_url(base_url: &str) -> String {
    let mut normalized = base_url.trim().trim_end_matches('/').to_string();
    loop {
        let stripped = normalized
            .strip_suffix("/docs")
            .or_else(|| normalized.strip_suffix(SDAPI_PREFIX))
            .or_else(|| normalized.strip_suffix("/sdapi"));
        match stripped {
            Some(value) => normalized = value.trim_end_matches('/').to_string(),
            None => return normalized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{build_sdapi_endpoint, normalize_base_url};

    #[test]
    fn normalize_base_url_strips_sdapi_suffixes() {
        assert_eq!(
            normalize_base_url("http://127.0.0.1:7860/sdapi/v1"),
            "http://127.0.0.1:7860"
        );
        assert_eq!(
            normalize_base_url("http://127.0.0.1:7860/sdapi/v1/docs/"),
            "http://127.0.0.1:7860"
        );
    }

    #[test]
    fn build_endpoint_appends_txt2img_once() {
        assert_eq!(
            build_sdapi_endpoint("http://127.0.0.1:7860/", "txt2img"),
            "http://127.0.0.1:7860/sdapi/v1/txt2img"
        );
        assert_eq!(
            build_sdapi_endpoint(" http://host:7860/sdapi ", "/txt2img"),
            "http://host:7860/sdapi/v1/txt2img"
        );
    }
}
