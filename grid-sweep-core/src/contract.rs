//! # contract: interface to the image-generation service
//!
//! This module defines the single trait ([`Generator`]) the sweep uses to talk to an
//! external image-generation endpoint, and the response/error types crossing it.
//!
//! ## Interface
//! - One async operation: submit a [`GenerationRequest`], receive the base64 image list.
//! - Any transport failure or non-success status is a [`GenerateError`]; the caller
//!   decides whether that skips a job or aborts the run.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall` so tests can script responses without a
//!   running service (`MockGenerator`, exported under the `test-export-mocks` feature).

use async_trait::async_trait;
use serde::Deserialize;

use crate::request::GenerationRequest;

/// Images returned for one job.
///
/// Element 0 is the composite grid and is discarded by the output writer;
/// elements 1.. line up positionally with the prompt set's fragment filenames.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub images: Vec<String>,
}

impl GenerationResponse {
    pub fn new(images: Vec<String>) -> Self {
        Self { images }
    }
}

/// Errors from the generation endpoint.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The request never produced a response (connect, DNS, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status.
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The body could not be read as a generation response.
    #[error("invalid response body: {0}")]
    InvalidResponse(String),
}

/// Trait for submitting one generation job to the external service.
/// Implemented by the HTTP client in the CLI crate and by mocks in tests.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// Submit the payload and wait for the resulting image list.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerateError>;
}
