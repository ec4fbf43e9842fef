//! Error types for the chat gateway.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Failure of a single outbound provider call.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The call did not complete within the configured timeout.
    #[error("upstream request timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    /// Connection refused, reset, or the body could not be read.
    #[error("upstream request failed: {0}")]
    Transport(String),

    /// The upstream answered with a non-2xx status.
    #[error("upstream returned status {status}")]
    Upstream {
        /// HTTP status code from the upstream.
        status: u16,
        /// Raw response body, untouched.
        body: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl ProviderError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(timeout)
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// First problem found in an inbound chat request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("invalid request body: {0}")]
    Malformed(String),

    #[error("messages must not be empty")]
    EmptyMessages,

    #[error("messages[{index}].content must not be empty")]
    EmptyContent { index: usize },

    #[error("messages[{index}].content[{block}] has empty text")]
    EmptyText { index: usize, block: usize },

    #[error("messages[{index}].content[{block}] is not a valid image: {reason}")]
    InvalidImage {
        index: usize,
        block: usize,
        reason: String,
    },

    #[error("messages[{index}].content[{block}] is an image; system messages take text only")]
    SystemImage { index: usize, block: usize },

    #[error("max_tokens must be greater than 0")]
    MaxTokens,

    #[error("temperature must be between 0 and 2, got {0}")]
    Temperature(f32),

    #[error("top_p must be greater than 0 and at most 1, got {0}")]
    TopP(f32),
}

/// Canonical error returned to the chat client.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct GatewayError {
    /// HTTP status the gateway answers with.
    pub status: u16,
    /// Human-readable message.
    pub message: String,
    /// Upstream body, preserved verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_detail: Option<String>,
}

impl GatewayError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            provider_detail: None,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.provider_detail = Some(detail.into());
        self
    }
}

impl From<ValidationError> for GatewayError {
    fn from(err: ValidationError) -> Self {
        GatewayError::new(400, err.to_string())
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
