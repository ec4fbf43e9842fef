//! Provider clients and their shared configuration.

mod messages;
mod openai_compatible;

pub use messages::MessagesClient;
pub use openai_compatible::OpenAiCompatibleClient;

use crate::error::ProviderError;
use crate::types::ChatRequest;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Default outbound timeout for provider calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Wire dialect of an upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Conversational messages API (`POST /messages`)
    NativeMessages,
    /// OpenAI-compatible chat completions API (`POST /chat/completions`)
    OpenAiCompatible,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::NativeMessages => "native-messages",
            ProviderKind::OpenAiCompatible => "openai-compatible",
        }
    }

    /// Name of the credential this provider reads at startup.
    pub fn api_key_name(&self) -> &'static str {
        match self {
            ProviderKind::NativeMessages => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAiCompatible => "NVIDIA_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native-messages" | "native" | "messages" | "anthropic" => {
                Ok(ProviderKind::NativeMessages)
            }
            "openai-compatible" | "openai" | "nvidia" => Ok(ProviderKind::OpenAiCompatible),
            other => Err(format!(
                "unknown provider `{other}` (expected native-messages or openai-compatible)"
            )),
        }
    }
}

/// Provider configuration
#[derive(Clone)]
pub struct ProviderConfig {
    /// API key
    pub api_key: String,
    /// Base URL (for custom endpoints)
    pub base_url: Option<String>,
    /// Deployment model; the provider default when unset
    pub model: Option<String>,
    /// Outbound request timeout
    pub timeout: Duration,
    /// Honor the `model` hint carried by chat requests
    pub allow_model_override: bool,
}

impl ProviderConfig {
    /// Create a new config with API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            model: None,
            timeout: DEFAULT_TIMEOUT,
            allow_model_override: false,
        }
    }

    /// Set base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the deployment model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Let requests pick their own model
    pub fn allow_model_override(mut self, allow: bool) -> Self {
        self.allow_model_override = allow;
        self
    }

    pub(crate) fn build_http_client(&self) -> Result<reqwest::Client, ProviderError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ProviderError::Client(e.to_string()))
    }

    pub(crate) fn endpoint(&self, default_base: &str, path: &str) -> String {
        let base = self.base_url.as_deref().unwrap_or(default_base);
        format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    pub(crate) fn resolve_model<'a>(
        &'a self,
        hint: Option<&'a str>,
        default_model: &'a str,
    ) -> &'a str {
        let deployment = self.model.as_deref().unwrap_or(default_model);
        match hint {
            Some(hint) if self.allow_model_override && !hint.is_empty() => hint,
            _ => deployment,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("allow_model_override", &self.allow_model_override)
            .finish()
    }
}

/// One upstream provider bound to its wire format.
///
/// `send` returns the raw body of a 2xx response; translating it into the
/// canonical shape is the normalizer's job.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Wire dialect this client speaks
    fn kind(&self) -> ProviderKind;

    /// Model used when the request carries no honored hint
    fn model(&self) -> &str;

    /// Make the outbound call
    async fn send(&self, request: &ChatRequest) -> Result<String, ProviderError>;
}

/// Build the client for `kind`.
pub fn build_provider(
    kind: ProviderKind,
    config: ProviderConfig,
) -> Result<Arc<dyn ProviderClient>, ProviderError> {
    Ok(match kind {
        ProviderKind::NativeMessages => Arc::new(MessagesClient::new(config)?),
        ProviderKind::OpenAiCompatible => Arc::new(OpenAiCompatibleClient::new(config)?),
    })
}

pub(crate) async fn read_body(
    response: reqwest::Response,
    timeout: Duration,
) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::from_reqwest(e, timeout))?;

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "upstream returned an error status");
        return Err(ProviderError::Upstream {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}
