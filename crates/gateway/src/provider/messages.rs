//! Native conversational-messages provider.
//!
//! The canonical message shape is already this API's shape, so messages are
//! forwarded as-is. The only rewrite is lifting `system` messages into the
//! top-level `system` field, which the API requires.

use super::{ProviderClient, ProviderConfig, ProviderKind, read_body};
use crate::error::ProviderError;
use crate::types::{ChatRequest, MessageContent, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub(crate) const DEFAULT_MAX_TOKENS: u32 = 1024;

pub struct MessagesClient {
    client: Client,
    config: ProviderConfig,
}

impl MessagesClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = config.build_http_client()?;
        Ok(Self { client, config })
    }

    /// Build request headers
    fn headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(key) = self.config.api_key.parse() {
            headers.insert("x-api-key", key);
        }
        if let Ok(version) = API_VERSION.parse() {
            headers.insert("anthropic-version", version);
        }
        if let Ok(content_type) = "application/json".parse() {
            headers.insert(reqwest::header::CONTENT_TYPE, content_type);
        }
        headers
    }

    fn build_body<'a>(&'a self, request: &'a ChatRequest) -> MessagesRequest<'a> {
        let mut system: Option<String> = None;
        let mut messages = Vec::with_capacity(request.messages.len());

        for message in &request.messages {
            match message.role {
                // System content is text-only once validated.
                Role::System => {
                    let text = message.content.text();
                    system = Some(match system {
                        Some(existing) => format!("{existing}\n\n{text}"),
                        None => text,
                    });
                }
                Role::User | Role::Assistant => messages.push(WireMessage {
                    role: message.role.as_str(),
                    content: &message.content,
                }),
            }
        }

        MessagesRequest {
            model: self
                .config
                .resolve_model(request.model.as_deref(), DEFAULT_MODEL),
            messages,
            system,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: request.temperature,
            top_p: request.top_p,
            stream: false,
        }
    }
}

#[async_trait]
impl ProviderClient for MessagesClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::NativeMessages
    }

    fn model(&self) -> &str {
        self.config.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    async fn send(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let body = self.build_body(request);
        let url = self.config.endpoint(DEFAULT_BASE_URL, "messages");
        info!(model = body.model, messages = body.messages.len(), "calling messages API");

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.config.timeout))?;

        read_body(response, self.config.timeout).await
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a MessageContent,
}
