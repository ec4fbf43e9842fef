//! OpenAI-compatible chat completions provider.
//!
//! Plain-text messages pass through unchanged. Block content becomes
//! OpenAI content parts, with images carried as `data:` URLs.

use super::{ProviderClient, ProviderConfig, ProviderKind, read_body};
use crate::error::ProviderError;
use crate::types::{ChatMessage, ChatRequest, ContentBlock, MessageContent};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

const DEFAULT_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";
const DEFAULT_MODEL: &str = "meta/llama-4-scout-17b-16e-instruct";
pub(crate) const DEFAULT_MAX_TOKENS: u32 = 512;
const DEFAULT_TEMPERATURE: f32 = 1.0;
const DEFAULT_TOP_P: f32 = 1.0;

pub struct OpenAiCompatibleClient {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiCompatibleClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = config.build_http_client()?;
        Ok(Self { client, config })
    }

    fn build_body<'a>(&'a self, request: &'a ChatRequest) -> CompletionRequest<'a> {
        CompletionRequest {
            model: self
                .config
                .resolve_model(request.model.as_deref(), DEFAULT_MODEL),
            messages: request.messages.iter().map(convert_message).collect(),
            temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            top_p: request.top_p.unwrap_or(DEFAULT_TOP_P),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stream: false,
        }
    }
}

fn convert_message(message: &ChatMessage) -> CompletionMessage<'_> {
    let content = match &message.content {
        MessageContent::Text(text) => CompletionContent::Text(text),
        MessageContent::Blocks(blocks) => {
            CompletionContent::Parts(blocks.iter().map(convert_block).collect())
        }
    };
    CompletionMessage {
        role: message.role.as_str(),
        content,
    }
}

fn convert_block(block: &ContentBlock) -> ContentPart<'_> {
    match block {
        ContentBlock::Text { text } => ContentPart::Text { text },
        ContentBlock::Image { source } => ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{};base64,{}", source.media_type, source.data),
            },
        },
    }
}

#[async_trait]
impl ProviderClient for OpenAiCompatibleClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAiCompatible
    }

    fn model(&self) -> &str {
        self.config.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    async fn send(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let body = self.build_body(request);
        let url = self.config.endpoint(DEFAULT_BASE_URL, "chat/completions");
        info!(model = body.model, messages = body.messages.len(), "calling chat completions API");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.config.timeout))?;

        read_body(response, self.config.timeout).await
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    frequency_penalty: f32,
    presence_penalty: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'static str,
    content: CompletionContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum CompletionContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_defaults_applied() {
        let provider = OpenAiCompatibleClient::new(ProviderConfig::new("test-key")).unwrap();
        let request = ChatRequest::new(vec![
            ChatMessage::system("You are a baby upset about balloons"),
            ChatMessage::user("Say hello in one sentence"),
        ])
        .with_model("claude-sonnet-4-5-20250929");

        let body = serde_json::to_value(provider.build_body(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": DEFAULT_MODEL,
                "messages": [
                    { "role": "system", "content": "You are a baby upset about balloons" },
                    { "role": "user", "content": "Say hello in one sentence" }
                ],
                "temperature": 1.0,
                "top_p": 1.0,
                "max_tokens": 512,
                "frequency_penalty": 0.0,
                "presence_penalty": 0.0,
                "stream": false
            })
        );
    }

    #[test]
    fn test_blocks_become_content_parts() {
        let provider = OpenAiCompatibleClient::new(ProviderConfig::new("test-key")).unwrap();
        let request = ChatRequest::new(vec![ChatMessage::user(vec![
            ContentBlock::text("what animal is this?"),
            ContentBlock::image("image/jpeg", "aGk="),
        ])])
        .with_max_tokens(100)
        .with_temperature(0.5);

        let body = serde_json::to_value(provider.build_body(&request)).unwrap();
        assert_eq!(body["max_tokens"], 100);
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(
            body["messages"][0]["content"],
            json!([
                { "type": "text", "text": "what animal is this?" },
                { "type": "image_url", "image_url": { "url": "data:image/jpeg;base64,aGk=" } }
            ])
        );
    }
}
