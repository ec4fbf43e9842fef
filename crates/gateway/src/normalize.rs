//! Translation of upstream bodies into the canonical response and error
//! shapes.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{GatewayError, ProviderError};
use crate::provider::ProviderKind;
use crate::types::{ChatResponse, ResponseBlock, Role, StopReason, Usage};

/// Map a successful upstream body into a [`ChatResponse`].
///
/// A body that is not JSON, or lacks what the provider contract requires,
/// is a transport failure. `id` and `model` stay empty when the upstream
/// omits them.
pub fn normalize(kind: ProviderKind, raw: &str) -> Result<ChatResponse, GatewayError> {
    match kind {
        ProviderKind::NativeMessages => serde_json::from_str::<MessagesResponse>(raw)
            .map(from_messages)
            .map_err(|e| malformed(kind, e)),
        ProviderKind::OpenAiCompatible => serde_json::from_str::<CompletionResponse>(raw)
            .map(from_completion)
            .map_err(|e| malformed(kind, e)),
    }
}

/// Map a failed provider call into a [`GatewayError`].
pub fn normalize_failure(err: ProviderError) -> GatewayError {
    match err {
        ProviderError::Upstream { status, body } => {
            GatewayError::new(status, upstream_error_message(status, &body)).with_detail(body)
        }
        other => GatewayError::transport(other.to_string()),
    }
}

/// Best-effort message from an upstream error body.
///
/// Recognizes `{"error":{"message":..}}` (both dialects), `{"error":".."}`,
/// `{"message":..}` and `{"detail":..}`.
pub fn upstream_error_message(status: u16, body: &str) -> String {
    let fallback = || format!("upstream returned {status}");
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return fallback();
    };

    let candidates = [
        value.pointer("/error/message"),
        value.get("error"),
        value.get("message"),
        value.get("detail"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().filter(|s| !s.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(fallback)
}

fn malformed(kind: ProviderKind, err: serde_json::Error) -> GatewayError {
    GatewayError::transport(format!("malformed {kind} response: {err}"))
}

fn from_messages(response: MessagesResponse) -> ChatResponse {
    let mut content: Vec<ResponseBlock> = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            MessagesBlock::Text { text } => Some(ResponseBlock::Text { text }),
            MessagesBlock::Other => None,
        })
        .collect();
    if content.is_empty() {
        content.push(ResponseBlock::text(""));
    }

    ChatResponse {
        id: response.id,
        r#type: "message".to_string(),
        role: Role::Assistant,
        content,
        model: response.model,
        stop_reason: stop_reason(response.stop_reason),
        usage: Usage {
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        },
    }
}

fn from_completion(response: CompletionResponse) -> ChatResponse {
    let (text, finish_reason) = match response.choices.into_iter().next() {
        Some(choice) => (
            choice.message.and_then(|m| m.content).unwrap_or_default(),
            choice.finish_reason,
        ),
        None => (String::new(), None),
    };
    let usage = response.usage.unwrap_or_default();

    ChatResponse {
        id: response.id,
        r#type: "message".to_string(),
        role: Role::Assistant,
        content: vec![ResponseBlock::Text { text }],
        model: response.model,
        stop_reason: stop_reason(finish_reason),
        usage: Usage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        },
    }
}

fn stop_reason(raw: Option<String>) -> StopReason {
    match raw {
        Some(reason) if !reason.is_empty() => StopReason::from(reason),
        _ => StopReason::EndTurn,
    }
}

// Native messages API types

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    content: Vec<MessagesBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: MessagesUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessagesBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

// OpenAI-compatible API types

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<CompletionMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}
