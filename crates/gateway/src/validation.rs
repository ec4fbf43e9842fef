//! Inbound request checks. Stops at the first violation.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::ValidationError;
use crate::types::{ChatRequest, ContentBlock, ImageSource, MessageContent, Role};

/// Parse a raw request body into a [`ChatRequest`].
pub fn parse_request(raw_body: &[u8]) -> Result<ChatRequest, ValidationError> {
    serde_json::from_slice(raw_body).map_err(|e| ValidationError::Malformed(e.to_string()))
}

/// Check a parsed request against the gateway's input contract.
pub fn validate_request(request: &ChatRequest) -> Result<(), ValidationError> {
    if request.messages.is_empty() {
        return Err(ValidationError::EmptyMessages);
    }

    for (index, message) in request.messages.iter().enumerate() {
        match &message.content {
            MessageContent::Text(text) if text.is_empty() => {
                return Err(ValidationError::EmptyContent { index });
            }
            MessageContent::Text(_) => {}
            MessageContent::Blocks(blocks) if blocks.is_empty() => {
                return Err(ValidationError::EmptyContent { index });
            }
            MessageContent::Blocks(blocks) => {
                for (block, content) in blocks.iter().enumerate() {
                    if message.role == Role::System && matches!(content, ContentBlock::Image { .. }) {
                        return Err(ValidationError::SystemImage { index, block });
                    }
                    validate_block(index, block, content)?;
                }
            }
        }
    }

    if request.max_tokens == Some(0) {
        return Err(ValidationError::MaxTokens);
    }
    if let Some(temperature) = request.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ValidationError::Temperature(temperature));
        }
    }
    if let Some(top_p) = request.top_p {
        if !(top_p > 0.0 && top_p <= 1.0) {
            return Err(ValidationError::TopP(top_p));
        }
    }

    Ok(())
}

fn validate_block(index: usize, block: usize, content: &ContentBlock) -> Result<(), ValidationError> {
    match content {
        ContentBlock::Text { text } if text.is_empty() => {
            Err(ValidationError::EmptyText { index, block })
        }
        ContentBlock::Text { .. } => Ok(()),
        ContentBlock::Image { source } => {
            check_image(source).map_err(|reason| ValidationError::InvalidImage {
                index,
                block,
                reason: reason.to_string(),
            })
        }
    }
}

fn check_image(source: &ImageSource) -> Result<(), &'static str> {
    if source.source_type != "base64" {
        return Err("only base64 image sources are supported");
    }
    if !source.media_type.starts_with("image/") || source.media_type.len() <= "image/".len() {
        return Err("media type must be image/*");
    }
    if source.data.is_empty() {
        return Err("image data is empty");
    }
    STANDARD
        .decode(source.data.as_bytes())
        .map(|_| ())
        .map_err(|_| "image data is not valid base64")
}
