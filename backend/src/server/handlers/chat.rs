use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
};
use chat_gateway::{ChatResponse, GatewayError};
use tracing::warn;

use crate::server::{config::AppState, error::ApiError};

/// `POST /api/chat`
///
/// Takes the raw body so malformed JSON gets the canonical 400 error
/// rather than the extractor's own rejection. Body rejections (oversized
/// images) are answered as JSON too.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let body = body.map_err(|rejection| {
        let status = rejection.status();
        warn!(%status, "chat body rejected");
        let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
            format!("request body exceeds the {} byte limit", state.chat_body_limit)
        } else {
            rejection.body_text()
        };
        GatewayError::new(status.as_u16(), message)
    })?;

    let response = state.chat.handle_chat(&body).await?;
    Ok(Json(response))
}
