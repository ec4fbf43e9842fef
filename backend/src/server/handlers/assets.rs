use axum::{Json, extract::State};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chat_gateway::GatewayError;
use serde::Serialize;
use tracing::{error, info};

use crate::server::{config::AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct FrogImageResponse {
    pub image: String,
}

/// `GET /api/frog-image`: the demo image for multimodal turns, base64-encoded.
pub async fn frog_image(State(state): State<AppState>) -> Result<Json<FrogImageResponse>, ApiError> {
    let path = state.frog_image.as_path();
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        error!(path = %path.display(), error = %e, "failed to read demo image");
        GatewayError::not_found(format!("demo image not available: {e}"))
    })?;

    info!(bytes = bytes.len(), "serving demo image");
    Ok(Json(FrogImageResponse {
        image: STANDARD.encode(bytes),
    }))
}
