use axum::{
    Router,
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chat_gateway::{ChatRouter, build_provider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::server::{
    handlers::{assets::frog_image, chat::chat},
    settings::{ConfigError, DEFAULT_CHAT_BODY_LIMIT, Settings},
};

#[derive(Clone)]
pub struct AppState {
    pub chat: ChatRouter,
    pub static_dir: PathBuf,
    pub frog_image: PathBuf,
    /// Largest `/api/chat` body accepted, in bytes.
    pub chat_body_limit: usize,
    /// Canonical paths the static fallback must never serve.
    hidden_files: Arc<Vec<PathBuf>>,
}

impl AppState {
    pub fn new(chat: ChatRouter, static_dir: impl Into<PathBuf>, frog_image: impl Into<PathBuf>) -> Self {
        Self {
            chat,
            static_dir: static_dir.into(),
            frog_image: frog_image.into(),
            chat_body_limit: DEFAULT_CHAT_BODY_LIMIT,
            hidden_files: Arc::default(),
        }
    }

    /// Keep `path` out of the static fallback. A path that does not exist is
    /// ignored since there is nothing to serve.
    pub fn hide_file(mut self, path: impl AsRef<Path>) -> Self {
        if let Ok(canonical) = std::fs::canonicalize(path) {
            Arc::make_mut(&mut self.hidden_files).push(canonical);
        }
        self
    }

    pub fn with_chat_body_limit(mut self, limit: usize) -> Self {
        self.chat_body_limit = limit;
        self
    }
}

/// Build the application from settings. Fails if no API key can be found.
pub fn configure_app(settings: &Settings) -> Result<Router, ConfigError> {
    let provider = build_provider(settings.provider, settings.provider_config()?)?;
    let chat = ChatRouter::new(provider);
    info!(provider = %chat.provider_kind(), model = chat.model(), "chat gateway configured");

    let state = AppState::new(chat, &settings.static_dir, settings.frog_image_path())
        .hide_file(&settings.config_file)
        .with_chat_body_limit(settings.max_body_bytes);
    Ok(app_router(state))
}

async fn log_request(request: Request, next: Next) -> Response {
    info!("{} {}", request.method(), request.uri().path());
    next.run(request).await
}

/// Dotfiles and the key file answer 404 exactly like a missing asset.
async fn guard_static(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if is_hidden(&state, request.uri().path()).await {
        warn!(path = request.uri().path(), "refusing to serve protected file");
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

async fn is_hidden(state: &AppState, path: &str) -> bool {
    // Same decoding ServeDir applies before touching the filesystem.
    let Ok(decoded) = urlencoding::decode(path) else {
        return true;
    };
    let segments: Vec<&str> = decoded.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().any(|segment| segment.starts_with('.')) {
        return true;
    }
    if state.hidden_files.is_empty() {
        return false;
    }

    let candidate = segments
        .iter()
        .fold(state.static_dir.clone(), |dir, segment| dir.join(segment));
    match tokio::fs::canonicalize(&candidate).await {
        Ok(resolved) => state.hidden_files.contains(&resolved),
        Err(_) => false,
    }
}

pub fn app_router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        .route(
            "/api/chat",
            post(chat).layer(DefaultBodyLimit::max(state.chat_body_limit)),
        )
        .route("/api/frog-image", get(frog_image))
        .fallback_service(assets)
        .layer(middleware::from_fn_with_state(state.clone(), guard_static))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
