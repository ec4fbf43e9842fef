//! The single chat entry point: parse, validate, dispatch, normalize.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{GatewayError, ProviderError};
use crate::normalize::{normalize, normalize_failure};
use crate::provider::{ProviderClient, ProviderKind};
use crate::types::ChatResponse;
use crate::validation::{parse_request, validate_request};

/// Routes chat requests to the provider fixed at construction.
///
/// Holds no per-request state; clones share the provider's connection pool.
#[derive(Clone)]
pub struct ChatRouter {
    provider: Arc<dyn ProviderClient>,
}

impl ChatRouter {
    pub fn new(provider: Arc<dyn ProviderClient>) -> Self {
        Self { provider }
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Handle one raw `POST /api/chat` body.
    ///
    /// Returns exactly one canonical response or one error. Invalid input
    /// never reaches the provider.
    pub async fn handle_chat(&self, raw_body: &[u8]) -> Result<ChatResponse, GatewayError> {
        let request = parse_request(raw_body).map_err(|e| {
            warn!(error = %e, "rejecting chat request");
            GatewayError::from(e)
        })?;
        validate_request(&request).map_err(|e| {
            warn!(error = %e, "rejecting chat request");
            GatewayError::from(e)
        })?;

        let kind = self.provider.kind();
        info!(
            provider = %kind,
            messages = request.messages.len(),
            max_tokens = ?request.max_tokens,
            "forwarding chat request"
        );

        let raw = self.provider.send(&request).await.map_err(|e| {
            match &e {
                ProviderError::Upstream { status, .. } => {
                    warn!(provider = %kind, status, "upstream rejected chat request")
                }
                other => error!(provider = %kind, error = %other, "chat request failed"),
            }
            normalize_failure(e)
        })?;

        let mut response = normalize(kind, &raw).inspect_err(|e| {
            error!(provider = %kind, error = %e, "could not normalize upstream response");
        })?;
        if response.id.is_empty() {
            response.id = format!("msg_{}", Uuid::new_v4().simple());
        }
        if response.model.is_empty() {
            response.model = self.provider.model().to_string();
        }

        info!(
            provider = %kind,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "chat request completed"
        );
        Ok(response)
    }
}
