//! Chat gateway for the canvas chat demo
//!
//! Accepts one client-facing request shape, forwards it to the upstream
//! provider this gateway instance is bound to (a native messages API or an
//! OpenAI-compatible chat completions API), and returns one canonical
//! response shape regardless of provider.
//!
//! # Example
//!
//! ```no_run
//! use chat_gateway::{ChatRouter, ProviderConfig, ProviderKind, build_provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = build_provider(
//!         ProviderKind::OpenAiCompatible,
//!         ProviderConfig::new("nvapi-..."),
//!     )?;
//!     let router = ChatRouter::new(provider);
//!
//!     let body = br#"{"messages":[{"role":"user","content":"Hello!"}],"max_tokens":256}"#;
//!     let response = router.handle_chat(body).await?;
//!     println!("{:?}", response.text());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod normalize;
pub mod provider;
pub mod router;
pub mod types;
pub mod validation;

pub use error::{GatewayError, ProviderError, Result, ValidationError};
pub use normalize::{normalize, normalize_failure};
pub use provider::{
    DEFAULT_TIMEOUT, MessagesClient, OpenAiCompatibleClient, ProviderClient, ProviderConfig,
    ProviderKind, build_provider,
};
pub use router::ChatRouter;
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, ContentBlock, ImageSource, MessageContent,
    ResponseBlock, Role, StopReason, Usage,
};
