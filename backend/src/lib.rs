pub mod server;

use std::path::Path;

use tracing_subscriber::EnvFilter;

pub use server::config::{AppState, app_router, configure_app};
pub use server::settings::{ConfigError, Settings};

const DEFAULT_LOG_FILTER: &str = "info,hyper=warn,reqwest=warn";

/// Load `.env` (or `env_file`) into the process environment, then install the
/// global tracing subscriber. `RUST_LOG` from either source overrides the
/// default filter.
pub fn init_environment(env_file: Option<&Path>) {
    match env_file {
        Some(path) => {
            let _ = dotenvy::from_path(path);
        }
        None => {
            let _ = dotenvy::dotenv();
        }
    }
    init_tracing();
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*};
    let _ = tracing_subscriber::registry()
        .with(log_filter())
        .with(fmt::layer())
        .try_init();
}
