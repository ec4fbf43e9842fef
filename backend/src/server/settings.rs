//! Process configuration: command line, environment, and the local key file.

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chat_gateway::{ProviderConfig, ProviderKind};
use clap::Parser;
use regex::Regex;
use thiserror::Error;

/// Default cap on `/api/chat` bodies. Base64 photos make multimodal turns large.
pub const DEFAULT_CHAT_BODY_LIMIT: usize = 32 * 1024 * 1024;

/// Startup failures. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find {name} in {} or the environment", path.display())]
    MissingApiKey { name: String, path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid bind address {0}")]
    BindAddress(String),

    #[error("failed to set up provider client: {0}")]
    Provider(#[from] chat_gateway::ProviderError),
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "canvas-chat",
    about = "Serves the canvas chat client and proxies chat turns to an LLM provider",
    version
)]
pub struct Settings {
    /// Interface to bind
    #[arg(long, env = "CANVAS_CHAT_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port serving both the API and the static client
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory holding the client assets
    #[arg(long, env = "CANVAS_CHAT_STATIC_DIR", default_value = ".")]
    pub static_dir: PathBuf,

    /// Demo image served by /api/frog-image, relative to the static directory
    #[arg(long, env = "CANVAS_CHAT_FROG_IMAGE", default_value = "frog.png")]
    pub frog_image: PathBuf,

    /// Local file holding the provider API key (e.g. `NVIDIA_API_KEY: "..."`)
    #[arg(long, env = "CANVAS_CHAT_CONFIG", default_value = "config.js")]
    pub config_file: PathBuf,

    /// Upstream dialect: native-messages or openai-compatible
    #[arg(long, env = "CANVAS_CHAT_PROVIDER", default_value = "openai-compatible")]
    pub provider: ProviderKind,

    /// Override the provider's base URL
    #[arg(long, env = "CANVAS_CHAT_BASE_URL")]
    pub base_url: Option<String>,

    /// Override the deployment model
    #[arg(long, env = "CANVAS_CHAT_MODEL")]
    pub model: Option<String>,

    /// Outbound request timeout in seconds
    #[arg(long, env = "CANVAS_CHAT_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,

    /// Largest accepted `/api/chat` body in bytes
    #[arg(long, env = "CANVAS_CHAT_MAX_BODY_BYTES", default_value_t = DEFAULT_CHAT_BODY_LIMIT)]
    pub max_body_bytes: usize,

    /// Honor the `model` field sent by clients
    #[arg(long, env = "CANVAS_CHAT_ALLOW_MODEL_OVERRIDE")]
    pub allow_model_override: bool,
}

impl Settings {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::BindAddress(addr))
    }

    pub fn frog_image_path(&self) -> PathBuf {
        self.static_dir.join(&self.frog_image)
    }

    /// Resolve the API key and assemble the provider configuration.
    pub fn provider_config(&self) -> Result<ProviderConfig, ConfigError> {
        let api_key = load_api_key(&self.config_file, self.provider.api_key_name())?;

        let mut config = ProviderConfig::new(api_key)
            .timeout(Duration::from_secs(self.timeout_secs))
            .allow_model_override(self.allow_model_override);
        if let Some(base_url) = &self.base_url {
            config = config.base_url(base_url);
        }
        if let Some(model) = &self.model {
            config = config.model(model);
        }
        Ok(config)
    }
}

/// Read `name` from the key file, falling back to the environment.
///
/// The file is matched loosely so a browser-side `config.js` such as
/// `const CONFIG = { NVIDIA_API_KEY: "nvapi-..." };` works unchanged.
pub fn load_api_key(path: &Path, name: &str) -> Result<String, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            if let Some(key) = find_key(&contents, name) {
                return Ok(key);
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    std::env::var(name)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ConfigError::MissingApiKey {
            name: name.to_string(),
            path: path.to_path_buf(),
        })
}

fn find_key(contents: &str, name: &str) -> Option<String> {
    let pattern = format!(r#"{}\s*[:=]\s*["']([^"']+)["']"#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    re.captures(contents)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_key_read_from_config_js() {
        let file = write_config(
            "const CONFIG = {\n  NVIDIA_API_KEY: \"nvapi-abc123\",\n  OTHER: 'x'\n};\n",
        );
        assert_eq!(
            load_api_key(file.path(), "NVIDIA_API_KEY").unwrap(),
            "nvapi-abc123"
        );
    }

    #[test]
    fn test_key_single_quotes_and_equals() {
        let file = write_config("ANTHROPIC_API_KEY = 'sk-ant-xyz'\n");
        assert_eq!(
            load_api_key(file.path(), "ANTHROPIC_API_KEY").unwrap(),
            "sk-ant-xyz"
        );
    }

    #[test]
    fn test_missing_key_is_fatal_error() {
        let file = write_config("const CONFIG = {};\n");
        let err = load_api_key(file.path(), "CANVAS_CHAT_TEST_KEY_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey { .. }));
        assert!(err.to_string().contains("CANVAS_CHAT_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_missing_file_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_api_key(&dir.path().join("absent.js"), "CANVAS_CHAT_TEST_KEY_THAT_IS_NEVER_SET")
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey { .. }));
    }

    #[test]
    fn test_settings_parse() {
        let settings = Settings::try_parse_from([
            "canvas-chat",
            "--provider",
            "native-messages",
            "--host",
            "127.0.0.1",
            "--port",
            "4000",
            "--static-dir",
            "public",
            "--timeout-secs",
            "5",
        ])
        .unwrap();
        assert_eq!(settings.provider, ProviderKind::NativeMessages);
        assert_eq!(settings.bind_addr().unwrap().port(), 4000);
        assert_eq!(settings.frog_image_path(), PathBuf::from("public").join("frog.png"));
        assert_eq!(settings.max_body_bytes, DEFAULT_CHAT_BODY_LIMIT);
    }

    #[test]
    fn test_provider_config_from_file() {
        let file = write_config("NVIDIA_API_KEY: \"nvapi-test\"");
        let settings = Settings::try_parse_from([
            "canvas-chat",
            "--provider",
            "openai-compatible",
            "--config-file",
            file.path().to_str().unwrap(),
            "--model",
            "meta/llama-3.3-70b-instruct",
            "--timeout-secs",
            "7",
        ])
        .unwrap();

        let config = settings.provider_config().unwrap();
        assert_eq!(config.api_key, "nvapi-test");
        assert_eq!(config.model.as_deref(), Some("meta/llama-3.3-70b-instruct"));
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert!(!config.allow_model_override);
    }
}
