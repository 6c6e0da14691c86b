use super::defaults::*;
use super::error::ConfigError;
use super::server::ServerConfig;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration loaded from `minifram.toml`
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub inference: InferenceConfig,
    pub http: HttpConfig,
    pub agent: AgentConfig,
    pub servers: Vec<ServerConfig>,
}

impl AppConfig {
    /// Load configuration from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields the built-in defaults; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            http: HttpConfig::default(),
            agent: AgentConfig::default(),
            servers: Vec::new(),
        }
    }
}

/// OpenAI-compatible inference backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceConfig {
    pub endpoint: String,
    /// Appended to `endpoint`; empty when `endpoint` is already the full URL.
    pub api_path: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl InferenceConfig {
    pub fn url(&self) -> String {
        if self.api_path.is_empty() {
            return self.endpoint.clone();
        }
        let base = self.endpoint.trim_end_matches('/');
        let path = self.api_path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub addr: SocketAddr,
    /// Externally reachable base URL, used to build payload links.
    pub public_url: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8101)),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Offer the completion tool and describe it in the system prompt.
    pub completion_tool: bool,
    pub transcript_dir: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            completion_tool: true,
            transcript_dir: PathBuf::from(DEFAULT_TRANSCRIPT_DIR),
        }
    }
}
