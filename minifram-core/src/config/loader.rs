use super::app::{AgentConfig, AppConfig, HttpConfig, InferenceConfig};
use super::defaults::*;
use super::error::ConfigError;
use super::server::{RawServer, ServerConfig};
use dotenvy::from_filename;
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tracing::{debug, info, warn};

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(super) struct RawConfig {
    pub inference: RawInference,
    pub server: RawHttp,
    pub agent: RawAgent,
    pub servers: Vec<RawServer>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(super) struct RawInference {
    pub endpoint: Option<String>,
    pub api_path: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(super) struct RawHttp {
    pub addr: Option<String>,
    pub public_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(super) struct RawAgent {
    pub completion_tool: Option<bool>,
    pub transcript_dir: Option<String>,
}

/// Ensures environment variables are loaded from `config/.env` and `.env`
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(DEFAULT_ENV_FILE);
        let _ = dotenvy::dotenv();
    });
}

/// Load and validate configuration from a file path
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    let raw = match path {
        Some(path) => read_config(path)?,
        None => match read_config(Path::new(DEFAULT_CONFIG_PATH)) {
            Err(ConfigError::NotFound { path }) => {
                info!(path = %path.display(), "no configuration file; using defaults");
                RawConfig::default()
            }
            other => other?,
        },
    };
    let raw = apply_env_overrides(raw, |key| env::var(key).ok());
    validate_and_build(raw)
}

/// Resolve the API key named by `[inference] api_key`.
pub fn resolve_api_key(spec: Option<&str>) -> Option<String> {
    let raw = spec.map(str::trim).filter(|raw| !raw.is_empty())?;
    match env::var(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(env_var = raw, %err, "API key environment variable is not set");
            None
        }
    }
}

fn read_config(path: &Path) -> Result<RawConfig, ConfigError> {
    debug!(path = %path.display(), "Reading configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub(super) fn apply_env_overrides<F>(mut raw: RawConfig, lookup: F) -> RawConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|value| !value.trim().is_empty()) {
        raw.inference.endpoint = Some(endpoint);
        raw.inference.api_path = Some(String::new());
    }
    if let Some(model) = lookup(ENV_MODEL).filter(|value| !value.trim().is_empty()) {
        raw.inference.model = Some(model);
    }
    raw
}

pub(super) fn validate_and_build(raw: RawConfig) -> Result<AppConfig, ConfigError> {
    let endpoint = raw
        .inference
        .endpoint
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    if endpoint.trim().is_empty() {
        return Err(ConfigError::MissingEndpoint);
    }
    let model = raw
        .inference
        .model
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    if model.trim().is_empty() {
        return Err(ConfigError::MissingModel);
    }
    let inference = InferenceConfig {
        endpoint,
        api_path: raw
            .inference
            .api_path
            .unwrap_or_else(|| DEFAULT_API_PATH.to_string()),
        model,
        api_key: raw.inference.api_key.filter(|key| !key.trim().is_empty()),
        timeout: Duration::from_secs(
            raw.inference
                .timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        ),
    };

    let addr_text = raw
        .server
        .addr
        .unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string());
    let addr: SocketAddr = addr_text
        .parse()
        .map_err(|source| ConfigError::InvalidAddr {
            addr: addr_text.clone(),
            source,
        })?;
    let http = HttpConfig {
        addr,
        public_url: raw
            .server
            .public_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_string()),
    };

    let agent = AgentConfig {
        completion_tool: raw.agent.completion_tool.unwrap_or(true),
        transcript_dir: PathBuf::from(
            raw.agent
                .transcript_dir
                .unwrap_or_else(|| DEFAULT_TRANSCRIPT_DIR.to_string()),
        ),
    };

    let mut seen = HashSet::new();
    let mut servers = Vec::with_capacity(raw.servers.len());
    for (index, server) in raw.servers.into_iter().enumerate() {
        if server.name.trim().is_empty() {
            return Err(ConfigError::InvalidServer {
                index,
                field: "name",
            });
        }
        if server.command.trim().is_empty() {
            return Err(ConfigError::InvalidServer {
                index,
                field: "command",
            });
        }
        if !seen.insert(server.name.clone()) {
            return Err(ConfigError::DuplicateServer { name: server.name });
        }
        servers.push(ServerConfig::from(server));
    }

    Ok(AppConfig {
        inference,
        http,
        agent,
        servers,
    })
}
