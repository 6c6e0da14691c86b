pub mod app;
pub mod defaults;
pub mod error;
pub mod loader;
pub mod server;

pub use app::{AgentConfig, AppConfig, HttpConfig, InferenceConfig};
pub use defaults::DEFAULT_CONFIG_PATH;
pub use error::ConfigError;
pub use loader::{ensure_env_loaded, resolve_api_key};
pub use server::ServerConfig;
