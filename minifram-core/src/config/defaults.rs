pub const DEFAULT_CONFIG_PATH: &str = "config/minifram.toml";
pub const DEFAULT_ENV_FILE: &str = "config/.env";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";
pub const DEFAULT_API_PATH: &str = "/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "glm-4";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8101";
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:8101";

pub const DEFAULT_COMPLETION_TOOL: &str = "agent_complete";
pub const DEFAULT_TRANSCRIPT_DIR: &str = "logs";

/// Full chat-completions URL; overrides `[inference] endpoint` and `api_path`.
pub const ENV_ENDPOINT: &str = "LLM_ENDPOINT";
pub const ENV_MODEL: &str = "LLM_MODEL";
