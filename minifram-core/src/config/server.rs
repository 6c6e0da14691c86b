use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Launch description of one external tool server.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn new(name: impl Into<String>, command: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            workdir: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawServer {
    pub(crate) name: String,
    pub(crate) command: String,
    #[serde(default)]
    pub(crate) args: Vec<String>,
    #[serde(default)]
    pub(crate) env: HashMap<String, String>,
    pub(crate) workdir: Option<String>,
}

impl From<RawServer> for ServerConfig {
    fn from(raw: RawServer) -> Self {
        let expand = |s: &str| -> String {
            shellexpand::full(s)
                .map(|cow| cow.into_owned())
                .unwrap_or_else(|_| s.to_string())
        };

        Self {
            name: raw.name,
            command: PathBuf::from(expand(&raw.command)),
            args: raw.args.iter().map(|arg| expand(arg)).collect(),
            env: raw
                .env
                .into_iter()
                .map(|(key, value)| (key, expand(&value)))
                .collect(),
            workdir: raw.workdir.map(|dir| PathBuf::from(expand(&dir))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn expands_env_vars_in_command_and_args() {
        unsafe {
            env::set_var("MINIFRAM_TEST_ROOT", "/opt/tools");
            env::set_var("MINIFRAM_TEST_ARG", "verbose");
        }

        let raw = RawServer {
            name: "files".to_string(),
            command: "${MINIFRAM_TEST_ROOT}/server".to_string(),
            args: vec!["--mode".to_string(), "${MINIFRAM_TEST_ARG}".to_string()],
            env: HashMap::from([("ROOT".to_string(), "$MINIFRAM_TEST_ROOT".to_string())]),
            workdir: Some("${MINIFRAM_TEST_ROOT}/work".to_string()),
        };

        let config = ServerConfig::from(raw);

        assert_eq!(config.command, PathBuf::from("/opt/tools/server"));
        assert_eq!(config.args, vec!["--mode", "verbose"]);
        assert_eq!(config.env.get("ROOT").map(String::as_str), Some("/opt/tools"));
        assert_eq!(config.workdir, Some(PathBuf::from("/opt/tools/work")));

        unsafe {
            env::remove_var("MINIFRAM_TEST_ROOT");
            env::remove_var("MINIFRAM_TEST_ARG");
        }
    }

    #[test]
    fn leaves_unknown_variables_untouched() {
        let raw = RawServer {
            name: "echo".to_string(),
            command: "${MINIFRAM_SURELY_UNSET_VAR}/bin".to_string(),
            args: Vec::new(),
            env: HashMap::new(),
            workdir: None,
        };
        let config = ServerConfig::from(raw);
        assert_eq!(
            config.command,
            PathBuf::from("${MINIFRAM_SURELY_UNSET_VAR}/bin")
        );
    }
}
