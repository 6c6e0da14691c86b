use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "minifram",
    version,
    about = "Autonomous agents that pursue a contract with model inference and tools"
)]
pub struct Cli {
    /// Configuration file (defaults to config/minifram.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Log filter, e.g. `debug` or `minifram_core=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the REST, WebSocket and JSON-RPC endpoints
    Serve {
        /// Listen address (overrides [server].addr)
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
    /// Run one agent headless and print its final state as JSON
    Run {
        #[arg(long)]
        contract: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_with_address() {
        let cli = Cli::parse_from(["minifram", "serve", "--addr", "0.0.0.0:9000"]);
        match cli.command {
            Command::Serve { addr } => assert_eq!(addr, Some("0.0.0.0:9000".parse().unwrap())),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::parse_from([
            "minifram",
            "run",
            "--contract",
            "list the files",
            "--config",
            "custom.toml",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Command::Run { contract } if contract == "list the files"));
    }

    #[test]
    fn run_requires_contract() {
        assert!(Cli::try_parse_from(["minifram", "run"]).is_err());
    }
}
