mod cli;

use clap::Parser;
use cli::{Cli, Command};
use minifram_core::agent::{
    AgentRunner, AgentService, AgentStore, COMPLETION_TOOL_DESCRIPTION, CompletionTool,
    FileTranscriptSink, OutputEmitter, RunnerSettings, completion_tool_schema,
};
use minifram_core::config::defaults::DEFAULT_COMPLETION_TOOL;
use minifram_core::model::OpenAIClient;
use minifram_core::tooling::ToolRouter;
use minifram_core::{AppConfig, server};
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    debug!(command = ?cli.command, config = ?cli.config, "CLI arguments parsed");

    let config = AppConfig::load(cli.config.as_deref())?;
    info!(
        model = %config.inference.model,
        endpoint = %config.inference.url(),
        servers = config.servers.len(),
        "Configuration loaded"
    );

    let store = Arc::new(AgentStore::new());
    let tools = Arc::new(ToolRouter::new());
    let completion_tool = register_completion_tool(&config, &store, &tools).await?;

    let load = tools.load_external(&config.servers).await;
    for failed in &load.failed {
        warn!(server = %failed.name, error = %failed.error, "Tool server unavailable");
    }
    info!(
        started = load.started.len(),
        failed = load.failed.len(),
        conflicts = load.conflicts.len(),
        "Tool servers loaded"
    );

    let runner = Arc::new(AgentRunner::new(
        Arc::new(OpenAIClient::from_config(&config.inference)),
        tools.clone(),
        Arc::new(FileTranscriptSink::new(config.agent.transcript_dir.clone())),
        RunnerSettings {
            model: config.inference.model.clone(),
            completion_tool,
        },
    ));
    let service = AgentService::new(store, runner, config.http.public_url.clone());

    let result = match cli.command {
        Command::Serve { addr } => {
            let addr = addr.unwrap_or(config.http.addr);
            server::serve(service, addr, shutdown_signal())
                .await
                .map_err(Into::into)
        }
        Command::Run { contract } => run_headless(&service, contract).await,
    };

    tools.shutdown().await;
    info!("minifram finished");
    result
}

async fn register_completion_tool(
    config: &AppConfig,
    store: &Arc<AgentStore>,
    tools: &ToolRouter,
) -> Result<Option<String>, Box<dyn Error>> {
    if !config.agent.completion_tool {
        return Ok(None);
    }
    tools
        .register_internal(
            DEFAULT_COMPLETION_TOOL,
            COMPLETION_TOOL_DESCRIPTION,
            completion_tool_schema(),
            CompletionTool::new(store.clone(), config.http.public_url.clone()),
        )
        .await?;
    Ok(Some(DEFAULT_COMPLETION_TOOL.to_string()))
}

async fn run_headless(service: &AgentService, contract: String) -> Result<(), Box<dyn Error>> {
    let report = service.create().await;
    let id = report.agent_id;
    service.set_contract(&id, contract).await?;
    let mut run = service.start(&id, OutputEmitter::Recording).await?;
    info!(agent_id = %id, "Headless run started");

    let status = tokio::select! {
        joined = &mut run => joined?,
        _ = shutdown_signal() => {
            warn!(agent_id = %id, "Interrupted; stopping agent");
            service.stop(&id).await?;
            (&mut run).await?
        }
    };
    info!(agent_id = %id, %status, "Headless run finished");

    let view = service.view(&id).await?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn init_tracing(level: Option<&str>) {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = match level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        };
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .init();
    });
}
