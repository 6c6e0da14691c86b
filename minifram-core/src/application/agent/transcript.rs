use crate::domain::Agent;
use async_trait::async_trait;
use chrono::{Local, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Durable storage for finished runs.
#[async_trait]
pub trait TranscriptSink: Send + Sync {
    /// Persist the agent's output history; returns where it was written.
    async fn persist(&self, agent: &Agent) -> io::Result<Option<PathBuf>>;
}

/// Plain-text transcript of an agent's run.
pub fn render_transcript(agent: &Agent) -> String {
    let rule = "=".repeat(60);
    let mut lines = vec![
        format!("Agent: {}", agent.id()),
        format!("Status: {}", agent.status()),
        format!("Created: {}", agent.created_at().to_rfc3339()),
        format!("Contract:\n{}", agent.contract),
        String::new(),
        rule.clone(),
        "Output:".to_string(),
        rule,
        String::new(),
    ];
    for entry in agent.output() {
        let ts = entry.created_at.with_timezone(&Local).format("%H:%M:%S");
        match &entry.tool_call {
            Some(display) => lines.push(format!("[{ts}] [Tool: {display}]")),
            None => lines.push(format!("[{ts}] [{}] {}", entry.kind.as_str(), entry.content)),
        }
    }
    lines.join("\n")
}

/// Writes `<dir>/<agent_id>_<YYYYmmdd_HHMMSS>.log`.
pub struct FileTranscriptSink {
    dir: PathBuf,
}

impl FileTranscriptSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl TranscriptSink for FileTranscriptSink {
    async fn persist(&self, agent: &Agent) -> io::Result<Option<PathBuf>> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let stamp = Utc::now().with_timezone(&Local).format("%Y%m%d_%H%M%S");
        let path = self.dir.join(format!("{}_{stamp}.log", agent.id()));
        tokio::fs::write(&path, render_transcript(agent)).await?;
        debug!(agent_id = %agent.id(), path = %path.display(), "transcript written");
        Ok(Some(path))
    }
}

/// Discards transcripts.
pub struct NoopTranscriptSink;

#[async_trait]
impl TranscriptSink for NoopTranscriptSink {
    async fn persist(&self, _agent: &Agent) -> io::Result<Option<PathBuf>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentStatus, OutputKind};

    fn finished_agent() -> Agent {
        let mut agent = Agent::new("agent-5");
        agent.contract = "list files".into();
        agent.transition(AgentStatus::Running).expect("running");
        agent.add_output(OutputKind::ToolCall, "", Some("ls path=/tmp".into()));
        agent.add_output(OutputKind::ToolResult, "→ a.txt", None);
        agent.transition(AgentStatus::Completed).expect("completed");
        agent
    }

    #[test]
    fn renders_header_and_entries() {
        let text = render_transcript(&finished_agent());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Agent: agent-5");
        assert_eq!(lines[1], "Status: completed");
        assert!(lines[2].starts_with("Created: "));
        assert_eq!(lines[3], "Contract:");
        assert_eq!(lines[4], "list files");
        assert!(lines.iter().any(|line| line.ends_with("[Tool: ls path=/tmp]")));
        assert!(lines.iter().any(|line| line.ends_with("[tool_result] → a.txt")));
    }

    #[tokio::test]
    async fn file_sink_writes_into_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = FileTranscriptSink::new(dir.path().join("logs"));
        let path = sink
            .persist(&finished_agent())
            .await
            .expect("persist")
            .expect("path");
        let name = path.file_name().and_then(|n| n.to_str()).expect("name");
        assert!(name.starts_with("agent-5_"));
        assert!(name.ends_with(".log"));
        let written = std::fs::read_to_string(&path).expect("read back");
        assert!(written.contains("Agent: agent-5"));
    }
}
