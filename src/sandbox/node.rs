//! Node.js subprocess sandbox.
//!
//! Writes the candidate program to a scratch directory and runs it under
//! `node`, piping the example input to stdin.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use uuid::Uuid;

use super::{ExecutionSandbox, RunOutput, SandboxSpawner};

const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(10);

/// Sanitize program output to be safe for downstream text handling.
/// Removes binary garbage while preserving valid text.
fn sanitize_output(bytes: &[u8]) -> String {
    let non_printable_count = bytes
        .iter()
        .filter(|&&b| b < 0x20 && b != b'\n' && b != b'\r' && b != b'\t')
        .count();

    // If more than 10% is non-printable (excluding newlines/tabs), it's likely binary
    if bytes.len() > 100 && non_printable_count > bytes.len() / 10 {
        return format!("[Binary output - {} bytes]", bytes.len());
    }

    let text = String::from_utf8_lossy(bytes);
    text.chars()
        .filter(|&c| c == '\n' || c == '\r' || c == '\t' || (c >= ' ' && c != '\u{FFFD}'))
        .collect()
}

/// Sandbox running candidate programs under a local `node` binary.
pub struct NodeSandbox {
    dir: PathBuf,
    program: Option<PathBuf>,
    timeout: Duration,
}

impl NodeSandbox {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_RUN_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let dir = std::env::temp_dir().join(format!("snapsolve-{}", Uuid::new_v4()));
        Self {
            dir,
            program: None,
            timeout,
        }
    }
}

impl Default for NodeSandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionSandbox for NodeSandbox {
    async fn load(&mut self, code: &str) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join("main.js");
        tokio::fs::write(&path, code).await?;
        tracing::debug!("Loaded program into sandbox at {}", path.display());
        self.program = Some(path);
        Ok(())
    }

    async fn run(&mut self, input: &str) -> anyhow::Result<RunOutput> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No program loaded"))?;

        let mut cmd = Command::new("node");
        cmd.arg(program)
            .current_dir(&self.dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to start node: {}", e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .await
                .map_err(|e| anyhow::anyhow!("Failed to write to stdin: {}", e))?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output()).await;

        match output {
            Ok(Ok(output)) => Ok(RunOutput {
                stdout: sanitize_output(&output.stdout),
                stderr: sanitize_output(&output.stderr),
            }),
            Ok(Err(e)) => Err(anyhow::anyhow!("Failed to execute program: {}", e)),
            Err(_) => Err(anyhow::anyhow!(
                "Program timed out after {} seconds",
                self.timeout.as_secs_f64()
            )),
        }
    }
}

impl Drop for NodeSandbox {
    fn drop(&mut self) {
        if self.program.is_some() {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }
}

/// Spawner handing out fresh Node sandboxes.
#[derive(Debug, Clone, Default)]
pub struct NodeSpawner {
    timeout: Option<Duration>,
}

impl NodeSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

impl SandboxSpawner for NodeSpawner {
    fn spawn(&self) -> Box<dyn ExecutionSandbox> {
        match self.timeout {
            Some(t) => Box::new(NodeSandbox::with_timeout(t)),
            None => Box::new(NodeSandbox::new()),
        }
    }
}
