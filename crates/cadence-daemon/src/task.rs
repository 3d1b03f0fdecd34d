//! Shell-command task: the daemon's unit of work.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use cadence_engine::Task;

/// Runs a configured program once per scheduled invocation.
///
/// Exit status 0 is success; a non-zero status or a spawn failure is a task
/// failure and goes through the engine's failure-delay policy. If the window
/// closes while the command is still running, the child is killed.
pub struct CommandTask {
    program: String,
    args: Vec<String>,
}

impl CommandTask {
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }
}

#[async_trait]
impl Task for CommandTask {
    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .spawn()
            .map_err(|e| anyhow::anyhow!("failed to spawn {}: {e}", self.program))?;

        let waited = tokio::select! {
            status = child.wait() => Some(status),
            _ = cancel.cancelled() => None,
        };
        match waited {
            Some(status) => {
                let status = status?;
                if !status.success() {
                    anyhow::bail!("{} exited with {status}", self.program);
                }
                debug!(program = %self.program, "command completed");
                Ok(())
            }
            None => {
                let _ = child.kill().await;
                anyhow::bail!("cancelled while {} was running", self.program);
            }
        }
    }
}
