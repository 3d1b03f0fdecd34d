//! cadence daemon: runs one configured command on a recurring schedule.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod config;
mod task;

use cadence_engine::{Engine, EngineError};
use config::DaemonConfig;
use task::CommandTask;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence=info,cadence_engine=debug".into()),
        )
        .init();

    // config path: CADENCE_CONFIG env > ./cadence.toml
    let config_path = std::env::var("CADENCE_CONFIG").ok();
    let config = DaemonConfig::load(config_path.as_deref())?;

    let engine = Engine::new(config.schedule.clone())?;
    let task = Arc::new(CommandTask::new(config.command.clone(), config.args.clone()));

    let root = CancellationToken::new();

    // Ctrl-C stops both modes: shutdown ends a window-polling session, and
    // cancelling the root token reaches a continuous-mode run loop.
    {
        let engine = engine.clone();
        let root = root.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received; shutting down");
                engine.shutdown();
                root.cancel();
            }
        });
    }

    info!(command = %config.command, "cadence daemon starting");
    match engine.start(root, task).await {
        Ok(()) | Err(EngineError::Cancelled) => {
            info!("cadence daemon stopped");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
