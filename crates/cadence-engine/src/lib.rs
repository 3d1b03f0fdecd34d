//! `cadence-engine` — a cron-like recurring-task engine for long-running
//! processes.
//!
//! # Overview
//!
//! An [`Engine`] repeatedly invokes one logical [`Task`], optionally
//! confined to daily time windows (which may wrap past midnight), with
//! configurable pauses after successful and failed runs. The configuration
//! can be swapped while a schedule is active; new values apply from the
//! next loop iteration.
//!
//! | Windows configured | Behaviour |
//! |--------------------|-----------|
//! | none               | the task loop runs for the whole session |
//! | one or more        | membership is polled once per minute; the task runs only inside the active window |
//!
//! Delays are signed milliseconds: negative means "stop instead of
//! continuing", zero means "run again immediately".
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cadence_core::Config;
//! use cadence_engine::{Engine, TaskFn};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> cadence_engine::Result<()> {
//! let engine = Engine::new(Config {
//!     name: "heartbeat".into(),
//!     success_delay_ms: 30_000,
//!     ..Config::default()
//! })?;
//!
//! let task = Arc::new(TaskFn::new(|_cancel| async {
//!     println!("beep");
//!     anyhow::Ok(())
//! }));
//! engine.start(CancellationToken::new(), task).await
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod task;

pub use engine::Engine;
pub use error::{EngineError, Result};
pub use task::{Task, TaskFn};
