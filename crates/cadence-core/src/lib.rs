//! `cadence-core` — configuration and time-window primitives for the cadence
//! recurring-task engine.
//!
//! This crate is deliberately free of async machinery: it holds the value
//! types the engine validates and reads (clock times, daily windows, delay
//! policy) so they stay independently testable.

pub mod config;
pub mod error;
pub mod window;

pub use config::{Config, Delay, Schedule, DEFAULT_NAME};
pub use error::{ConfigError, Result, WindowError};
pub use window::{ClockTime, TimeWindow, WindowSpec, WindowStatus};
