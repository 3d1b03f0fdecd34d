//! Engine configuration: the raw serde-facing [`Config`] and its validated
//! [`Schedule`] form.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::window::{TimeWindow, WindowSpec};

/// Name applied when a config omits one.
pub const DEFAULT_NAME: &str = "cadence";

/// Raw engine configuration as read from a file or built by a caller.
///
/// `success_delay_ms` / `failure_delay_ms` are signed: a negative value
/// means "do not continue" (stop after one success / fail without retrying),
/// zero means "run again immediately", positive values sleep that many
/// milliseconds before the next attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Task label used in log events. Empty → [`DEFAULT_NAME`].
    #[serde(default)]
    pub name: String,
    /// Daily windows during which the task should run. Empty → run
    /// continuously for the whole session.
    #[serde(default)]
    pub windows: Vec<WindowSpec>,
    /// Pause after a successful run, in milliseconds. Negative = one-shot.
    #[serde(default)]
    pub success_delay_ms: i64,
    /// Pause after a failed run, in milliseconds. Negative = fail fast.
    #[serde(default)]
    pub failure_delay_ms: i64,
}

impl Config {
    /// Validate into a [`Schedule`].
    ///
    /// Windows are parsed in order; the first bad one aborts the whole
    /// resolution with an error naming its position, so a schedule is
    /// either fully valid or not produced at all.
    pub fn resolve(&self) -> Result<Schedule, ConfigError> {
        let mut windows = Vec::with_capacity(self.windows.len());
        for (index, spec) in self.windows.iter().enumerate() {
            let window = TimeWindow::from_spec(spec)
                .map_err(|source| ConfigError::Window { index, source })?;
            windows.push(window);
        }
        let name = if self.name.is_empty() {
            DEFAULT_NAME.to_string()
        } else {
            self.name.clone()
        };
        Ok(Schedule {
            name,
            windows,
            on_success: Delay::from_millis(self.success_delay_ms),
            on_failure: Delay::from_millis(self.failure_delay_ms),
        })
    }
}

/// A validated, immutable schedule as installed in the engine.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub name: String,
    pub windows: Vec<TimeWindow>,
    pub on_success: Delay,
    pub on_failure: Delay,
}

/// What to do between task invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    /// Do not continue (negative input value).
    Stop,
    /// Sleep this long, then run again. Zero means continue immediately.
    After(Duration),
}

impl Delay {
    pub fn from_millis(ms: i64) -> Self {
        if ms < 0 {
            Delay::Stop
        } else {
            Delay::After(Duration::from_millis(ms as u64))
        }
    }
}
