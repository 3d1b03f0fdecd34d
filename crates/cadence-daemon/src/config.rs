//! Daemon configuration: the command to run plus the engine schedule.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use cadence_core::Config;

/// Top-level daemon config (cadence.toml + CADENCE_* env overrides).
///
/// Nested keys use `__` in the environment, e.g.
/// `CADENCE_SCHEDULE__SUCCESS_DELAY_MS=-1`.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Program to execute on each scheduled run.
    pub command: String,
    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,
    /// Engine schedule: name, windows, delays.
    #[serde(default)]
    pub schedule: Config,
}

impl DaemonConfig {
    /// Load from `config_path` (or `./cadence.toml`) merged with
    /// `CADENCE_`-prefixed environment variables.
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let path = config_path.unwrap_or("cadence.toml");
        let config = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("CADENCE_").split("__"))
            .extract()?;
        Ok(config)
    }
}
