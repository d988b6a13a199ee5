use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub gateway: Gateway,
    pub status: Status,
    pub actuator: Actuator,
    pub imaging: Imaging,
    pub upload: Upload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Gateway {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub reconnect_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Actuator {
    /// Local bus port; autodetected when absent.
    pub port_path: Option<String>,
    pub baud_rate: u32,
    /// Settle time between a value request and the reply poll.
    pub settle_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Imaging {
    pub source_path: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Upload {
    pub url: String,
    /// Hard ceiling on one image POST; the upload shares the hub's only
    /// loop and must not stall it.
    pub timeout_secs: u64,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let builder = Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{}", run_mode)).required(false))
            .add_source(Environment::default().separator("__"));

        builder.build()?.try_deserialize()
    }
}
