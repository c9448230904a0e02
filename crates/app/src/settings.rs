//! Application settings.
//!
//! Loaded from `porteria.toml` (optional) layered with `PORTERIA_*`
//! environment overrides, e.g. `PORTERIA_SERVER__PORT=8080`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
}

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level filter for all porteria crates.
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    /// Where attachment files are stored; defaults to `attachments/`.
    pub attachments_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("app.level", "info")?
            .add_source(File::with_name("porteria").required(false))
            .add_source(Environment::with_prefix("PORTERIA").separator("__"))
            .build()?
            .try_deserialize()
    }
}
