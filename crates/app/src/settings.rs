use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level for the env filter (`info`, `debug`, ...).
    pub level: String,
}

/// Backing store for the ledger.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    /// In-memory store, lost on shutdown. Useful for local development.
    Memory,
    /// SQLite database file path.
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    /// Bind address; defaults to loopback when absent.
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    /// Base URL used in invite join links.
    pub join_link_base: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("SPLITEASE").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
