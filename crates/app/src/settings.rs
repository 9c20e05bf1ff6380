//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and overridden by `FLEETBOOK__*` environment
//! variables (`FLEETBOOK__SERVER__PORT=8080`).
//!
//! See `settings.toml` for the configuration.
use config::{Config, ConfigError, Environment, File};
use engine::{AssignmentGuard, CancelPolicy, ReassignPolicy};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("./fleetbook.db".to_string())
    }
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: None,
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

/// Engine knobs. Policies use their snake_case names, e.g.
/// `cancel_policy = "preserve_out_of_service"`.
#[derive(Debug, Default, Deserialize)]
pub struct EngineSettings {
    /// IANA name used for report periods; UTC when missing.
    pub timezone: Option<String>,
    pub invoice_prefix: Option<String>,
    #[serde(default)]
    pub cancel_policy: CancelPolicy,
    #[serde(default)]
    pub reassign_policy: ReassignPolicy,
    #[serde(default)]
    pub assignment_guard: AssignmentGuard,
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub engine: EngineSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("FLEETBOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
