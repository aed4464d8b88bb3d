//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml`, then overridden by `BOOKKEEPER__*` environment
//! variables (for example `BOOKKEEPER__APP__LEVEL=debug`).
use config::{Config, ConfigError, Environment, File};
use engine::PlanLimits;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("./bookkeeper.db".to_string())
    }
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Self::Memory => String::from("sqlite::memory:"),
            Self::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Attachments {
    pub dir: String,
}

impl Default for Attachments {
    fn default() -> Self {
        Self {
            dir: "./attachments".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Plans {
    pub free_cap: u32,
    pub essential_cap: u32,
}

impl Default for Plans {
    fn default() -> Self {
        let limits = PlanLimits::default();
        Self {
            free_cap: limits.free,
            essential_cap: limits.essential,
        }
    }
}

impl From<&Plans> for PlanLimits {
    fn from(plans: &Plans) -> Self {
        Self {
            free: plans.free_cap,
            essential: plans.essential_cap,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub attachments: Attachments,
    pub plans: Plans,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("BOOKKEEPER").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
