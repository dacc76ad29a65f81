use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

const PRODUCTION: &str = "prod";

/// Settings shared by every service binary.
///
/// Loaded from an optional `configuration` file, then `APP__*` variables.
/// `environment` defaults to the plain `ENVIRONMENT` variable, or `dev`.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_port() -> u16 {
    8080
}

fn default_environment() -> String {
    "dev".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            environment: default_environment(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| default_environment());

        let config = Cfg::builder()
            .set_default("environment", environment)?
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// In production every service setting must be set explicitly.
    pub fn is_production(&self) -> bool {
        self.environment == PRODUCTION
    }
}
