use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Environment prefix shared by every service (`APP_SERVER__PORT=9000`).
pub const ENV_PREFIX: &str = "APP";

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Load service settings from `<config_dir>/base.yaml` (optional) layered
/// under `APP_`-prefixed environment variables.
pub fn load<T: DeserializeOwned>(config_dir: &Path) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let settings = Cfg::builder()
        .add_source(File::from(config_dir.join("base.yaml")).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
