use serde::Deserialize;
use service_core::config::{self as core_config, ServerConfig};
use service_core::error::AppError;
use std::path::PathBuf;
use std::time::Duration;

/// Well-known variable holding the inference service base URL. Takes
/// precedence over `upstream.base_url` from file or `APP_` variables.
pub const UPSTREAM_URL_ENV: &str = "INFERENCE_API_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelaySettings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamSettings,
    #[serde(default)]
    pub intake: IntakeSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSettings {
    /// Base URL of the inference service, e.g. `https://inference.internal:5000`.
    /// Left unset, the relay still starts but refuses every relay request.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Upper bound on a whole upstream exchange, response body included.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl UpstreamSettings {
    /// The configured base URL without surrounding whitespace or a trailing
    /// slash. Blank values count as unset.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .map(|url| url.strip_suffix('/').unwrap_or(url))
            .filter(|url| !url.is_empty())
    }

    /// Replace the base URL with `url` unless it is blank, so an empty
    /// `INFERENCE_API_URL` leaves file or `APP_` settings in place.
    pub fn apply_url_override(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|url| !url.trim().is_empty()) {
            self.base_url = Some(url);
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntakeSettings {
    /// Request body limit for the relay routes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Directory for spooled uploads; the OS temp dir when unset.
    #[serde(default)]
    pub spool_dir: Option<PathBuf>,
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for IntakeSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            spool_dir: None,
        }
    }
}

impl IntakeSettings {
    pub fn spool_dir(&self) -> PathBuf {
        self.spool_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

pub fn get_configuration() -> Result<RelaySettings, AppError> {
    let base_path = std::env::current_dir().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!(
            "Failed to determine the current directory: {}",
            e
        ))
    })?;

    // Support running from the workspace root or from the crate directory
    let configuration_directory = if base_path.ends_with("inference-relay") {
        base_path.join("config")
    } else {
        base_path.join("inference-relay").join("config")
    };

    let mut settings: RelaySettings = core_config::load(&configuration_directory)?;

    settings
        .upstream
        .apply_url_override(std::env::var(UPSTREAM_URL_ENV).ok());

    Ok(settings)
}
