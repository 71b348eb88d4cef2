pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod startup;

use crate::config::{RelaySettings, UPSTREAM_URL_ENV};
use crate::error::RelayError;
use crate::services::InferenceClient;
use service_core::error::AppError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared application state. Nothing in here is mutated per request.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no upstream base URL is configured.
    pub client: Option<Arc<InferenceClient>>,
    pub spool_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(client: Option<Arc<InferenceClient>>, spool_dir: PathBuf) -> Self {
        Self {
            client,
            spool_dir: Arc::new(spool_dir),
        }
    }

    pub fn from_settings(settings: &RelaySettings) -> Result<Self, AppError> {
        let client = match settings.upstream.base_url() {
            Some(base_url) => {
                tracing::info!(
                    upstream = %base_url,
                    timeout_secs = settings.upstream.timeout_secs,
                    "Relaying to inference service"
                );
                Some(Arc::new(InferenceClient::new(base_url, &settings.upstream)?))
            }
            None => {
                tracing::warn!(
                    "{} is not set; relay routes will report a configuration error",
                    UPSTREAM_URL_ENV
                );
                None
            }
        };

        let spool_dir = settings.intake.spool_dir();
        std::fs::create_dir_all(&spool_dir)?;

        Ok(Self::new(client, spool_dir))
    }

    pub fn client(&self) -> Result<&InferenceClient, RelayError> {
        self.client
            .as_deref()
            .ok_or(RelayError::ConfigurationMissing)
    }

    pub fn spool_dir(&self) -> &Path {
        &self.spool_dir
    }
}
