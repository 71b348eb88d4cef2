//! Shared setup for relay integration tests: a relay bound to an ephemeral
//! port with its own spool directory.

#![allow(dead_code)]

use inference_relay::config::{IntakeSettings, RelaySettings, UpstreamSettings};
use inference_relay::startup::Application;
use reqwest::multipart::{Form, Part};
use service_core::config::ServerConfig;
use tempfile::TempDir;

pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub spool_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn(upstream: Option<String>) -> Self {
        Self::spawn_with_timeout(upstream, 20).await
    }

    pub async fn spawn_with_timeout(upstream: Option<String>, timeout_secs: u64) -> Self {
        let spool_dir = tempfile::tempdir().expect("Failed to create spool dir");

        let settings = RelaySettings {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port for testing
            },
            upstream: UpstreamSettings {
                base_url: upstream,
                timeout_secs,
                connect_timeout_secs: 2,
            },
            intake: IntakeSettings {
                max_upload_bytes: MAX_UPLOAD_BYTES,
                spool_dir: Some(spool_dir.path().to_path_buf()),
            },
        };

        let app = Application::build(settings)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(app.run_until_stopped());

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            port,
            spool_dir,
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Files currently left in the spool directory.
    pub fn spooled_files(&self) -> usize {
        std::fs::read_dir(self.spool_dir.path())
            .expect("Failed to read spool dir")
            .count()
    }

    pub async fn post_form(&self, path: &str, form: Form) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

/// Fake PNG payload: the real signature followed by filler.
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.resize(len.max(bytes.len()), b'x');
    bytes
}

pub fn image_form(file_name: &str, bytes: Vec<u8>) -> Form {
    Form::new().part(
        "image",
        Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .unwrap(),
    )
}

pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
