//! Per-request upload state shared by intake, validation and the relay client.

use crate::services::metrics;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// Metadata fields forwarded to the inference service. Everything else in
/// the form is dropped at intake.
pub const FORWARDED_FIELDS: [&str; 3] = ["goal", "duration", "user_id"];

/// A parsed upload: allow-listed metadata plus the spooled image.
#[derive(Debug)]
pub struct UploadRequest {
    pub metadata: HashMap<String, String>,
    pub attachment: Attachment,
}

impl UploadRequest {
    /// Metadata in forwarding order.
    pub fn forwarded_fields(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        FORWARDED_FIELDS
            .into_iter()
            .filter_map(move |key| self.metadata.get(key).map(|value| (key, value.as_str())))
    }

    /// Delete the spooled file now instead of waiting for drop.
    pub fn release(mut self) {
        self.attachment.release();
    }
}

/// The uploaded image and the temporary file holding its bytes.
///
/// The file is deleted exactly once: by [`Attachment::release`], or on drop
/// if the request unwinds before reaching it.
#[derive(Debug)]
pub struct Attachment {
    pub original_name: String,
    pub size_bytes: u64,
    spool: Option<NamedTempFile>,
}

impl Attachment {
    /// Create an empty, uniquely named spool file in `dir`.
    pub fn spool(original_name: impl Into<String>, dir: &Path) -> io::Result<Self> {
        let spool = tempfile::Builder::new()
            .prefix("relay-upload-")
            .tempfile_in(dir)?;
        metrics::spooled_upload_created();

        Ok(Self {
            original_name: original_name.into(),
            size_bytes: 0,
            spool: Some(spool),
        })
    }

    /// Location of the spooled bytes, `None` once released.
    pub fn temp_path(&self) -> Option<&Path> {
        self.spool.as_ref().map(NamedTempFile::path)
    }

    /// Open a fresh handle on the spool file, positioned at the start.
    pub fn open(&self) -> io::Result<tokio::fs::File> {
        let spool = self.spool.as_ref().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "upload has already been released")
        })?;
        Ok(tokio::fs::File::from_std(spool.reopen()?))
    }

    pub fn release(&mut self) {
        let Some(spool) = self.spool.take() else {
            return;
        };
        metrics::spooled_upload_released();

        let path = spool.path().to_path_buf();
        match spool.close() {
            Ok(()) => tracing::debug!(path = %path.display(), "Spooled upload removed"),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove spooled upload"
            ),
        }
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.release();
    }
}
