use crate::error::RelayError;
use crate::models::{Attachment, UploadRequest, FORWARDED_FIELDS, IMAGE_FIELD};
use anyhow::Context;
use axum::extract::multipart::{Field, Multipart, MultipartError};
use std::collections::HashMap;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Read a multipart body into an [`UploadRequest`], spooling the image to
/// `spool_dir`.
///
/// Only the first `image` part carrying a filename is kept; later ones are
/// skipped, and a plain text part named `image` does not count as a file.
/// Metadata outside [`FORWARDED_FIELDS`] is ignored, and a repeated field
/// keeps its first non-empty value.
pub async fn read_upload(
    mut multipart: Multipart,
    spool_dir: &Path,
) -> Result<UploadRequest, RelayError> {
    let mut metadata = HashMap::new();
    let mut attachment: Option<Attachment> = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == IMAGE_FIELD {
            if attachment.is_some() {
                tracing::debug!("Ignoring additional image part");
                continue;
            }
            let Some(file_name) = field.file_name().filter(|n| !n.is_empty()) else {
                tracing::debug!("Ignoring image part without a filename");
                continue;
            };
            let file_name = file_name.to_string();
            attachment = Some(spool_field(field, file_name, spool_dir).await?);
        } else if FORWARDED_FIELDS.contains(&name.as_str()) {
            let value = field.text().await.map_err(malformed)?;
            if !value.is_empty() {
                metadata.entry(name).or_insert(value);
            }
        }
    }

    let attachment = attachment.ok_or(RelayError::NoFileProvided)?;

    tracing::info!(
        file_name = %attachment.original_name,
        size_bytes = attachment.size_bytes,
        metadata_fields = metadata.len(),
        "Upload received"
    );

    Ok(UploadRequest {
        metadata,
        attachment,
    })
}

/// Stream one file part to a fresh spool file. If anything fails midway the
/// partially written file is removed when the attachment drops.
async fn spool_field(
    mut field: Field<'_>,
    original_name: String,
    spool_dir: &Path,
) -> Result<Attachment, RelayError> {
    let mut attachment =
        Attachment::spool(original_name, spool_dir).context("Failed to create spool file")?;
    let mut writer = attachment.open().context("Failed to open spool file")?;

    while let Some(chunk) = field.chunk().await.map_err(malformed)? {
        writer
            .write_all(&chunk)
            .await
            .context("Failed to write spool file")?;
        attachment.size_bytes += chunk.len() as u64;
    }
    writer.flush().await.context("Failed to flush spool file")?;

    Ok(attachment)
}

fn malformed(err: MultipartError) -> RelayError {
    RelayError::MalformedUpload(err.body_text())
}
