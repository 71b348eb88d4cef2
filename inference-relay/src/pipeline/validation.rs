use crate::error::RelayError;
use crate::models::UploadRequest;

/// Extensions the inference model accepts, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Image formats the relay forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    /// Classify by the text after the last `.`; names without one are
    /// never images.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, extension) = name.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(ImageKind::Png),
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// The image part was empty.
    NoFile,
    DisallowedExtension,
    /// The spooled file is gone.
    MissingPath,
}

impl From<RejectionReason> for RelayError {
    fn from(reason: RejectionReason) -> Self {
        match reason {
            RejectionReason::NoFile => RelayError::NoFileProvided,
            RejectionReason::DisallowedExtension => RelayError::DisallowedFileType,
            RejectionReason::MissingPath => RelayError::MissingUploadPath,
        }
    }
}

/// An upload cleared for relaying.
#[derive(Debug)]
pub struct AcceptedUpload {
    pub upload: UploadRequest,
    pub kind: ImageKind,
}

impl AcceptedUpload {
    pub fn release(self) {
        self.upload.release();
    }
}

#[derive(Debug)]
pub enum ValidationResult {
    Accepted(AcceptedUpload),
    Rejected(RejectionReason),
}

/// Decide whether an upload may be relayed. A rejected upload's spool file
/// is deleted before this returns.
pub fn validate(upload: UploadRequest) -> ValidationResult {
    let attachment = &upload.attachment;

    let reason = if attachment.temp_path().is_none() {
        RejectionReason::MissingPath
    } else if attachment.size_bytes == 0 {
        RejectionReason::NoFile
    } else if let Some(kind) = ImageKind::from_file_name(&attachment.original_name) {
        return ValidationResult::Accepted(AcceptedUpload { upload, kind });
    } else {
        RejectionReason::DisallowedExtension
    };

    tracing::info!(
        file_name = %attachment.original_name,
        reason = ?reason,
        "Upload rejected"
    );

    upload.release();
    ValidationResult::Rejected(reason)
}
