pub mod relay;
pub mod upload;

pub use relay::{NormalizedResponse, RelayOutcome};
pub use upload::{Attachment, UploadRequest, FORWARDED_FIELDS, IMAGE_FIELD};
