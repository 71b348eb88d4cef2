//! The per-request relay pipeline: intake, validation, normalization.
//!
//! The upstream call itself lives in [`crate::services::inference_client`].

pub mod intake;
pub mod normalize;
pub mod validation;
