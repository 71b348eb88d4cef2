pub mod inference_client;
pub mod metrics;

pub use inference_client::{InferenceClient, UpstreamEndpoint};
