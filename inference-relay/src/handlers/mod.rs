pub mod health;
pub mod metrics;
pub mod relay;

pub use health::health_check;
pub use metrics::metrics;
pub use relay::{analyze, generate_plan, method_not_allowed, predict};
