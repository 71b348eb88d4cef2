use inference_relay::config::get_configuration;
use inference_relay::services::metrics::init_metrics;
use inference_relay::startup::Application;
use service_core::observability::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    let otlp_endpoint = std::env::var("OTLP_ENDPOINT").ok();
    init_tracing("inference-relay", "info", otlp_endpoint.as_deref())?;

    init_metrics()?;

    let app = Application::build(settings).await?;
    info!(port = app.port(), "Starting inference-relay");

    app.run_until_stopped().await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
