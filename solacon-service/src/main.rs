use service_core::observability::init_tracing;
use solacon_service::config::SolaconConfig;
use solacon_service::services::init_metrics;
use solacon_service::startup::Application;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = SolaconConfig::load().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "solacon-service",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    init_metrics();

    tracing::info!(
        solacon_path = ?config.generator.solacon_path,
        failure_mode = ?config.generator.failure_mode,
        "Starting solacon-service on {}",
        config.common.address()
    );

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        anyhow::anyhow!("Startup error: {}", e)
    })?;

    app.run_until_stopped().await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
