use journal_service::config::JournalConfig;
use journal_service::startup::Application;
use service_core::observability::{init_metrics, init_tracing};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Recorder first so no early metric is dropped.
    init_metrics();

    let config = match JournalConfig::load() {
        Ok(config) => config,
        Err(e) => {
            init_tracing("journal-service", "info", None);
            tracing::error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::other(format!("Configuration error: {}", e)));
        }
    };

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start journal-service: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    application.run_until_stopped().await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}
