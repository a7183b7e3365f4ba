use image_edit_service::config::EditConfig;
use image_edit_service::services::init_metrics;
use image_edit_service::startup::Application;
use service_core::observability::init_tracing;
use tokio::signal;
use tracing::info;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = EditConfig::load().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "image-edit-service",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    init_metrics()?;

    let app = Application::build(config).await?;

    info!("Starting image-edit-service on port {}", app.port());
    app.run_with_shutdown(shutdown_signal()).await?;

    Ok(())
}
