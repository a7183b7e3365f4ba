//! Router construction and server lifecycle.

use crate::config::EditConfig;
use crate::handlers;
use crate::services::providers::dashscope::DashScopeClient;
use crate::services::providers::ImageEditProvider;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    tracing::{http_trace_layer, request_id_middleware},
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Room for multipart boundaries and the text fields on top of the file limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EditConfig>,
    pub provider: Arc<dyn ImageEditProvider>,
}

impl AppState {
    pub fn new(config: EditConfig, provider: Arc<dyn ImageEditProvider>) -> Self {
        Self {
            config: Arc::new(config),
            provider,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .config
        .upload
        .max_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .route("/api/edit", post(handlers::edit_image))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(metrics_middleware))
        .layer(http_trace_layer())
        .layer(from_fn(request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the DashScope provider described by `config`.
    pub async fn build(config: EditConfig) -> Result<Self, AppError> {
        let provider = DashScopeClient::new(config.dashscope.clone()).map_err(|e| {
            tracing::error!("Failed to create DashScope HTTP client: {}", e);
            AppError::InternalError(anyhow::anyhow!("Failed to create HTTP client: {}", e))
        })?;

        if provider.is_configured() {
            tracing::info!(
                model = %config.dashscope.model,
                base_url = %config.dashscope.base_url,
                "Initialized DashScope provider"
            );
        } else {
            tracing::warn!(
                "DASHSCOPE_API_KEY not set - /api/edit will report a configuration error"
            );
        }

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build the application around an already constructed provider.
    pub async fn build_with_provider(
        config: EditConfig,
        provider: Arc<dyn ImageEditProvider>,
    ) -> Result<Self, AppError> {
        // Port 0 binds a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let router = build_router(AppState::new(config, provider));

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }

    /// Serve until `signal` resolves, letting in-flight requests finish.
    pub async fn run_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await
    }
}
