//! Application startup and lifecycle management.

use crate::config::RelayConfig;
use crate::services::{GeminiClient, HttpTransport, PromptRelay, UpstreamTransport};
use crate::{build_router, AppState};
use axum::Router;
use service_core::error::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the reqwest transport.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        let transport =
            HttpTransport::new(Duration::from_secs(config.upstream.timeout_secs)).map_err(|e| {
                tracing::error!("Failed to create HTTP client: {}", e);
                e
            })?;

        Self::build_with_transport(config, Arc::new(transport)).await
    }

    /// Build the application around a caller-supplied transport.
    pub async fn build_with_transport(
        config: RelayConfig,
        transport: Arc<dyn UpstreamTransport>,
    ) -> Result<Self, AppError> {
        config.validate()?;

        let gemini = GeminiClient::new(&config, transport);
        if gemini.is_configured() {
            tracing::info!(
                model = %config.models.text_model,
                "Initialized Gemini client"
            );
        } else {
            tracing::warn!(
                "GOOGLE_API_KEY missing or left as placeholder - relay requests will fail with 500"
            );
        }

        let relay = PromptRelay::new(gemini, config.limits.max_body_bytes);
        let state = AppState {
            config: config.clone(),
            relay,
        };
        let router = build_router(state)?;

        // Bind HTTP listener (port 0 = random port for testing)
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            service = %config.service_name,
            environment = ?config.environment,
            allowed_origin = %config.cors.allowed_origin,
            "Prompt relay listening on port {}",
            port
        );

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })?;

        tracing::info!("Service shutdown complete");
        Ok(())
    }
}

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
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
