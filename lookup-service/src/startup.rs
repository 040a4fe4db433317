//! Application startup and lifecycle management.
//!
//! The store handle is built by the caller and injected, so the binary wires
//! in [`MongoStore`](crate::services::MongoStore) while tests pass a
//! [`MockStore`](crate::services::MockStore).

use crate::config::LookupConfig;
use crate::handlers::{fetch_by_key, fetch_default, health_check, readiness_check};
use crate::services::DocumentStore;
use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::request_id_middleware;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<LookupConfig>,
    pub store: Arc<dyn DocumentStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(fetch_default))
        .route("/documents/:key", get(fetch_by_key))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Bind the listener. The store must already be initialized.
    pub async fn build(
        config: LookupConfig,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self, AppError> {
        // port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Lookup service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state: AppState {
                config: Arc::new(config),
                store,
            },
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until `shutdown` resolves, drain in-flight requests, then
    /// release the store within the configured shutdown timeout.
    pub async fn run_until_stopped<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let store = self.state.store.clone();
        let shutdown_timeout = self.state.config.shutdown_timeout;
        let app = router(self.state);

        let result = axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await;
        if let Err(e) = &result {
            tracing::error!("HTTP server error: {}", e);
        }

        store.shutdown(shutdown_timeout).await;
        tracing::info!("Lookup service stopped");

        result
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
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
