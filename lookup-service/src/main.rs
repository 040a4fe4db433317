use lookup_service::config::LookupConfig;
use lookup_service::services::{DocumentStore, MongoStore};
use lookup_service::startup::{shutdown_signal, Application};
use service_core::observability::init_tracing;
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = LookupConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing("lookup-service", &config.common.log_level);

    // Refuse to bind the listener until the store answers a ping.
    let store: Arc<dyn DocumentStore> = Arc::new(
        MongoStore::initialize(&config.mongodb)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                std::io::Error::other(format!("Database connection error: {}", e))
            })?,
    );

    let shutdown_timeout = config.shutdown_timeout;
    let app = match Application::build(config, store.clone()).await {
        Ok(app) => app,
        Err(e) => {
            store.shutdown(shutdown_timeout).await;
            return Err(std::io::Error::other(format!("Startup error: {}", e)));
        }
    };

    app.run_until_stopped(shutdown_signal()).await
}
