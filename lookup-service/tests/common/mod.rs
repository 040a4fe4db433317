#![allow(dead_code)]

use lookup_service::config::{LookupConfig, LookupSettings, MongoConfig};
use lookup_service::services::{DocumentStore, LookupKey, MockStore};
use lookup_service::startup::Application;
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub fn test_config() -> LookupConfig {
    LookupConfig {
        // Use random port for testing (port 0)
        common: CoreConfig {
            port: 0,
            log_level: "info".to_string(),
        },
        mongodb: MongoConfig {
            uri: Secret::new(
                std::env::var("TEST_MONGODB_URI")
                    .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            ),
            database: "demo".to_string(),
            collection: "test".to_string(),
            max_pool_size: 10,
            connect_timeout: Duration::from_secs(2),
            server_selection_timeout: Duration::from_secs(1),
        },
        lookup: LookupSettings {
            default_key: LookupKey::Int(1),
            timeout: Duration::from_secs(2),
        },
        shutdown_timeout: Duration::from_secs(1),
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<dyn DocumentStore>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<std::io::Result<()>>>,
}

impl TestApp {
    pub async fn spawn(store: Arc<MockStore>) -> Self {
        Self::spawn_with(test_config(), store).await
    }

    pub async fn spawn_with(config: LookupConfig, store: Arc<dyn DocumentStore>) -> Self {
        let app = Application::build(config, store.clone())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            app.run_until_stopped(async {
                shutdown_rx.await.ok();
            })
            .await
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            store,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Trigger graceful shutdown and wait for the server task to finish.
    pub async fn shutdown(&mut self) -> std::io::Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            tx.send(()).ok();
        }
        match self.handle.take() {
            Some(handle) => handle.await.expect("Server task panicked"),
            None => Ok(()),
        }
    }
}
