use crate::config::MongoConfig;
use crate::services::store::{DocumentStore, LookupKey, StoreError};
use async_trait::async_trait;
use mongodb::{
    bson::{doc, Document},
    options::{ClientOptions, FindOneOptions},
    Client as MongoClient, Collection,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Bounded MongoDB connection pool plus the collection lookups run against.
///
/// Clones share the same pool and the same closed flag.
#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    collection: Collection<Document>,
    closed: Arc<AtomicBool>,
}

/// Driver options for the pool described by `config`.
///
/// Server selection is bounded separately from `connect_timeout` so an
/// unreachable server is reported before the per-request deadline fires.
pub async fn client_options(config: &MongoConfig) -> Result<ClientOptions, AppError> {
    let mut options = ClientOptions::parse(config.uri.expose_secret())
        .await
        .map_err(|e| {
            tracing::error!("Invalid MongoDB connection string: {}", e);
            AppError::from(e)
        })?;
    options.max_pool_size = Some(config.max_pool_size);
    options.connect_timeout = Some(config.connect_timeout);
    options.server_selection_timeout = Some(config.server_selection_timeout);
    options.app_name = Some("lookup-service".to_string());
    Ok(options)
}

impl MongoStore {
    /// Build the pool without contacting the server.
    pub async fn connect(config: &MongoConfig) -> Result<Self, AppError> {
        tracing::info!(
            database = %config.database,
            collection = %config.collection,
            max_pool_size = config.max_pool_size,
            "Connecting to MongoDB"
        );

        let client = MongoClient::with_options(client_options(config).await?).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::from(e)
        })?;
        let collection = client
            .database(&config.database)
            .collection::<Document>(&config.collection);

        Ok(Self {
            client,
            collection,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Build the pool and verify the server answers a ping within
    /// `connect_timeout`. Never exits the process; the caller decides.
    pub async fn initialize(config: &MongoConfig) -> Result<Self, AppError> {
        let store = Self::connect(config).await?;

        match tokio::time::timeout(config.connect_timeout, store.ping()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!("MongoDB ping failed: {}", e);
                return Err(AppError::DatabaseError(anyhow::anyhow!(
                    "Ping failed: {}",
                    e
                )));
            }
            Err(_) => {
                tracing::error!(
                    timeout_ms = config.connect_timeout.as_millis() as u64,
                    "MongoDB ping timed out"
                );
                return Err(AppError::DatabaseError(anyhow::anyhow!(
                    "Ping timed out after {:?}",
                    config.connect_timeout
                )));
            }
        }

        tracing::info!(database = %config.database, "Connected to MongoDB");
        Ok(store)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find_by_key(
        &self,
        key: &LookupKey,
        max_time: Duration,
    ) -> Result<Option<Document>, StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }

        let options = FindOneOptions::builder().max_time(max_time).build();
        self.collection
            .find_one(doc! { "_id": key.to_bson() }, options)
            .await
            .map_err(|e| {
                tracing::error!(key = %key, "Failed to find document: {}", e);
                StoreError::from(e)
            })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }

        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                StoreError::from(e)
            })?;
        Ok(())
    }

    async fn shutdown(&self, timeout: Duration) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        tracing::info!("Closing MongoDB connection pool");
        match tokio::time::timeout(timeout, self.client.clone().shutdown()).await {
            Ok(()) => tracing::info!("MongoDB connection pool closed"),
            Err(_) => tracing::warn!(
                timeout_ms = timeout.as_millis() as u64,
                "MongoDB connection pool did not close in time, abandoning"
            ),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
