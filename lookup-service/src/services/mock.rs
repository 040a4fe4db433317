use crate::services::store::{DocumentStore, LookupKey, StoreError};
use async_trait::async_trait;
use mongodb::bson::Document;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// In-memory store for tests and local runs without MongoDB.
pub struct MockStore {
    documents: HashMap<LookupKey, Document>,
    latency: Option<Duration>,
    available: bool,
    closed: AtomicBool,
    lookup_count: AtomicU64,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            latency: None,
            available: true,
            closed: AtomicBool::new(false),
            lookup_count: AtomicU64::new(0),
        }
    }

    pub fn with_document(mut self, key: LookupKey, document: Document) -> Self {
        self.documents.insert(key, document);
        self
    }

    /// Delay every lookup by `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Behave like a store whose server cannot be selected.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Lookups that reached the store (rejected lookups on a closed store
    /// are not counted).
    pub fn lookup_count(&self) -> u64 {
        self.lookup_count.load(Ordering::SeqCst)
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MockStore {
    async fn find_by_key(
        &self,
        key: &LookupKey,
        _max_time: Duration,
    ) -> Result<Option<Document>, StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }

        self.lookup_count.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(key = %key, "[MOCK] Document lookup");

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if !self.available {
            return Err(StoreError::Unavailable(
                "Mock store is not available".to_string(),
            ));
        }

        Ok(self.documents.get(key).cloned())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        if !self.available {
            return Err(StoreError::Unavailable(
                "Mock store is not available".to_string(),
            ));
        }
        Ok(())
    }

    async fn shutdown(&self, _timeout: Duration) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
