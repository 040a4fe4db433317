use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Value matched against `_id` by a point lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookupKey {
    Int(i64),
    ObjectId(ObjectId),
    String(String),
}

impl LookupKey {
    pub fn to_bson(&self) -> Bson {
        match self {
            LookupKey::Int(v) => Bson::Int64(*v),
            LookupKey::ObjectId(oid) => Bson::ObjectId(*oid),
            LookupKey::String(s) => Bson::String(s.clone()),
        }
    }
}

impl Default for LookupKey {
    fn default() -> Self {
        LookupKey::Int(1)
    }
}

/// Canonical integers first, then 24-hex ObjectIds; anything else is a
/// plain string.
///
/// An integer is canonical when it prints back unchanged, so `"-5"` is an
/// integer while `"007"`, `"+5"` and `"-0"` stay strings.
impl From<&str> for LookupKey {
    fn from(s: &str) -> Self {
        if let Ok(v) = s.parse::<i64>() {
            if v.to_string() == s {
                return LookupKey::Int(v);
            }
        }
        if s.len() == 24 {
            if let Ok(oid) = ObjectId::parse_str(s) {
                return LookupKey::ObjectId(oid);
            }
        }
        LookupKey::String(s.to_string())
    }
}

impl FromStr for LookupKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(LookupKey::from(s))
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKey::Int(v) => write!(f, "{}", v),
            LookupKey::ObjectId(oid) => write!(f, "{}", oid.to_hex()),
            LookupKey::String(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store is closed")]
    Closed,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store operation exceeded its time limit")]
    TimedOut,

    #[error("Database error: {0}")]
    Database(String),
}

/// MaxTimeMSExpired
const MAX_TIME_EXPIRED_CODE: i32 = 50;

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::ConnectionPoolCleared { .. } => StoreError::Unavailable(err.to_string()),
            ErrorKind::Command(cmd) if cmd.code == MAX_TIME_EXPIRED_CODE => StoreError::TimedOut,
            _ => StoreError::Database(err.to_string()),
        }
    }
}

/// Handle to the backing document store shared by all request handlers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch at most one document whose `_id` equals `key`.
    async fn find_by_key(
        &self,
        key: &LookupKey,
        max_time: Duration,
    ) -> Result<Option<Document>, StoreError>;

    /// Liveness check against the store.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release every pooled connection. Best effort, bounded by `timeout`.
    /// Lookups issued afterwards fail with [`StoreError::Closed`].
    async fn shutdown(&self, timeout: Duration);

    fn is_closed(&self) -> bool;
}
