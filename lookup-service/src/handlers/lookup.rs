//! Point-lookup handlers.
//!
//! Each request performs at most one store operation, bounded by the
//! configured lookup deadline. Failures are reported as plain text:
//!
//! | cause                      | status | body                  |
//! |----------------------------|--------|-----------------------|
//! | no document at the key     | 404    | `Document not found`  |
//! | store unreachable / closed | 503    | `Service unavailable` |
//! | deadline exceeded          | 500    | `Error fetching data` |
//! | any other store error      | 500    | `Error fetching data` |

use crate::services::{LookupKey, StoreError};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mongodb::bson::Document;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("No document with key {0}")]
    NotFound(LookupKey),

    #[error("Lookup exceeded its deadline")]
    DeadlineExceeded,

    #[error("Store unavailable: {0}")]
    Unavailable(StoreError),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for LookupError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Closed | StoreError::Unavailable(_) => LookupError::Unavailable(err),
            StoreError::TimedOut => LookupError::DeadlineExceeded,
            StoreError::Database(_) => LookupError::Store(err),
        }
    }
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            LookupError::NotFound(_) => (StatusCode::NOT_FOUND, "Document not found"),
            LookupError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable"),
            LookupError::DeadlineExceeded | LookupError::Store(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Error fetching data")
            }
        };

        (status, body).into_response()
    }
}

/// `/`: look up the configured default key. The method is not checked.
pub async fn fetch_default(State(state): State<AppState>) -> Result<String, LookupError> {
    let key = state.config.lookup.default_key.clone();
    let document = lookup_document(&state, &key).await?;
    Ok(render_document(&document))
}

/// `/documents/:key`: look up the key given in the path.
pub async fn fetch_by_key(
    State(state): State<AppState>,
    Path(raw_key): Path<String>,
) -> Result<String, LookupError> {
    let key = LookupKey::from(raw_key.as_str());
    let document = lookup_document(&state, &key).await?;
    Ok(render_document(&document))
}

async fn lookup_document(state: &AppState, key: &LookupKey) -> Result<Document, LookupError> {
    let deadline = state.config.lookup.timeout;

    match tokio::time::timeout(deadline, state.store.find_by_key(key, deadline)).await {
        Ok(Ok(Some(document))) => {
            tracing::debug!(key = %key, "Fetched document");
            Ok(document)
        }
        Ok(Ok(None)) => {
            tracing::warn!(key = %key, "Document not found");
            Err(LookupError::NotFound(key.clone()))
        }
        Ok(Err(e)) => {
            tracing::error!(key = %key, error = %e, "Error fetching data");
            Err(LookupError::from(e))
        }
        Err(_) => {
            tracing::error!(
                key = %key,
                deadline_ms = deadline.as_millis() as u64,
                "Lookup deadline exceeded"
            );
            Err(LookupError::DeadlineExceeded)
        }
    }
}

fn render_document(document: &Document) -> String {
    format!("Fetched document: {}", document)
}
