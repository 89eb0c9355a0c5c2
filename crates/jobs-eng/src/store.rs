//! Document store abstraction.
//!
//! Handlers only talk to [`DocumentStore`]; the Postgres-backed
//! [`crate::database::Database`] is used in production and
//! [`crate::memory_store::MemoryStore`] for tests and local runs.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AuthorCount, Collection, StoredDocument};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("document is not a JSON object")]
    NotAnObject,

    #[error("{0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Shared handle installed into the router.
pub type SharedStore = Arc<dyn DocumentStore>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert `body` unmodified and return the new storage identifier.
    async fn insert_one(&self, collection: Collection, body: Value) -> StoreResult<Uuid>;

    /// All documents of a collection in insertion order.
    async fn find_all(&self, collection: Collection) -> StoreResult<Vec<StoredDocument>>;

    /// Group a collection by its `author` field and count each group.
    async fn count_by_author(&self, collection: Collection) -> StoreResult<Vec<AuthorCount>>;
}
