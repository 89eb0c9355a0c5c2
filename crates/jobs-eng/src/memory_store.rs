//! In-process document store.
//!
//! Used by the `memory` store backend and by the router tests, which rely on
//! its failure injection and latency hooks.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    models::{AuthorCount, Collection, StoredDocument},
    store::{DocumentStore, StoreError, StoreResult},
};

#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<StoredDocument>>>>,
    failing: Arc<Mutex<HashSet<Collection>>>,
    latency: Arc<Mutex<HashMap<Collection, Duration>>>,
    operations: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation on `collection` fail until [`MemoryStore::recover`].
    pub fn fail_on(&self, collection: Collection) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(collection);
    }

    pub fn fail_all(&self) {
        for collection in Collection::ALL {
            self.fail_on(collection);
        }
    }

    pub fn recover(&self) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Delay every operation on `collection` by `delay`.
    pub fn set_latency(&self, collection: Collection, delay: Duration) {
        self.latency
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(collection, delay);
    }

    /// Number of store operations attempted so far, failed ones included.
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    async fn begin(&self, collection: Collection) -> StoreResult<()> {
        self.operations.fetch_add(1, Ordering::SeqCst);

        let delay = self
            .latency
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&collection)
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&collection);
        if failing {
            return Err(StoreError::Unavailable(format!(
                "collection {} is unavailable",
                collection.as_str()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, collection: Collection, body: Value) -> StoreResult<Uuid> {
        self.begin(collection).await?;
        if !body.is_object() {
            return Err(StoreError::NotAnObject);
        }

        let id = Uuid::new_v4();
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(StoredDocument {
                id,
                body,
                inserted_at: OffsetDateTime::now_utc(),
            });
        Ok(id)
    }

    async fn find_all(&self, collection: Collection) -> StoreResult<Vec<StoredDocument>> {
        self.begin(collection).await?;
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn count_by_author(&self, collection: Collection) -> StoreResult<Vec<AuthorCount>> {
        self.begin(collection).await?;

        let collections = self.collections.read().await;
        let mut groups: Vec<AuthorCount> = Vec::new();
        for doc in collections.get(&collection).into_iter().flatten() {
            let author = doc.body.get("author").cloned().unwrap_or(Value::Null);
            match groups.iter_mut().find(|g| g.author == author) {
                Some(group) => group.count += 1,
                None => groups.push(AuthorCount::new(author, 1)),
            }
        }
        Ok(groups)
    }
}
