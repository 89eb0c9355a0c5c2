use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, types::Json};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    models::{AuthorCount, Collection, StoredDocument},
    store::{DocumentStore, StoreError, StoreResult},
};

/// Postgres-backed document store. Every collection lives in the
/// `documents` table with its body kept as JSONB.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for Database {
    async fn insert_one(&self, collection: Collection, body: Value) -> StoreResult<Uuid> {
        if !body.is_object() {
            return Err(StoreError::NotAnObject);
        }

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO documents (id, collection, body, inserted_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(collection.as_str())
        .bind(Json(&body))
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;

        tracing::debug!(collection = collection.as_str(), %id, "Saved document");

        Ok(id)
    }

    async fn find_all(&self, collection: Collection) -> StoreResult<Vec<StoredDocument>> {
        let rows: Vec<(Uuid, Json<Value>, OffsetDateTime)> = sqlx::query_as(
            r#"
            SELECT id, body, inserted_at
            FROM documents
            WHERE collection = $1
            ORDER BY seq
            "#,
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(body), inserted_at)| StoredDocument {
                id,
                body,
                inserted_at,
            })
            .collect())
    }

    async fn count_by_author(&self, collection: Collection) -> StoreResult<Vec<AuthorCount>> {
        let rows: Vec<(Option<Json<Value>>, i64)> = sqlx::query_as(
            r#"
            SELECT COALESCE(body -> 'author', 'null'::jsonb) AS author, COUNT(*) AS count
            FROM documents
            WHERE collection = $1
            GROUP BY 1
            "#,
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(author, count)| AuthorCount {
                author: author.map(|Json(v)| v).unwrap_or(Value::Null),
                count,
            })
            .collect())
    }
}
