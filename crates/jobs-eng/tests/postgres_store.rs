//! Integration tests for the Postgres document store.
//!
//! To run these tests, you need a PostgreSQL database and the DATABASE_URL
//! environment variable set; migrations are applied by the tests.
//!
//! Run with: `DATABASE_URL=postgres://... cargo nextest run -p jobs-eng postgres`
//!
//! Note: documents are never deleted by the service, so these tests use
//! unique author and resource names and only assert on their own data.

use std::env;

use jobs_eng::{
    database::Database,
    models::{AuthorCount, Collection},
    store::DocumentStore,
    usage::collect_usage_detail,
};
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

/// Get a migrated store, skipping tests if DATABASE_URL is not set.
async fn get_test_db() -> Option<Database> {
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: DATABASE_URL not set");
            return None;
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: Failed to connect to database: {e}");
            return None;
        }
    };

    let db = Database::new(pool);
    db.migrate().await.expect("Failed to run migrations");
    Some(db)
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

fn count_for(counts: &[AuthorCount], author: &str) -> i64 {
    counts
        .iter()
        .find(|c| c.author == Value::String(author.to_string()))
        .map(|c| c.count)
        .unwrap_or(0)
}

#[tokio::test]
async fn test_insert_and_find_round_trip() {
    let Some(db) = get_test_db().await else {
        return;
    };
    let resource = unique("resource");
    let body = json!({"author": "ci", "status": "ok", "resource": resource, "timestamp": 1});

    let id = db
        .insert_one(Collection::GiudicoDeployStatus, body.clone())
        .await
        .expect("Failed to insert");

    let docs = db
        .find_all(Collection::GiudicoDeployStatus)
        .await
        .expect("Failed to find");
    let stored = docs.iter().find(|d| d.id == id).expect("Inserted doc missing");
    assert_eq!(stored.body, body);
}

#[tokio::test]
async fn test_find_all_preserves_insertion_order() {
    let Some(db) = get_test_db().await else {
        return;
    };
    let resource = unique("ordered");
    let mut ids = Vec::new();
    for status in ["first", "second", "third"] {
        ids.push(
            db.insert_one(
                Collection::GiudicoDeployStatus,
                json!({"resource": resource, "status": status, "timestamp": 1}),
            )
            .await
            .expect("Failed to insert"),
        );
    }

    let docs = db
        .find_all(Collection::GiudicoDeployStatus)
        .await
        .expect("Failed to find");
    let found: Vec<Uuid> = docs
        .iter()
        .filter(|d| d.body["resource"] == resource.as_str())
        .map(|d| d.id)
        .collect();
    assert_eq!(found, ids);
}

#[tokio::test]
async fn test_count_by_author_is_per_collection() {
    let Some(db) = get_test_db().await else {
        return;
    };
    let author = unique("author");

    for _ in 0..2 {
        db.insert_one(Collection::BuildShUsages, json!({"author": author}))
            .await
            .expect("Failed to insert");
    }
    db.insert_one(Collection::SwaggerPyUsages, json!({"author": author}))
        .await
        .expect("Failed to insert");

    let build_sh = db
        .count_by_author(Collection::BuildShUsages)
        .await
        .expect("Failed to aggregate");
    let swagger_py = db
        .count_by_author(Collection::SwaggerPyUsages)
        .await
        .expect("Failed to aggregate");

    assert_eq!(count_for(&build_sh, &author), 2);
    assert_eq!(count_for(&swagger_py, &author), 1);
}

#[tokio::test]
async fn test_missing_and_null_author_share_a_group() {
    let Some(db) = get_test_db().await else {
        return;
    };
    let before = db
        .count_by_author(Collection::BuildShUsages)
        .await
        .expect("Failed to aggregate");
    let null_before = before
        .iter()
        .find(|c| c.author.is_null())
        .map(|c| c.count)
        .unwrap_or(0);

    db.insert_one(Collection::BuildShUsages, json!({"tool": "x"}))
        .await
        .expect("Failed to insert");
    db.insert_one(Collection::BuildShUsages, json!({"author": null}))
        .await
        .expect("Failed to insert");

    let after = db
        .count_by_author(Collection::BuildShUsages)
        .await
        .expect("Failed to aggregate");
    let nulls: Vec<&AuthorCount> = after.iter().filter(|c| c.author.is_null()).collect();
    assert_eq!(nulls.len(), 1);
    assert!(nulls[0].count >= null_before + 2);
}

#[tokio::test]
async fn test_usage_detail_counts_new_author() {
    let Some(db) = get_test_db().await else {
        return;
    };
    let author = unique("detail");
    db.insert_one(Collection::SwaggerPyUsages, json!({"author": author}))
        .await
        .expect("Failed to insert");

    let detail = collect_usage_detail(&db).await.expect("Failed to aggregate");
    let counts = detail.total_usages[&author];
    assert_eq!(counts.count_build_sh, 0);
    assert_eq!(counts.count_swagger_py, 1);
}
