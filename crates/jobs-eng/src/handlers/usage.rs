//! Build-tool usage recording and the per-author detail page.

use axum::{Extension, response::Html, response::Json};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    errors::AppError,
    extract::JsonObject,
    models::Collection,
    store::{DocumentStore, SharedStore},
    types::ApiResponse,
    usage::collect_usage_detail,
    views::render_usage_detail,
};

pub(crate) async fn insert_record(
    store: &dyn DocumentStore,
    collection: Collection,
    record: Value,
) -> Result<Json<ApiResponse<Uuid>>, AppError> {
    let id = store.insert_one(collection, record).await?;
    tracing::info!(collection = collection.as_str(), %id, "Saved to database");
    Ok(Json(ApiResponse::ok(id)))
}

/// Record one build.sh invocation.
#[utoipa::path(
    put,
    path = "/jobs/eng/build-sh",
    tag = "usage",
    responses(
        (status = 200, description = "Envelope with the inserted id, or an error envelope (code 1: store failure, code 2: bad request)")
    )
)]
pub async fn put_build_sh(
    Extension(store): Extension<SharedStore>,
    JsonObject(record): JsonObject,
) -> Result<Json<ApiResponse<Uuid>>, AppError> {
    tracing::debug!(%record, "Received build.sh usage");
    insert_record(store.as_ref(), Collection::BuildShUsages, record).await
}

/// Record one swagger.py invocation.
#[utoipa::path(
    put,
    path = "/jobs/eng/swagger-py",
    tag = "usage",
    responses(
        (status = 200, description = "Envelope with the inserted id, or an error envelope (code 1: store failure, code 2: bad request)")
    )
)]
pub async fn put_swagger_py(
    Extension(store): Extension<SharedStore>,
    JsonObject(record): JsonObject,
) -> Result<Json<ApiResponse<Uuid>>, AppError> {
    tracing::debug!(%record, "Received swagger.py usage");
    insert_record(store.as_ref(), Collection::SwaggerPyUsages, record).await
}

/// Per-author usage counts of both tools.
#[utoipa::path(
    get,
    path = "/jobs/eng/detail",
    tag = "usage",
    responses(
        (status = 200, description = "Usage detail page", body = String, content_type = "text/html")
    )
)]
pub async fn get_usage_detail(
    Extension(store): Extension<SharedStore>,
) -> Result<Html<String>, AppError> {
    let detail = collect_usage_detail(store.as_ref()).await?;
    tracing::info!(
        authors = detail.total_usages.len(),
        total_build_sh = detail.total_build_sh,
        total_swagger_py = detail.total_swagger_py,
        "Aggregated tool usage"
    );
    Ok(render_usage_detail(&detail))
}
