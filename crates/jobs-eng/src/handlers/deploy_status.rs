//! Deploy-status recording, dashboard, and polling feed.

use axum::{
    Extension,
    extract::{Query, rejection::QueryRejection},
    response::{Html, IntoResponse, Json, Response},
};
use uuid::Uuid;

use crate::{
    deploy_status::{DEPLOY_STATUS_CHANGE_EVENT, decode_events, feed_since, latest_per_resource},
    errors::AppError,
    extract::JsonObject,
    format::format_threshold,
    handlers::usage::insert_record,
    models::Collection,
    push::PushChannel,
    store::{DocumentStore, SharedStore},
    types::{ApiResponse, DeployStatusFeedQuery},
    views::render_deploy_status,
};

pub const MISSING_LAST_TIME: &str = "Query parameter 'lastTime': long is required";

/// Record a deploy status and announce it to live listeners.
///
/// Listeners are notified before the insert is attempted, so they may see
/// an event that then fails to persist.
#[utoipa::path(
    put,
    path = "/jobs/eng/giudico/deploy-status",
    tag = "deploy-status",
    responses(
        (status = 200, description = "Envelope with the inserted id, or an error envelope (code 1: store failure, code 2: bad request)")
    )
)]
pub async fn put_deploy_status(
    Extension(store): Extension<SharedStore>,
    Extension(channel): Extension<PushChannel>,
    JsonObject(event): JsonObject,
) -> Result<Json<ApiResponse<Uuid>>, AppError> {
    tracing::info!(%event, "Received deploy status");
    channel.emit(DEPLOY_STATUS_CHANGE_EVENT, event.clone());
    insert_record(store.as_ref(), Collection::GiudicoDeployStatus, event).await
}

/// Dashboard of the latest status per resource.
#[utoipa::path(
    get,
    path = "/jobs/eng/giudico/deploy-status",
    tag = "deploy-status",
    responses(
        (status = 200, description = "Deploy status page", body = String, content_type = "text/html")
    )
)]
pub async fn get_deploy_status_view(
    Extension(store): Extension<SharedStore>,
) -> Result<Html<String>, AppError> {
    let docs = store.find_all(Collection::GiudicoDeployStatus).await?;
    let latest = latest_per_resource(decode_events(docs));
    tracing::debug!(resources = latest.len(), "Reduced deploy statuses");
    Ok(render_deploy_status(&latest))
}

/// Deploy statuses displayed after `lastTime`, oldest first.
#[utoipa::path(
    get,
    path = "/api/jobs/eng/giudico/deploy-status",
    tag = "deploy-status",
    params(DeployStatusFeedQuery),
    responses(
        (status = 200, description = "Envelope with the matching events (timestamps in display form), or an error envelope")
    )
)]
pub async fn get_deploy_status_feed(
    Extension(store): Extension<SharedStore>,
    query: Result<Query<DeployStatusFeedQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let Some(raw) = query.last_time() else {
        return Ok(Json(ApiResponse::error(MISSING_LAST_TIME)).into_response());
    };
    // A value that is not a number becomes `Invalid Date`, which no real date exceeds.
    let threshold = format_threshold(raw);

    let docs = store.find_all(Collection::GiudicoDeployStatus).await?;
    let feed = feed_since(docs, &threshold);
    tracing::debug!(%threshold, events = feed.len(), "Serving deploy status feed");

    Ok(Json(ApiResponse::ok(feed)).into_response())
}
