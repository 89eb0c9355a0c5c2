pub mod config;
pub mod database;
pub mod deploy_status;
pub mod errors;
pub mod extract;
pub mod format;
pub mod handlers;
pub mod memory_store;
pub mod models;
pub mod push;
pub mod request_id;
pub mod store;
pub mod types;
pub mod usage;
pub mod views;

use std::sync::Arc;

use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, put},
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::{Config, StoreBackend},
    database::Database,
    handlers::{
        deploy_status_socket, get_deploy_status_feed, get_deploy_status_view, get_usage_detail,
        health_check, put_build_sh, put_deploy_status, put_swagger_py,
    },
    memory_store::MemoryStore,
    push::PushChannel,
    request_id::request_id_middleware,
    store::SharedStore,
    views::DEPLOY_STATUS_SOCKET_PATH,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::stats::health_check,
        handlers::usage::put_build_sh,
        handlers::usage::put_swagger_py,
        handlers::usage::get_usage_detail,
        handlers::deploy_status::put_deploy_status,
        handlers::deploy_status::get_deploy_status_view,
        handlers::deploy_status::get_deploy_status_feed,
        handlers::socket::deploy_status_socket,
    ),
    components(schemas(types::ErrorBody, types::ResponseStatus)),
    tags(
        (name = "usage", description = "Build tool usage statistics"),
        (name = "deploy-status", description = "Giudico deploy status feed"),
        (name = "stats", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Build the router with its collaborators injected.
pub fn create_router(store: SharedStore, channel: PushChannel) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::PUT])
        .allow_headers(Any)
        .allow_origin(Any);

    // Upgrade responses must not pass through the compression layer.
    let sockets = Router::new()
        .route(DEPLOY_STATUS_SOCKET_PATH, get(deploy_status_socket))
        .layer(Extension(channel.clone()))
        .layer(middleware::from_fn(request_id_middleware));

    Router::new()
        .route("/health", get(health_check))
        // Usage routes
        .route("/jobs/eng/build-sh", put(put_build_sh))
        .route("/jobs/eng/swagger-py", put(put_swagger_py))
        .route("/jobs/eng/detail", get(get_usage_detail))
        // Deploy status routes
        .route(
            "/jobs/eng/giudico/deploy-status",
            get(get_deploy_status_view).put(put_deploy_status),
        )
        .route(
            "/api/jobs/eng/giudico/deploy-status",
            get(get_deploy_status_feed),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(Extension(store))
        .layer(Extension(channel))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(CompressionLayer::new())
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .merge(sockets)
}

/// Open the configured document store.
pub async fn connect_store(config: &Config) -> anyhow::Result<SharedStore> {
    let store: SharedStore = match config.store_backend {
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database at {}", config.database_url);
            let db = Database::connect(&config.database_url).await?;
            db.migrate().await?;
            Arc::new(db)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let store = connect_store(&config).await?;
    let channel = PushChannel::new(config.push_channel_capacity);
    let app = create_router(store, channel);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    tracing::info!("Server running on http://0.0.0.0:{}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
