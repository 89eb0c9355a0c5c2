//! Request correlation middleware.
//!
//! Every request runs inside a tracing span carrying its id, and the id is
//! echoed back in the `x-request-id` response header.

use std::time::Instant;

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Client-supplied ids longer than this are replaced.
const MAX_REQUEST_ID_LEN: usize = 128;

fn client_request_id(request: &Request) -> Option<String> {
    let raw = request.headers().get(&REQUEST_ID_HEADER)?.to_str().ok()?;
    let valid = !raw.is_empty()
        && raw.len() <= MAX_REQUEST_ID_LEN
        && raw.chars().all(|c| c.is_ascii_graphic());
    valid.then(|| raw.to_string())
}

pub async fn request_id_middleware(request: Request, next: Next) -> Response<Body> {
    let request_id = client_request_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
    );

    async move {
        tracing::info!("Received request");
        let started = Instant::now();

        let mut response = next.run(request).await;

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response
                .headers_mut()
                .insert(REQUEST_ID_HEADER.clone(), value);
        }

        tracing::info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
        response
    }
    .instrument(span)
    .await
}
