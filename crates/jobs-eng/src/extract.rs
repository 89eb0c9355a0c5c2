//! Extractors whose rejections are routed through [`AppError`].

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde_json::Value;

use crate::errors::AppError;

/// A JSON object request body, kept verbatim.
#[derive(Debug)]
pub struct JsonObject(pub Value);

impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state).await?;
        if !value.is_object() {
            return Err(AppError::BadRequest(
                "request body must be a JSON object".to_string(),
            ));
        }
        Ok(JsonObject(value))
    }
}
