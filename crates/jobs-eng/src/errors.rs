use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::{
    store::StoreError,
    types::{ApiResponse, ERROR_CODE_BAD_REQUEST, ERROR_CODE_STORE, ErrorBody},
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Save error: {0}")]
    Store(#[from] StoreError),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    /// An extractor rejection the envelope does not cover; answered the way
    /// axum would have answered it.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl AppError {
    fn from_rejection(status: StatusCode, message: String) -> Self {
        if status == StatusCode::BAD_REQUEST {
            AppError::BadRequest(message)
        } else {
            AppError::Rejected { status, message }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::from_rejection(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = match &self {
            AppError::Store(e) => {
                error!("Store error: {e}");
                ERROR_CODE_STORE
            }
            AppError::BadRequest(msg) => {
                warn!("Bad request: {msg}");
                ERROR_CODE_BAD_REQUEST
            }
            AppError::Rejected { status, message } => {
                warn!(status = status.as_u16(), "Request rejected: {message}");
                return (*status, message.clone()).into_response();
            }
        };

        // Envelope errors are still HTTP 200; clients branch on `status`.
        Json(ApiResponse::error(ErrorBody::new(code, self.to_string()))).into_response()
    }
}
