//! JSON envelope shared by every non-view endpoint.

use serde::Serialize;
use utoipa::ToSchema;

/// Store failures.
pub const ERROR_CODE_STORE: i32 = 1;
/// Malformed requests.
pub const ERROR_CODE_BAD_REQUEST: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// `{status, data}` envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: ResponseStatus::Ok,
            data,
        }
    }

    pub fn error(data: T) -> Self {
        Self {
            status: ResponseStatus::Error,
            data,
        }
    }
}

/// Payload of a coded error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: i32,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
