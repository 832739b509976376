//! Uniform success envelope: `{ success, statusCode, data, message }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use super::error::ApiError;

/// A successful API response wrapped in the envelope.
pub struct ApiResponse<T: Serialize> {
    data: T,
    message: String,
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            status: StatusCode::OK,
        }
    }

    /// 201 Created
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            status: StatusCode::CREATED,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let data = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return ApiError::internal("Failed to format response").into_response();
            }
        };

        (
            self.status,
            Json(json!({
                "success": true,
                "statusCode": self.status.as_u16(),
                "data": data,
                "message": self.message,
            })),
        )
            .into_response()
    }
}

/// Handler result: envelope on success, taxonomy error otherwise.
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;
