//! Success envelope shared by every JSON endpoint.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// `{ "message": ..., "data": ... }` with a status code.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip)]
    status: StatusCode,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// A 200 response.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data,
        }
    }

    /// A 201 response for a newly created resource.
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message: message.into(),
            data,
        }
    }
}

impl ApiResponse<Option<()>> {
    /// A 200 response with `data: null`.
    pub fn message(message: impl Into<String>) -> Self {
        Self::ok(message, None)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::ok("Done", vec![1, 2])).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "Done", "data": [1, 2] }));
    }

    #[test]
    fn test_created_status() {
        let response = ApiResponse::created("Created", 7).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_message_only_has_null_data() {
        let body = serde_json::to_value(ApiResponse::message("Deleted")).unwrap();
        assert_eq!(body["data"], serde_json::Value::Null);
    }
}
