//! HTTP 错误响应

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use vaultonic_errors::AppError;

/// `{"message": ...}` 响应体
#[derive(Debug, Serialize)]
pub struct MessageResponse<T> {
    pub message: T,
}

impl<T> MessageResponse<T> {
    pub fn new(message: T) -> Self {
        Self { message }
    }
}

/// 将 AppError 转换为 HTTP 响应
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(MessageResponse::new(self.0.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = ApiError(AppError::not_found("secret/go-test/x")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_service_failures_map_to_500() {
        for err in [
            AppError::unauthenticated("permission denied"),
            AppError::encryption("encryption key not found"),
            AppError::storage("connection refused"),
        ] {
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
