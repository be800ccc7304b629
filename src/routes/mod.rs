pub mod group;
pub mod join_request;
pub mod member;

use axum::Json;
use axum::http::StatusCode;

use crate::store::StoreError;
use crate::utils::{ApiResponse, error_codes, error_to_api_response};

/// 把存储层错误映射为 HTTP 状态码与响应错误码
pub(crate) fn store_error_response<T>(err: StoreError) -> (StatusCode, Json<ApiResponse<T>>) {
    match err {
        StoreError::NotFound(what) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, format!("{} not found", what)),
        ),
        StoreError::PermissionDenied(msg) => (
            StatusCode::FORBIDDEN,
            error_to_api_response(error_codes::PERMISSION_DENIED, msg),
        ),
        StoreError::Conflict(msg) => (
            StatusCode::CONFLICT,
            error_to_api_response(error_codes::ALREADY_EXISTS, msg),
        ),
        StoreError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            error_to_api_response(error_codes::VALIDATION_ERROR, msg),
        ),
        StoreError::Database(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, e.to_string()),
        ),
    }
}
