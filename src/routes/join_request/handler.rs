use axum::{
    Extension,
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::AppState;
use crate::routes::store_error_response;
use crate::utils::{Claims, success_to_api_response};

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub group_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequestPayload {
    pub group_id: String,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RequestIdPayload {
    pub request_id: String,
}

#[axum::debug_handler]
pub async fn create_join_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateRequestPayload>,
) -> impl IntoResponse {
    match state
        .services
        .requests
        .request_to_join(&req.group_id, &claims.sub, req.message)
        .await
    {
        Ok(request) => (StatusCode::OK, success_to_api_response(request)),
        Err(e) => store_error_response(e),
    }
}

#[axum::debug_handler]
pub async fn cancel_join_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<IdQuery>,
) -> impl IntoResponse {
    match state
        .services
        .requests
        .cancel(&req.group_id, &claims.sub)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({
                "success": true
            })),
        ),
        Err(e) => store_error_response(e),
    }
}

#[axum::debug_handler]
pub async fn approve_join_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RequestIdPayload>,
) -> impl IntoResponse {
    match state
        .services
        .requests
        .approve(&req.request_id, &claims.sub)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({
                "success": true
            })),
        ),
        Err(e) => store_error_response(e),
    }
}

#[axum::debug_handler]
pub async fn reject_join_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RequestIdPayload>,
) -> impl IntoResponse {
    match state
        .services
        .requests
        .reject(&req.request_id, &claims.sub)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({
                "success": true
            })),
        ),
        Err(e) => store_error_response(e),
    }
}

#[axum::debug_handler]
pub async fn get_pending_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<IdQuery>,
) -> impl IntoResponse {
    match state
        .services
        .requests
        .pending(&query.group_id, &claims.sub)
        .await
    {
        Ok(requests) => (StatusCode::OK, success_to_api_response(requests)),
        Err(e) => store_error_response(e),
    }
}
