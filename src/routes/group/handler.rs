use axum::{
    Extension,
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::AppState;
use crate::models::{CreateGroupRequest, UpdateGroupRequest};
use crate::routes::store_error_response;
use crate::utils::{Claims, success_to_api_response};

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub group_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGroupPayload {
    pub group_id: String,
    #[serde(flatten)]
    pub updates: UpdateGroupRequest,
}

#[axum::debug_handler]
pub async fn create_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGroupRequest>,
) -> impl IntoResponse {
    match state.services.groups.create(req, &claims.sub).await {
        Ok(group) => (StatusCode::CREATED, success_to_api_response(group)),
        Err(e) => store_error_response(e),
    }
}

#[axum::debug_handler]
pub async fn get_group_detail(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> impl IntoResponse {
    match state.services.groups.detail(&query.group_id).await {
        Ok(detail) => (StatusCode::OK, success_to_api_response(detail)),
        Err(e) => store_error_response(e),
    }
}

#[axum::debug_handler]
pub async fn update_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateGroupPayload>,
) -> impl IntoResponse {
    match state
        .services
        .groups
        .update(&req.group_id, req.updates, &claims.sub)
        .await
    {
        Ok(group) => (StatusCode::OK, success_to_api_response(group)),
        Err(e) => store_error_response(e),
    }
}

#[axum::debug_handler]
pub async fn delete_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<IdQuery>,
) -> impl IntoResponse {
    match state
        .services
        .groups
        .delete(&req.group_id, &claims.sub)
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
pub async fn get_suggested_groups(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let limit = state.config.suggested_groups_limit;
    match state.services.groups.suggested(&claims.sub, limit).await {
        Ok(groups) => (StatusCode::OK, success_to_api_response(groups)),
        Err(e) => store_error_response(e),
    }
}
