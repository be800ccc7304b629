use axum::{
    Extension,
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::models::GroupMember;
use crate::routes::store_error_response;
use crate::utils::{Claims, success_to_api_response};

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub group_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MemberTarget {
    pub group_id: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferOwnershipRequest {
    pub group_id: String,
    pub new_owner_id: String,
}

#[derive(Debug, Serialize)]
pub struct MembersResponse {
    pub members: Vec<GroupMember>,
    pub member_count: usize,
}

#[axum::debug_handler]
pub async fn get_group_members(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> impl IntoResponse {
    match state.services.members.group_members(&query.group_id).await {
        Ok((members, member_count)) => (
            StatusCode::OK,
            success_to_api_response(MembersResponse {
                members,
                member_count,
            }),
        ),
        Err(e) => store_error_response(e),
    }
}

#[axum::debug_handler]
pub async fn join_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<IdQuery>,
) -> impl IntoResponse {
    match state
        .services
        .members
        .join(&req.group_id, &claims.sub)
        .await
    {
        Ok(membership) => (StatusCode::OK, success_to_api_response(membership)),
        Err(e) => store_error_response(e),
    }
}

#[axum::debug_handler]
pub async fn leave_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<IdQuery>,
) -> impl IntoResponse {
    match state
        .services
        .members
        .leave(&req.group_id, &claims.sub)
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
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<MemberTarget>,
) -> impl IntoResponse {
    match state
        .services
        .members
        .remove(&req.group_id, &req.user_id, &claims.sub)
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
pub async fn promote_member(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<MemberTarget>,
) -> impl IntoResponse {
    match state
        .services
        .roles
        .promote_to_admin(&req.group_id, &req.user_id, &claims.sub)
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
pub async fn demote_member(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<MemberTarget>,
) -> impl IntoResponse {
    match state
        .services
        .roles
        .demote_to_member(&req.group_id, &req.user_id, &claims.sub)
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
pub async fn transfer_ownership(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<TransferOwnershipRequest>,
) -> impl IntoResponse {
    match state
        .services
        .roles
        .transfer_ownership(&req.group_id, &req.new_owner_id, &claims.sub)
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
