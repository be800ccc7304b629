use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::utils::{error_codes, error_to_api_response, verify_token};

/// 校验 Bearer token，把解码出的 Claims 注入请求扩展
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match token.and_then(|t| verify_token(t, &state.config).ok()) {
        Some(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            error_to_api_response::<()>(
                error_codes::AUTH_FAILED,
                "Invalid or missing authorization token".to_string(),
            ),
        )
            .into_response(),
    }
}
