use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::database::AppState;
use crate::model::Identity;

/// Middleware resolving the caller identity for `/api` routes
///
/// The identity provider is external to this service: requests arrive with
/// an `X-User-Id` header naming the caller, and optionally an
/// `X-Admin-Token` header. The admin capability is granted only when that
/// token matches the one configured in [`AppState`]; a deployment with no
/// configured token has no admins at all.
///
/// A missing or unreadable `X-User-Id` short-circuits with 401. On success
/// an [`Identity`] is inserted as a request extension so handlers evaluate
/// the capability exactly once.
pub async fn identity_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let unauthorized = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Unauthorized",
                "message": "Missing or invalid X-User-Id header"
            })),
        )
            .into_response()
    };

    let user_id = match headers.get("X-User-Id") {
        Some(value) => match value.to_str() {
            Ok(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => return Err(unauthorized()),
        },
        None => return Err(unauthorized()),
    };

    let is_admin = match (&state.admin_token, headers.get("X-Admin-Token")) {
        (Some(expected), Some(supplied)) => {
            supplied.to_str().map(|token| token == expected).unwrap_or(false)
        }
        _ => false,
    };

    request.extensions_mut().insert(Identity { user_id, is_admin });

    Ok(next.run(request).await)
}
