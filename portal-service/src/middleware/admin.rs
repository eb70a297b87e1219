use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::services::SessionClaims;

/// Middleware requiring an administrator session. Runs behind
/// `auth_middleware`, which stores validated claims in the extensions.
pub async fn require_admin_middleware(request: Request, next: Next) -> Response {
    match request.extensions().get::<SessionClaims>() {
        Some(claims) if claims.is_admin() => next.run(request).await,
        Some(claims) => {
            tracing::warn!(account_id = %claims.sub, "Non-administrator hit an admin route");
            (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Administrator access required" })),
            )
                .into_response()
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Authentication required" })),
        )
            .into_response(),
    }
}
