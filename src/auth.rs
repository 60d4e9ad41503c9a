use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::models::AppState;
use crate::AppError;

/// Gate for the admin surface: requires `Authorization: Bearer <token>`
/// with the configured admin token.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == state.auth.token);
    if !authorized {
        return AppError::Unauthorized.into_response();
    }
    next.run(request).await
}
