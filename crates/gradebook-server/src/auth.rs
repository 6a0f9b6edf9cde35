use std::sync::Arc;

use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use headers::authorization::Basic;
use headers::{Authorization, HeaderMapExt};

use gradebook_core::auth::Gate;
use gradebook_core::models::Role;

use crate::error::ApiError;
use crate::state::AppState;

/// Middleware admitting authenticated students (`user` role).
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    admit(&state, request, next, &[Role::User]).await
}

/// Middleware admitting authenticated teachers (`admin` role).
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    admit(&state, request, next, &[Role::Admin]).await
}

/// Validates `Authorization: Basic` against the credential table and stores
/// the resulting [`Identity`](gradebook_core::Identity) in request extensions.
async fn admit(
    state: &AppState,
    mut request: Request<axum::body::Body>,
    next: Next,
    allowed: &[Role],
) -> Response {
    let header = request.headers().typed_get::<Authorization<Basic>>();
    let credentials = header
        .as_ref()
        .map(|auth| (auth.username(), auth.password()));

    let gate = Gate::new(state.db.user_repo());
    match gate.admit(credentials, allowed).await {
        Ok(identity) => {
            tracing::debug!(username = %identity.username, role = %identity.role, "Admitted");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => ApiError(err).into_response(),
    }
}
