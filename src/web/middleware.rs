//! Route-guard and CORS middleware.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::auth::{evaluate_guard, GuardOutcome};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Guard for the admin surface.
///
/// Mirrors the shell's route-guard contract: while the session is still
/// resolving, clients get a retryable 503 instead of a redirect, so a slow
/// startup never bounces a signed-in operator to the login screen.
pub async fn admin_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let outcome = {
        let session = state.session.lock().await;
        evaluate_guard(session.status())
    };

    match outcome {
        GuardOutcome::Loading => {
            ApiError::unavailable("Session is still initializing, retry shortly").into_response()
        }
        GuardOutcome::RedirectToLogin => Redirect::temporary(&state.login_path).into_response(),
        GuardOutcome::Allow => next.run(request).await,
    }
}

/// Build the CORS layer from configured origins.
///
/// With no origins configured the layer stays at its restrictive default,
/// which suits a same-origin deployment.
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let mut layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    for origin in origins {
        match origin.parse::<HeaderValue>() {
            Ok(value) => layer = layer.allow_origin(value),
            Err(_) => warn!(origin = %origin, "ignoring unparsable CORS origin"),
        }
    }

    layer
}
