//! HTTP route table.

use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::web::handlers::{self, AppState};
use crate::web::middleware::{admin_guard, create_cors_layer};

/// Assemble the application router.
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/signup", post(handlers::signup))
        .route("/me", get(handlers::me));

    let admin_routes = Router::new()
        .route("/nav", get(handlers::nav))
        .route_layer(from_fn_with_state(state.clone(), admin_guard));

    let cors = create_cors_layer(&state.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth_routes)
        .nest("/api/admin", admin_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe; also reports whether session startup has finished.
async fn health(State(state): State<AppState>) -> Json<Value> {
    let session = state.session.lock().await;
    Json(json!({
        "status": "ok",
        "site": state.site_name,
        "session_ready": !session.status().is_initializing(),
    }))
}
