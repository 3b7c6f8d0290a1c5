//! Request handlers for the admin shell.
//!
//! Handlers are thin: they validate input, call the shared session, and map
//! its results onto HTTP shapes. Authorization decisions stay inside the
//! auth layer.

use axum::{extract::State, Json};
use validator::Validate;

use crate::auth::{visible_items, LocalProvider, SharedSession, SignupOutcome, ADMIN_NAV};
use crate::web::dto::{
    ApiResponse, LoginRequest, NavEntry, SignupRequest, SignupResponse, UserInfo,
};
use crate::web::error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The process-wide auth session.
    pub session: SharedSession<LocalProvider>,
    /// Where the guard sends unauthenticated requests.
    pub login_path: String,
    /// CORS origins for the admin frontend.
    pub cors_origins: Vec<String>,
    /// Site name, echoed in the health/info surface.
    pub site_name: String,
}

impl AppState {
    /// Create a new application state.
    pub fn new(session: SharedSession<LocalProvider>) -> Self {
        Self {
            session,
            login_path: "/admin/login".to_string(),
            cors_origins: Vec::new(),
            site_name: "Atelier".to_string(),
        }
    }

    /// Set the login redirect path.
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Set the CORS origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Set the site name.
    pub fn with_site_name(mut self, name: impl Into<String>) -> Self {
        self.site_name = name.into();
        self
    }
}

/// POST /api/auth/login - sign in with credentials.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let mut session = state.session.lock().await;
    session.login(&req.email, &req.password).await?;

    let user = session
        .current_user()
        .map(UserInfo::from)
        .ok_or_else(|| ApiError::internal("session lost after login"))?;

    Ok(Json(ApiResponse::new(user)))
}

/// POST /api/auth/logout - sign out.
///
/// Always succeeds; sign-out is best effort by design.
pub async fn logout(State(state): State<AppState>) -> Json<ApiResponse<()>> {
    state.session.lock().await.logout().await;
    Json(ApiResponse::new(()))
}

/// POST /api/auth/signup - create an account.
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<ApiResponse<SignupResponse>>, ApiError> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let mut session = state.session.lock().await;
    let outcome = session
        .signup(&req.email, &req.password, &req.display_name)
        .await?;

    let response = match outcome {
        SignupOutcome::SignedIn => SignupResponse {
            status: "signed_in",
            user: session.current_user().map(UserInfo::from),
        },
        SignupOutcome::ConfirmationRequired => SignupResponse {
            status: "confirmation_required",
            user: None,
        },
    };

    Ok(Json(ApiResponse::new(response)))
}

/// GET /api/auth/me - the signed-in user.
pub async fn me(State(state): State<AppState>) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let session = state.session.lock().await;
    session
        .current_user()
        .map(UserInfo::from)
        .map(|user| Json(ApiResponse::new(user)))
        .ok_or_else(|| ApiError::unauthorized("Not signed in"))
}

/// GET /api/admin/nav - sidebar entries visible to the signed-in user.
///
/// Items the user may not open are omitted entirely; the frontend never
/// learns they exist.
pub async fn nav(State(state): State<AppState>) -> Json<ApiResponse<Vec<NavEntry>>> {
    let session = state.session.lock().await;
    let entries = visible_items(session.status(), ADMIN_NAV)
        .into_iter()
        .map(|item| NavEntry {
            name: item.name,
            href: item.href,
        })
        .collect();
    Json(ApiResponse::new(entries))
}
