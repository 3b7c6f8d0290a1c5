//! Request and response DTOs for the admin shell.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::{Role, UserProfile};

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Signup request.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Email address.
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
    /// Display name.
    #[validate(length(min = 1, max = 100, message = "display name is required"))]
    pub display_name: String,
}

/// User info exposed to the frontend.
///
/// Deliberately excludes the session handle and anything else owned by the
/// auth layer.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    /// Stable user id.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Role string.
    pub role: Role,
    /// Avatar URL, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl From<&UserProfile> for UserInfo {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id.clone(),
            email: profile.email.clone(),
            display_name: profile.display_name.clone(),
            role: profile.role,
            avatar_url: profile.avatar_url.clone(),
        }
    }
}

/// Signup response.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    /// `signed_in` or `confirmation_required`.
    pub status: &'static str,
    /// The signed-in user, when signup authenticated immediately.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

/// Navigation entry as rendered by the sidebar.
#[derive(Debug, Serialize)]
pub struct NavEntry {
    /// Label.
    pub name: &'static str,
    /// Route.
    pub href: &'static str,
}

/// Generic success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Payload.
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Wrap a payload.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
