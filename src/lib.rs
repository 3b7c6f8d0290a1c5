//! atelier - backend for a marketing/portfolio website with a
//! content-management admin panel.
//!
//! The heart of the crate is the [`auth`] module: a single process-wide
//! authentication session driven by a role hierarchy, plus the route-guard
//! contract the admin shell consumes. The [`web`] module is the thin HTTP
//! shell around it.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod web;

pub use auth::{
    bootstrap_operator, evaluate_guard, hash_password, is_allowed, spawn_event_pump,
    verify_password, visible_items, AuthError, AuthEvent, AuthSession, GuardOutcome,
    IdentityProvider, LocalProvider, NavItem, PasswordError, ProviderError, ProviderSession,
    SessionStatus, SessionStore, SignupOutcome, SignupReceipt, ADMIN_NAV,
};
pub use config::Config;
pub use db::{Database, NewProfile, ProfileRecord, Role, UserProfile};
pub use error::{AtelierError, Result};
pub use web::AppState;
