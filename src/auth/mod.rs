//! Authentication and authorization for atelier.
//!
//! Session lifecycle, role-based permission evaluation, the route-guard
//! contract, and the identity-provider boundary.

mod bootstrap;
mod guard;
mod password;
mod permission;
mod provider;
mod session;
mod store;

pub use bootstrap::bootstrap_operator;
pub use guard::{evaluate_guard, visible_items, GuardOutcome, NavItem, ADMIN_NAV};
pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
    MIN_PASSWORD_LENGTH,
};
pub use permission::{is_allowed, required_rank};
pub use provider::{
    AuthEvent, IdentityProvider, LocalProvider, ProviderError, ProviderSession, SignupReceipt,
};
pub use session::{
    spawn_event_pump, AuthError, AuthSession, SessionStatus, SharedSession, SignupOutcome,
    DEFAULT_INIT_TIMEOUT_SECS,
};
pub use store::SessionStore;
