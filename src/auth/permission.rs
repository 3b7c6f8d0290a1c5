//! Permission evaluation for the admin panel.
//!
//! Authorization is rank-based: every [`Role`] carries a fixed rank and a
//! requirement set is collapsed to a single threshold before comparison.

use crate::db::{Role, UserProfile};

/// Collapse a requirement set to the rank a user must meet.
///
/// The threshold is the rank of the *most* senior role listed. An empty set
/// carries no restriction and yields `None`.
///
/// Listing several roles therefore does not mean "any of these suffices":
/// `[Master, User]` collapses to rank 5 and only a master passes. The admin
/// navigation annotations rely on exactly this behavior.
pub fn required_rank(required: &[Role]) -> Option<u8> {
    required.iter().map(|r| r.rank()).max()
}

/// Check whether the given user satisfies a requirement set.
///
/// Unauthenticated callers are always refused, whatever the set. For an
/// authenticated user an empty set means "no restriction".
///
/// # Examples
///
/// ```
/// use atelier::db::Role;
/// use atelier::auth::is_allowed;
///
/// // Nobody logged in: always false.
/// assert!(!is_allowed(None, &[]));
/// assert!(!is_allowed(None, &[Role::User]));
/// ```
pub fn is_allowed(user: Option<&UserProfile>, required: &[Role]) -> bool {
    let Some(user) = user else {
        return false;
    };

    match required_rank(required) {
        Some(rank) => user.role.rank() >= rank,
        None => true,
    }
}
