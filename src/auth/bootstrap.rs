//! First-run operator provisioning.

use tracing::info;

use super::password::hash_password;
use crate::config::BootstrapConfig;
use crate::db::{Database, IdentityRepository, NewIdentity, NewProfile, ProfileRepository, Role};
use crate::{AtelierError, Result};

/// Create the configured operator account if no profiles exist yet.
///
/// Returns `true` when an account was created. An installation with any
/// profile at all is left untouched, so config edits cannot resurrect or
/// alter accounts.
pub async fn bootstrap_operator(db: &Database, config: &BootstrapConfig) -> Result<bool> {
    let profiles = ProfileRepository::new(db.pool());
    if profiles.count().await? > 0 {
        return Ok(false);
    }

    let hash = hash_password(&config.password).map_err(|e| AtelierError::Auth(e.to_string()))?;

    let identities = IdentityRepository::new(db.pool());
    let identity = identities
        .create(&NewIdentity {
            email: config.email.clone(),
            password: hash,
        })
        .await?;

    profiles
        .create(&NewProfile::new(&identity.id, &config.display_name).with_role(Role::Master))
        .await?;

    info!(email = %config.email, "created bootstrap operator account");
    Ok(true)
}
