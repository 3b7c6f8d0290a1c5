//! Identity provider boundary.
//!
//! The session component treats credential verification as an external
//! service: it signs in, signs up, signs out, asks for the current session,
//! and listens to an event stream. [`LocalProvider`] implements the contract
//! over the local database with Argon2 verification; a hosted provider would
//! slot in behind the same trait.

use std::future::Future;
use std::sync::Arc;

use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use super::password::{hash_password, verify_password, PasswordError};
use crate::db::{Database, IdentityRepository, NewIdentity};

/// Capacity of the auth event channel.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Provider-level errors.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Wrong email or password. Expected, user-facing.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An identity with this email already exists.
    #[error("an account with this email already exists")]
    EmailTaken,

    /// Password rejected by policy.
    #[error("{0}")]
    WeakPassword(String),

    /// Provider transport or storage failure. Unexpected, generic.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

impl From<PasswordError> for ProviderError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::TooShort | PasswordError::TooLong => {
                ProviderError::WeakPassword(e.to_string())
            }
            PasswordError::InvalidHash | PasswordError::VerificationFailed => {
                ProviderError::InvalidCredentials
            }
            PasswordError::HashError(msg) => ProviderError::Unavailable(msg),
        }
    }
}

/// An authenticated provider session.
///
/// `handle` is the opaque session token; it stays inside the auth layer and
/// is never serialized into view-facing DTOs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    /// Stable identity id.
    pub identity_id: String,
    /// Email the identity signed in with.
    pub email: String,
    /// Opaque session handle.
    pub handle: String,
}

/// Result of a sign-up call.
#[derive(Debug, Clone)]
pub struct SignupReceipt {
    /// Id of the freshly created identity.
    pub identity_id: String,
    /// Whether the identity is usable immediately. Providers that require
    /// email confirmation report `false`.
    pub confirmed: bool,
}

/// Notifications emitted by the provider.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// An identity signed in.
    SignedIn(ProviderSession),
    /// The active identity signed out.
    SignedOut,
    /// Profile data changed for an identity.
    UserUpdated {
        /// The affected identity.
        identity_id: String,
    },
}

/// External identity provider contract.
///
/// Methods return `Send` futures so the session can be driven from spawned
/// tasks and web handlers.
pub trait IdentityProvider: Send + Sync {
    /// Verify credentials and open a session.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<ProviderSession, ProviderError>> + Send;

    /// Create a new identity.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<SignupReceipt, ProviderError>> + Send;

    /// Close the active session. Best effort.
    fn sign_out(&self) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// The session the provider currently considers active, if any.
    fn current_session(
        &self,
    ) -> impl Future<Output = Result<Option<ProviderSession>, ProviderError>> + Send;

    /// Subscribe to the provider's event stream.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Identity provider backed by the local database.
///
/// Cheap to clone; clones share the active session and the event channel,
/// so admin tooling can hold its own handle next to the session's.
#[derive(Clone)]
pub struct LocalProvider {
    pool: SqlitePool,
    events: broadcast::Sender<AuthEvent>,
    active: Arc<Mutex<Option<ProviderSession>>>,
}

impl LocalProvider {
    /// Create a provider over the given database.
    pub fn new(db: &Database) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            pool: db.pool().clone(),
            events,
            active: Arc::new(Mutex::new(None)),
        }
    }

    fn emit(&self, event: AuthEvent) {
        // Nobody listening is fine; the channel just drops the event.
        let _ = self.events.send(event);
    }

    /// Emit a profile-updated notification for an identity.
    ///
    /// Called by admin tooling after editing profile rows so a live session
    /// picks the change up.
    pub fn notify_user_updated(&self, identity_id: impl Into<String>) {
        self.emit(AuthEvent::UserUpdated {
            identity_id: identity_id.into(),
        });
    }
}

impl IdentityProvider for LocalProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, ProviderError> {
        let repo = IdentityRepository::new(&self.pool);

        let identity = repo
            .get_by_email(email)
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let Some(identity) = identity else {
            info!(email = %email, "sign-in failed: unknown email");
            return Err(ProviderError::InvalidCredentials);
        };

        if verify_password(password, &identity.password).is_err() {
            info!(email = %email, "sign-in failed: wrong password");
            return Err(ProviderError::InvalidCredentials);
        }

        if let Err(e) = repo.update_last_login(&identity.id).await {
            warn!(error = %e, "failed to record last login");
        }

        let session = ProviderSession {
            identity_id: identity.id,
            email: identity.email,
            handle: Uuid::new_v4().to_string(),
        };

        *self.active.lock().await = Some(session.clone());
        self.emit(AuthEvent::SignedIn(session.clone()));

        info!(email = %session.email, "sign-in successful");
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignupReceipt, ProviderError> {
        let repo = IdentityRepository::new(&self.pool);

        let existing = repo
            .get_by_email(email)
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        if existing.is_some() {
            return Err(ProviderError::EmailTaken);
        }

        let hash = hash_password(password)?;
        let identity = repo
            .create(&NewIdentity {
                email: email.to_string(),
                password: hash,
            })
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        info!(email = %email, "identity created");
        Ok(SignupReceipt {
            identity_id: identity.id,
            // The local provider has no confirmation step.
            confirmed: true,
        })
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let was_active = self.active.lock().await.take().is_some();
        if was_active {
            self.emit(AuthEvent::SignedOut);
        }
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<ProviderSession>, ProviderError> {
        Ok(self.active.lock().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
