//! Authentication session for the admin panel.
//!
//! One session object exists per running instance; it is the single source
//! of truth for who is operating the panel and what they may do. View code
//! reads its status and calls its operations, never the provider directly.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::permission;
use super::provider::{AuthEvent, IdentityProvider, ProviderError};
use super::store::SessionStore;
use crate::db::{Database, NewProfile, ProfileRepository, Role, UserProfile};
use crate::{AtelierError, Result};

/// Default timeout for resolving a prior session at startup.
pub const DEFAULT_INIT_TIMEOUT_SECS: u64 = 10;

/// Authentication errors surfaced to callers.
///
/// Expected failures (wrong password, taken email) carry displayable
/// messages; transport failures collapse to a generic message with the
/// detail kept for logs.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Wrong email or password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Email already registered.
    #[error("an account with this email already exists")]
    EmailTaken,

    /// Password rejected by policy.
    #[error("{0}")]
    WeakPassword(String),

    /// Provider or storage failure. The payload is diagnostic detail, not
    /// shown to users.
    #[error("authentication service is temporarily unavailable")]
    Provider(String),
}

impl From<ProviderError> for AuthError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::InvalidCredentials => AuthError::InvalidCredentials,
            ProviderError::EmailTaken => AuthError::EmailTaken,
            ProviderError::WeakPassword(msg) => AuthError::WeakPassword(msg),
            ProviderError::Unavailable(detail) => AuthError::Provider(detail),
        }
    }
}

/// Result of a successful signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    /// The identity is confirmed and the session is now authenticated.
    SignedIn,
    /// The provider requires a confirmation step; the caller stays
    /// unauthenticated until it completes.
    ConfirmationRequired,
}

/// Session lifecycle state.
///
/// The profile lives inside the `Authenticated` variant, so "authenticated
/// if and only if a user is present" holds by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    /// Startup resolution in flight; route guards must not redirect yet.
    Initializing,
    /// A user is signed in.
    Authenticated(UserProfile),
    /// Nobody is signed in.
    Unauthenticated,
}

impl SessionStatus {
    /// Whether a user is signed in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated(_))
    }

    /// Whether startup resolution is still in flight.
    pub fn is_initializing(&self) -> bool {
        matches!(self, SessionStatus::Initializing)
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Option<&UserProfile> {
        match self {
            SessionStatus::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// The process-wide authentication session.
///
/// Constructed once at startup and injected where needed; the admin shell
/// wraps it in [`SharedSession`] so operations are serialized.
pub struct AuthSession<P> {
    provider: P,
    db: Database,
    store: SessionStore,
    status: SessionStatus,
    init_timeout: Duration,
}

/// Shared handle used by the web shell. The mutex serializes operations so
/// a stale resolution can never overwrite a newer one.
pub type SharedSession<P> = Arc<Mutex<AuthSession<P>>>;

impl<P: IdentityProvider> AuthSession<P> {
    /// Create a session in the `Initializing` state.
    pub fn new(provider: P, db: Database, store: SessionStore) -> Self {
        Self {
            provider,
            db,
            store,
            status: SessionStatus::Initializing,
            init_timeout: Duration::from_secs(DEFAULT_INIT_TIMEOUT_SECS),
        }
    }

    /// Override the startup resolution timeout.
    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = timeout;
        self
    }

    /// Current lifecycle state.
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Option<&UserProfile> {
        self.status.current_user()
    }

    /// Whether a user is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.status.is_authenticated()
    }

    /// Subscribe to the provider's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.provider.subscribe()
    }

    /// Check the signed-in user against a requirement set.
    ///
    /// Pure and synchronous; `false` whenever nobody is signed in.
    pub fn has_permission(&self, required: &[Role]) -> bool {
        permission::is_allowed(self.current_user(), required)
    }

    /// Resolve a prior session at startup.
    ///
    /// Asks the provider for its current session; with none, falls back to
    /// the persisted slot. Every failure path is logged and collapses to
    /// `Unauthenticated` so the caller can always proceed to render.
    pub async fn initialize(&mut self) {
        if !self.status.is_initializing() {
            debug!("initialize called twice, ignoring");
            return;
        }

        let resolved =
            match tokio::time::timeout(self.init_timeout, self.provider.current_session()).await {
                Err(_) => {
                    warn!("session resolution timed out, continuing unauthenticated");
                    None
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "identity provider unavailable at startup, continuing unauthenticated");
                    None
                }
                Ok(Ok(Some(session))) => {
                    match self.resolve_profile(&session.identity_id, &session.email).await {
                        Ok(profile) => {
                            self.persist(&profile);
                            Some(profile)
                        }
                        Err(e) => {
                            warn!(error = %e, "failed to resolve provider session, continuing unauthenticated");
                            self.discard_slot();
                            None
                        }
                    }
                }
                Ok(Ok(None)) => self.store.load(),
            };

        self.status = match resolved {
            Some(profile) => {
                info!(email = %profile.email, role = %profile.role, "session restored");
                SessionStatus::Authenticated(profile)
            }
            None => SessionStatus::Unauthenticated,
        };
    }

    /// Sign in with credentials.
    ///
    /// The profile is resolved before this returns, so a caller can read
    /// `current_user` immediately after a successful login.
    pub async fn login(&mut self, email: &str, password: &str) -> std::result::Result<(), AuthError> {
        let session = self.provider.sign_in(email, password).await.map_err(|e| {
            if let ProviderError::Unavailable(ref detail) = e {
                warn!(error = %detail, "provider failure during login");
            }
            AuthError::from(e)
        })?;

        match self.resolve_profile(&session.identity_id, &session.email).await {
            Ok(profile) => {
                self.persist(&profile);
                info!(email = %profile.email, role = %profile.role, "login successful");
                self.status = SessionStatus::Authenticated(profile);
                Ok(())
            }
            Err(e) => {
                // Signed in at the provider but no usable profile: roll the
                // provider session back so the two never disagree.
                warn!(error = %e, "profile resolution failed after sign-in");
                if let Err(e) = self.provider.sign_out().await {
                    warn!(error = %e, "rollback sign-out failed");
                }
                self.status = SessionStatus::Unauthenticated;
                Err(AuthError::Provider(e.to_string()))
            }
        }
    }

    /// Create an account with the least-privileged role.
    ///
    /// When the provider confirms the identity immediately, the session is
    /// signed in before returning; otherwise the caller is told a
    /// confirmation step is pending.
    pub async fn signup(
        &mut self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> std::result::Result<SignupOutcome, AuthError> {
        let receipt = self.provider.sign_up(email, password).await?;

        let profiles = ProfileRepository::new(self.db.pool());
        profiles
            .create(&NewProfile::new(&receipt.identity_id, display_name))
            .await
            .map_err(|e| {
                warn!(error = %e, "profile creation failed during signup");
                AuthError::Provider(e.to_string())
            })?;

        if receipt.confirmed {
            self.login(email, password).await?;
            Ok(SignupOutcome::SignedIn)
        } else {
            info!(email = %email, "signup pending confirmation");
            Ok(SignupOutcome::ConfirmationRequired)
        }
    }

    /// Sign out.
    ///
    /// Never fails the caller: provider errors are logged and the session
    /// still ends `Unauthenticated`. Idempotent.
    pub async fn logout(&mut self) {
        if let Err(e) = self.provider.sign_out().await {
            warn!(error = %e, "provider sign-out failed, clearing session anyway");
        }
        self.discard_slot();

        if self.status.is_authenticated() {
            info!("logged out");
        }
        self.status = SessionStatus::Unauthenticated;
    }

    /// Apply a provider notification.
    pub async fn apply_event(&mut self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(session) => {
                // Login already resolved this identity; nothing to redo.
                if let Some(user) = self.current_user() {
                    if user.id == session.identity_id {
                        return;
                    }
                }
                match self.resolve_profile(&session.identity_id, &session.email).await {
                    Ok(profile) => {
                        self.persist(&profile);
                        self.status = SessionStatus::Authenticated(profile);
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to resolve signed-in identity");
                        self.discard_slot();
                        self.status = SessionStatus::Unauthenticated;
                    }
                }
            }
            AuthEvent::SignedOut => {
                if self.status.is_authenticated() {
                    debug!("provider reported sign-out");
                    self.discard_slot();
                    self.status = SessionStatus::Unauthenticated;
                }
            }
            AuthEvent::UserUpdated { identity_id } => {
                let Some(user) = self.current_user() else {
                    return;
                };
                if user.id != identity_id {
                    return;
                }
                let email = user.email.clone();
                match self.resolve_profile(&identity_id, &email).await {
                    Ok(profile) => {
                        debug!(email = %profile.email, "profile refreshed");
                        self.persist(&profile);
                        self.status = SessionStatus::Authenticated(profile);
                    }
                    Err(e) => {
                        // Keep the session; stale profile beats a surprise
                        // logout on a transient read failure.
                        warn!(error = %e, "profile refresh failed, keeping current profile");
                    }
                }
            }
        }
    }

    /// Join the provider identity with the profile store.
    async fn resolve_profile(&self, identity_id: &str, email: &str) -> Result<UserProfile> {
        let profiles = ProfileRepository::new(self.db.pool());
        let record = profiles
            .get(identity_id)
            .await?
            .ok_or_else(|| AtelierError::NotFound("profile".to_string()))?;

        Ok(UserProfile {
            id: identity_id.to_string(),
            email: email.to_string(),
            display_name: record.full_name,
            role: record.role,
            avatar_url: record.avatar_url,
        })
    }

    fn persist(&self, profile: &UserProfile) {
        if let Err(e) = self.store.save(profile) {
            warn!(error = %e, "failed to persist session slot");
        }
    }

    fn discard_slot(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear session slot");
        }
    }
}

/// Forward provider events into the session until the stream closes.
///
/// The returned handle is the subscription's scope: abort it at shutdown to
/// release the channel.
pub fn spawn_event_pump<P>(
    session: SharedSession<P>,
    mut events: broadcast::Receiver<AuthEvent>,
) -> JoinHandle<()>
where
    P: IdentityProvider + 'static,
{
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => session.lock().await.apply_event(event).await,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "auth event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("auth event stream closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::provider::{LocalProvider, ProviderSession, SignupReceipt};
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        db: Database,
        store_path: std::path::PathBuf,
    }

    impl Harness {
        async fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let store_path = dir.path().join("session.json");
            Self {
                _dir: dir,
                db: Database::open_in_memory().await.unwrap(),
                store_path,
            }
        }

        fn session(&self) -> AuthSession<LocalProvider> {
            let provider = LocalProvider::new(&self.db);
            AuthSession::new(
                provider,
                self.db.clone(),
                SessionStore::new(&self.store_path),
            )
        }

        async fn seed_user(&self, email: &str, password: &str, name: &str, role: Role) {
            let provider = LocalProvider::new(&self.db);
            let receipt = provider.sign_up(email, password).await.unwrap();
            let profiles = ProfileRepository::new(self.db.pool());
            profiles
                .create(&NewProfile::new(&receipt.identity_id, name).with_role(role))
                .await
                .unwrap();
        }
    }

    /// Provider whose every call fails with a transport error.
    struct BrokenProvider {
        events: broadcast::Sender<AuthEvent>,
    }

    impl BrokenProvider {
        fn new() -> Self {
            let (events, _) = broadcast::channel(4);
            Self { events }
        }
    }

    impl IdentityProvider for BrokenProvider {
        async fn sign_in(&self, _: &str, _: &str) -> std::result::Result<ProviderSession, ProviderError> {
            Err(ProviderError::Unavailable("connection refused".to_string()))
        }

        async fn sign_up(&self, _: &str, _: &str) -> std::result::Result<SignupReceipt, ProviderError> {
            Err(ProviderError::Unavailable("connection refused".to_string()))
        }

        async fn sign_out(&self) -> std::result::Result<(), ProviderError> {
            Err(ProviderError::Unavailable("connection refused".to_string()))
        }

        async fn current_session(
            &self,
        ) -> std::result::Result<Option<ProviderSession>, ProviderError> {
            Err(ProviderError::Unavailable("connection refused".to_string()))
        }

        fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
            self.events.subscribe()
        }
    }

    #[tokio::test]
    async fn test_starts_initializing() {
        let harness = Harness::new().await;
        let session = harness.session();
        assert!(session.status().is_initializing());
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_initialize_fresh_is_unauthenticated() {
        let harness = Harness::new().await;
        let mut session = harness.session();
        session.initialize().await;
        assert_eq!(*session.status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_initialize_never_leaves_initializing_set() {
        let harness = Harness::new().await;
        let mut session = harness.session();
        session.initialize().await;
        assert!(!session.status().is_initializing());
        // Second call is a no-op.
        session.initialize().await;
        assert!(!session.status().is_initializing());
    }

    #[tokio::test]
    async fn test_initialize_swallows_provider_failure() {
        let harness = Harness::new().await;
        let mut session = AuthSession::new(
            BrokenProvider::new(),
            harness.db.clone(),
            SessionStore::new(&harness.store_path),
        );
        session.initialize().await;
        assert_eq!(*session.status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_initialize_resumes_from_slot() {
        let harness = Harness::new().await;
        harness
            .seed_user("ana@example.com", "correct-horse", "Ana", Role::Editor)
            .await;

        // First run: log in, which persists the slot.
        let mut session = harness.session();
        session.initialize().await;
        session.login("ana@example.com", "correct-horse").await.unwrap();

        // Second run: fresh session object, fresh provider, same slot.
        let mut restarted = harness.session();
        restarted.initialize().await;
        let user = restarted.current_user().unwrap();
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.role, Role::Editor);
    }

    #[tokio::test]
    async fn test_initialize_malformed_slot() {
        let harness = Harness::new().await;
        std::fs::write(&harness.store_path, "{broken").unwrap();

        let mut session = harness.session();
        session.initialize().await;
        assert_eq!(*session.status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_login_resolves_profile_before_returning() {
        let harness = Harness::new().await;
        harness
            .seed_user("ana@example.com", "correct-horse", "Ana", Role::Admin)
            .await;

        let mut session = harness.session();
        session.initialize().await;
        session.login("ana@example.com", "correct-horse").await.unwrap();

        let user = session.current_user().unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.display_name, "Ana");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let harness = Harness::new().await;
        harness
            .seed_user("ana@example.com", "correct-horse", "Ana", Role::Admin)
            .await;

        let mut session = harness.session();
        session.initialize().await;
        let result = session.login("ana@example.com", "wrong-password").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert_eq!(*session.status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_login_without_profile_rolls_back() {
        let harness = Harness::new().await;
        // Identity exists but no profile row.
        let provider = LocalProvider::new(&harness.db);
        provider.sign_up("ana@example.com", "correct-horse").await.unwrap();

        let mut session = harness.session();
        session.initialize().await;
        let result = session.login("ana@example.com", "correct-horse").await;
        assert!(matches!(result, Err(AuthError::Provider(_))));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_signup_signs_in_with_least_privilege() {
        let harness = Harness::new().await;
        let mut session = harness.session();
        session.initialize().await;

        let outcome = session
            .signup("new@example.com", "correct-horse", "Newcomer")
            .await
            .unwrap();
        assert_eq!(outcome, SignupOutcome::SignedIn);

        let user = session.current_user().unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.display_name, "Newcomer");
    }

    #[tokio::test]
    async fn test_signup_email_taken() {
        let harness = Harness::new().await;
        harness
            .seed_user("ana@example.com", "correct-horse", "Ana", Role::User)
            .await;

        let mut session = harness.session();
        session.initialize().await;
        let result = session
            .signup("ana@example.com", "other-password", "Other")
            .await;
        assert!(matches!(result, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_logout_idempotent() {
        let harness = Harness::new().await;
        harness
            .seed_user("ana@example.com", "correct-horse", "Ana", Role::Master)
            .await;

        let mut session = harness.session();
        session.initialize().await;
        session.login("ana@example.com", "correct-horse").await.unwrap();
        assert!(session.is_authenticated());

        session.logout().await;
        assert_eq!(*session.status(), SessionStatus::Unauthenticated);
        assert!(session.current_user().is_none());

        // Logging out again changes nothing.
        session.logout().await;
        assert_eq!(*session.status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_logout_survives_broken_provider() {
        let harness = Harness::new().await;
        let mut session = AuthSession::new(
            BrokenProvider::new(),
            harness.db.clone(),
            SessionStore::new(&harness.store_path),
        );
        session.initialize().await;
        session.logout().await;
        assert_eq!(*session.status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_has_permission_through_session() {
        let harness = Harness::new().await;
        harness
            .seed_user("ana@example.com", "correct-horse", "Ana", Role::Admin)
            .await;

        let mut session = harness.session();
        session.initialize().await;
        assert!(!session.has_permission(&[]));

        session.login("ana@example.com", "correct-horse").await.unwrap();
        assert!(session.has_permission(&[Role::Admin]));
        assert!(session.has_permission(&[Role::Editor, Role::Writer]));
        assert!(!session.has_permission(&[Role::Master]));
        assert!(session.has_permission(&[]));
    }

    #[tokio::test]
    async fn test_sign_out_event_clears_session() {
        let harness = Harness::new().await;
        harness
            .seed_user("ana@example.com", "correct-horse", "Ana", Role::Admin)
            .await;

        let mut session = harness.session();
        session.initialize().await;
        session.login("ana@example.com", "correct-horse").await.unwrap();

        session.apply_event(AuthEvent::SignedOut).await;
        assert_eq!(*session.status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_user_updated_event_refreshes_profile() {
        let harness = Harness::new().await;
        harness
            .seed_user("ana@example.com", "correct-horse", "Ana", Role::Writer)
            .await;

        let mut session = harness.session();
        session.initialize().await;
        session.login("ana@example.com", "correct-horse").await.unwrap();
        let id = session.current_user().unwrap().id.clone();

        sqlx::query("UPDATE profiles SET role = 'editor', full_name = 'Ana M.' WHERE identity_id = ?")
            .bind(&id)
            .execute(harness.db.pool())
            .await
            .unwrap();

        session
            .apply_event(AuthEvent::UserUpdated {
                identity_id: id.clone(),
            })
            .await;

        // Status stayed authenticated, the profile was replaced in place.
        let user = session.current_user().unwrap();
        assert_eq!(user.role, Role::Editor);
        assert_eq!(user.display_name, "Ana M.");
    }

    #[tokio::test]
    async fn test_user_updated_event_for_other_identity_ignored() {
        let harness = Harness::new().await;
        harness
            .seed_user("ana@example.com", "correct-horse", "Ana", Role::Writer)
            .await;

        let mut session = harness.session();
        session.initialize().await;
        session.login("ana@example.com", "correct-horse").await.unwrap();

        session
            .apply_event(AuthEvent::UserUpdated {
                identity_id: "someone-else".to_string(),
            })
            .await;
        assert_eq!(session.current_user().unwrap().display_name, "Ana");
    }

    #[tokio::test]
    async fn test_event_pump_applies_provider_events() {
        let harness = Harness::new().await;
        harness
            .seed_user("ana@example.com", "correct-horse", "Ana", Role::Admin)
            .await;

        let provider = LocalProvider::new(&harness.db);
        let mut session = AuthSession::new(
            provider,
            harness.db.clone(),
            SessionStore::new(&harness.store_path),
        );
        session.initialize().await;

        let shared: SharedSession<LocalProvider> = Arc::new(Mutex::new(session));
        let events = shared.lock().await.subscribe();
        let pump = spawn_event_pump(shared.clone(), events);

        shared
            .lock()
            .await
            .login("ana@example.com", "correct-horse")
            .await
            .unwrap();

        // Let the pump drain the SignedIn notification.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(shared.lock().await.is_authenticated());

        pump.abort();
    }
}
