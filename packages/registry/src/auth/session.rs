//! # Session context
//!
//! [`SessionContext`] owns the application's view of who is signed in. There is one
//! per running application; views receive a clone and read [`AuthState`] from it.
//!
//! ## Lifecycle
//!
//! 1. [`SessionContext::new`] registers a session-change handler with the backend.
//!    The handler only queues the new session; nothing is resolved yet.
//! 2. [`initialize`](SessionContext::initialize) enters `Loading`, discards events
//!    queued so far (the current session already reflects them), then reads the
//!    current session and resolves its profile.
//! 3. [`handle_next_event`](SessionContext::handle_next_event) applies one queued
//!    session change without passing through `Loading` again.
//!    [`run`](SessionContext::run) does step 2 then applies events until shutdown.
//! 4. [`shutdown`](SessionContext::shutdown), or dropping the last clone, releases
//!    the backend registration. The event queue then closes and `run` returns.
//!
//! ## Profile resolution
//!
//! The profile is fetched from `profiles` by identity id. If the fetch fails or
//! does not return exactly one row, the identity stays signed in with no profile,
//! which leaves the role at `user`.

use std::sync::Arc;

use backend::{AuthError, AuthSubscription, Backend, Credentials, Profile, Session, SignUpDetails, Table};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use super::state::AuthState;

const PROFILE_COLUMNS: &str = "id, email, full_name, role";

pub struct SessionContext<B: Backend> {
    inner: Arc<ContextInner<B>>,
}

impl<B: Backend> Clone for SessionContext<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct ContextInner<B: Backend> {
    backend: B,
    state: watch::Sender<AuthState>,
    events: tokio::sync::Mutex<mpsc::UnboundedReceiver<Option<Session>>>,
    subscription: Mutex<Option<AuthSubscription>>,
}

impl<B: Backend> SessionContext<B> {
    pub fn new(backend: B) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = backend.on_session_change(Arc::new(move |session: Option<Session>| {
            // Closed receiver means the context is gone; nothing to update.
            let _ = tx.send(session);
        }));
        let (state, _) = watch::channel(AuthState::Uninitialized);
        Self {
            inner: Arc::new(ContextInner {
                backend,
                state,
                events: tokio::sync::Mutex::new(rx),
                subscription: Mutex::new(Some(subscription)),
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Current state.
    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    pub fn is_admin(&self) -> bool {
        self.inner.state.borrow().is_admin()
    }

    /// Read the current session and resolve its profile.
    pub async fn initialize(&self) {
        self.inner.state.send_replace(AuthState::Loading);
        let session = {
            let mut events = self.inner.events.lock().await;
            let mut stale = 0;
            while events.try_recv().is_ok() {
                stale += 1;
            }
            if stale > 0 {
                tracing::debug!(stale, "dropped session events queued before startup");
            }
            self.inner.backend.current_session().await
        };
        let resolved = self.resolve(session).await;
        tracing::info!(
            signed_in = resolved.is_signed_in(),
            role = %resolved.role(),
            "session initialized"
        );
        self.inner.state.send_replace(resolved);
    }

    /// Apply the next queued session change. Returns `false` once the context has
    /// been shut down and no more events can arrive.
    pub async fn handle_next_event(&self) -> bool {
        let next = self.inner.events.lock().await.recv().await;
        match next {
            Some(session) => {
                let resolved = self.resolve(session).await;
                tracing::debug!(
                    signed_in = resolved.is_signed_in(),
                    role = %resolved.role(),
                    "session changed"
                );
                self.inner.state.send_replace(resolved);
                true
            }
            None => false,
        }
    }

    /// Initialize, then follow session changes until shutdown.
    pub async fn run(&self) {
        self.initialize().await;
        while self.handle_next_event().await {}
    }

    /// Release the backend registration. Safe to call more than once.
    pub fn shutdown(&self) {
        if let Some(subscription) = self.inner.subscription.lock().take() {
            subscription.unsubscribe();
            tracing::debug!("session listener released");
        }
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<(), AuthError> {
        self.inner
            .backend
            .sign_in(credentials)
            .await
            .map(|_| ())
            .inspect_err(|e| tracing::warn!("sign-in failed: {}", e))
    }

    pub async fn sign_up(&self, details: &SignUpDetails) -> Result<(), AuthError> {
        self.inner
            .backend
            .sign_up(details)
            .await
            .map(|_| ())
            .inspect_err(|e| tracing::warn!("sign-up failed: {}", e))
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.inner
            .backend
            .sign_out()
            .await
            .inspect_err(|e| tracing::warn!("sign-out failed: {}", e))
    }

    async fn resolve(&self, session: Option<Session>) -> AuthState {
        let Some(session) = session else {
            return AuthState::Anonymous;
        };
        let identity = session.identity;
        let profile = self
            .inner
            .backend
            .from(Table::Profiles)
            .with_columns(PROFILE_COLUMNS)
            .where_equals("id", identity.id.clone())
            .fetch_one::<Profile>()
            .await;
        let profile = match profile {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => {
                tracing::warn!(user = %identity.id, "no profile row, defaulting to user role");
                None
            }
            Err(e) => {
                tracing::warn!(user = %identity.id, "profile lookup failed, defaulting to user role: {}", e);
                None
            }
        };
        AuthState::Authenticated { identity, profile }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::{FetchError, MemoryBackend};
    use serde_json::json;

    fn backend_with_admin() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.add_account("u-admin", "admin@parish.org", "secret1");
        backend.add_account("u-plain", "plain@parish.org", "secret2");
        backend.seed(
            Table::Profiles,
            [
                json!({"id": "u-admin", "email": "admin@parish.org", "full_name": "Fr. Admin", "role": "admin"}),
                json!({"id": "u-plain", "email": "plain@parish.org", "full_name": "Plain", "role": "user"}),
            ],
        );
        backend
    }

    #[tokio::test]
    async fn test_anonymous_when_no_session() {
        let ctx = SessionContext::new(MemoryBackend::new());
        assert_eq!(ctx.state(), AuthState::Uninitialized);
        assert!(ctx.state().auth_loading());

        ctx.initialize().await;
        let state = ctx.state();
        assert_eq!(state, AuthState::Anonymous);
        assert!(state.identity().is_none());
        assert!(state.profile().is_none());
        assert_eq!(state.role().as_str(), "user");
        assert!(!state.is_admin());
        assert!(!state.auth_loading());
    }

    #[tokio::test]
    async fn test_existing_session_resolves_admin() {
        let backend = backend_with_admin();
        backend
            .sign_in(&Credentials::new("admin@parish.org", "secret1"))
            .await
            .unwrap();

        let ctx = SessionContext::new(backend);
        ctx.initialize().await;
        let state = ctx.state();
        assert_eq!(state.identity().unwrap().id, "u-admin");
        assert_eq!(state.profile().unwrap().full_name.as_deref(), Some("Fr. Admin"));
        assert!(state.is_admin());
        assert!(ctx.is_admin());
    }

    #[tokio::test]
    async fn test_profile_failure_degrades_to_user() {
        let backend = backend_with_admin();
        backend
            .sign_in(&Credentials::new("admin@parish.org", "secret1"))
            .await
            .unwrap();
        backend.fail_next(Table::Profiles, FetchError::Network("timeout".to_string()));

        let ctx = SessionContext::new(backend);
        ctx.initialize().await;
        let state = ctx.state();
        assert!(state.is_signed_in());
        assert!(state.profile().is_none());
        assert!(!state.is_admin());
    }

    #[tokio::test]
    async fn test_missing_profile_row_degrades_to_user() {
        let backend = MemoryBackend::new();
        backend.add_account("u-new", "new@parish.org", "secret3");
        backend
            .sign_in(&Credentials::new("new@parish.org", "secret3"))
            .await
            .unwrap();

        let ctx = SessionContext::new(backend);
        ctx.initialize().await;
        assert!(ctx.state().is_signed_in());
        assert!(!ctx.is_admin());
    }

    #[tokio::test]
    async fn test_session_changes_apply_without_loading() {
        let backend = backend_with_admin();
        let ctx = SessionContext::new(backend.clone());
        ctx.initialize().await;
        let mut watcher = ctx.watch();
        watcher.borrow_and_update();

        ctx.sign_in(&Credentials::new("plain@parish.org", "secret2"))
            .await
            .unwrap();
        assert!(ctx.handle_next_event().await);
        assert!(watcher.has_changed().unwrap());
        let state = watcher.borrow_and_update().clone();
        assert_eq!(state.identity().unwrap().id, "u-plain");
        assert!(!state.is_admin());
        assert!(!state.auth_loading());

        ctx.sign_out().await.unwrap();
        ctx.sign_in(&Credentials::new("admin@parish.org", "secret1"))
            .await
            .unwrap();
        assert!(ctx.handle_next_event().await);
        assert_eq!(ctx.state(), AuthState::Anonymous);
        assert!(ctx.handle_next_event().await);
        assert!(ctx.is_admin());
    }

    #[tokio::test]
    async fn test_startup_events_do_not_replay_after_initialize() {
        let backend = backend_with_admin();
        let ctx = SessionContext::new(backend.clone());
        backend
            .sign_in(&Credentials::new("admin@parish.org", "secret1"))
            .await
            .unwrap();
        backend.sign_out().await.unwrap();

        ctx.initialize().await;
        assert_eq!(ctx.state(), AuthState::Anonymous);

        backend
            .sign_in(&Credentials::new("plain@parish.org", "secret2"))
            .await
            .unwrap();
        assert!(ctx.handle_next_event().await);
        assert_eq!(ctx.state().identity().unwrap().id, "u-plain");
        assert!(!ctx.is_admin());
    }

    #[tokio::test]
    async fn test_session_opened_during_startup_is_picked_up() {
        let backend = backend_with_admin();
        let ctx = SessionContext::new(backend.clone());
        backend
            .sign_in(&Credentials::new("admin@parish.org", "secret1"))
            .await
            .unwrap();

        ctx.initialize().await;
        assert!(ctx.is_admin());
    }

    #[tokio::test]
    async fn test_sign_in_error_is_surfaced() {
        let ctx = SessionContext::new(backend_with_admin());
        ctx.initialize().await;
        let err = ctx
            .sign_in(&Credentials::new("admin@parish.org", "nope"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
        assert_eq!(ctx.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_shutdown_releases_listener_and_ends_run() {
        let backend = backend_with_admin();
        let ctx = SessionContext::new(backend.clone());
        assert_eq!(backend.session_listener_count(), 1);

        ctx.shutdown();
        ctx.shutdown();
        assert_eq!(backend.session_listener_count(), 0);
        // Event queue is closed, so run returns after initializing.
        ctx.run().await;
        assert_eq!(ctx.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_drop_releases_listener() {
        let backend = backend_with_admin();
        let ctx = SessionContext::new(backend.clone());
        let view_copy = ctx.clone();
        drop(ctx);
        assert_eq!(backend.session_listener_count(), 1);
        drop(view_copy);
        assert_eq!(backend.session_listener_count(), 0);
    }
}
