//! Session Manager - process-wide authentication state
//!
//! The `SessionManager` is the single writer of [`AuthState`]. It is driven by
//! explicit calls (sign-in, sign-up, sign-out, profile update) and by the
//! identity provider's event stream, and it drives profile resolution and
//! post-login navigation.
//!
//! ## Organization
//!
//! 1. **Construction** - building the manager from injected services
//! 2. **Lifecycle** - worker start, provider subscription, bootstrap
//! 3. **Operations** - sign-in, sign-up, sign-out, profile update
//! 4. **Event handling** - provider callbacks and deferred tasks
//! 5. **State plumbing** - loading/attempt guards, commits, navigation
//! 6. **Tests**

use crate::authentication::{AuthenticationConfig, SessionServices};
use crate::guard::RouteGuard;
use crate::models::auth::AuthError;
use crate::models::{AuthPhase, AuthState, ProfileSeed, ProfileUpdate, Session};
use crate::notify::Notifier;
use crate::profile::ProfileResolver;
use crate::provider::{AuthEvent, AuthEventHandler, IdentityProvider, SignOutScope, Subscription};
use crate::session::navigation::{Navigator, RouteTable};
use crate::session::state::{AuthStateReceiver, AuthStore};
use crate::session::tasks::{AuthTask, TaskQueue};
use crate::storage::StorageSanitizer;
use crate::utils::logging::LoggingHelper;
use crate::utils::redirect_validator::validate_email_redirect_url;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::mpsc;

// =============================================================================
// Session Manager Structure
// =============================================================================

/// Owner of the process-wide [`AuthState`]
///
/// Cloning is cheap; every clone drives the same state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    store: AuthStore,
    provider: Arc<dyn IdentityProvider>,
    resolver: ProfileResolver,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    sanitizer: StorageSanitizer,
    routes: RouteTable,
    email_redirect_url: String,
    signup_redirect_delay: Duration,
    profile_fetch_delay: Duration,
    tasks: TaskQueue,
    subscription: Mutex<Option<Subscription>>,
    authenticating: AtomicBool,
    /// Identity whose profile fetch is currently outstanding
    resolving: Mutex<Option<String>>,
}

// =============================================================================
// 1. Construction
// =============================================================================

impl SessionManager {
    /// Create a session manager from its collaborators and configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the storage key pattern or the email
    /// redirect URL is invalid
    pub fn new(services: SessionServices, config: AuthenticationConfig) -> Result<Self, AuthError> {
        let email_redirect_url = validate_email_redirect_url(&config.email_redirect_url)?;
        let sanitizer = services.storage_areas.into_iter().fold(
            StorageSanitizer::new(&config.storage_key_pattern)?,
            StorageSanitizer::with_area,
        );

        Ok(Self {
            inner: Arc::new(Inner {
                store: AuthStore::new(),
                provider: services.provider,
                resolver: ProfileResolver::new(services.profile_store),
                navigator: services.navigator,
                notifier: services.notifier,
                sanitizer,
                routes: config.routes,
                email_redirect_url,
                signup_redirect_delay: config.signup_redirect_delay,
                profile_fetch_delay: config.profile_fetch_delay,
                tasks: TaskQueue::new(),
                subscription: Mutex::new(None),
                authenticating: AtomicBool::new(false),
                resolving: Mutex::new(None),
            }),
        })
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner.store.read()
    }

    /// Receiver woken on every state change
    #[must_use]
    pub fn subscribe(&self) -> AuthStateReceiver {
        self.inner.store.subscribe()
    }

    /// Route guard using this manager's sign-in and forbidden views
    #[must_use]
    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(&self.inner.routes)
    }
}

// =============================================================================
// 2. Lifecycle
// =============================================================================

impl SessionManager {
    /// Start the task worker, subscribe to provider events and bootstrap
    ///
    /// Must be called from within a tokio runtime. Calling it again only
    /// re-runs bootstrap; the worker and subscription are registered once.
    pub async fn start(&self) {
        self.spawn_task_worker();
        self.subscribe_to_provider();
        self.bootstrap().await;
    }

    /// Restore an existing provider session, resolving its profile inline
    ///
    /// Never fails: errors are logged and the user starts unauthenticated.
    pub async fn bootstrap(&self) {
        let inner = &self.inner;
        let loading = inner.begin_loading(AuthPhase::Bootstrapping);

        match inner.provider.get_session().await {
            Ok(Some(session)) if session.is_expired(Utc::now()) => {
                warn!(
                    "Stored session for {} has expired, starting unauthenticated",
                    session.identity.id
                );
                inner.commit(AuthState::clear);
            }
            Ok(Some(session)) => {
                let identity_id = session.identity.id.clone();
                inner.commit(|state| {
                    state.identity = Some(session.identity.clone());
                    state.session = Some(session);
                });
                inner.resolve_and_apply(&identity_id).await;
            }
            Ok(None) => inner.commit(AuthState::clear),
            Err(e) => {
                error!("Failed to restore session: {e}");
                inner.commit(AuthState::clear);
            }
        }

        drop(loading);
        LoggingHelper::log_bootstrap_complete(&inner.store.read());
    }

    fn spawn_task_worker(&self) {
        if let Some(rx) = self.inner.tasks.take_receiver() {
            tokio::spawn(run_task_worker(Arc::downgrade(&self.inner), rx));
        }
    }

    fn subscribe_to_provider(&self) {
        let mut slot = self
            .inner
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let handler: AuthEventHandler = Arc::new(move |event: AuthEvent, session: Option<Session>| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_auth_event(event, session);
            }
        });
        *slot = Some(self.inner.provider.on_auth_state_change(handler));
        debug!("Subscribed to identity provider events");
    }
}

async fn run_task_worker(manager: Weak<Inner>, mut rx: mpsc::UnboundedReceiver<AuthTask>) {
    while let Some(task) = rx.recv().await {
        let Some(inner) = manager.upgrade() else {
            break;
        };
        inner.run_task(task).await;
    }
    debug!("Auth task worker stopped");
}

// =============================================================================
// 3. Operations
// =============================================================================

impl SessionManager {
    /// Sign in with email and password
    ///
    /// The profile is not fetched here; the provider's sign-in event schedules
    /// it, so a single sign-in yields a single resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email or password is empty
    /// - Another sign-in or sign-up is outstanding
    /// - The provider rejects the credentials or cannot be reached
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = require_credentials(email, password)?;
        let inner = &self.inner;
        let _attempt = inner.begin_attempt()?;
        let _loading = inner.begin_loading(AuthPhase::Authenticating);

        inner.purge_before_attempt().await;

        match inner.provider.sign_in_with_password(email, password).await {
            Ok(identity) => {
                info!("Signed in as {}", identity.id);
                inner.notifier.success("Signed in successfully");
                Ok(())
            }
            Err(e) => {
                error!("Sign-in failed: {e}");
                inner.commit(AuthState::clear);
                inner.notifier.error(&e.user_message());
                Err(e.into())
            }
        }
    }

    /// Register a new account with profile seed data
    ///
    /// No session is established: the provider requires email verification.
    /// On success a single navigation to the sign-in view is scheduled after
    /// the configured delay.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email or password is empty
    /// - Another sign-in or sign-up is outstanding
    /// - The provider refuses the registration or cannot be reached
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        seed: &ProfileSeed,
    ) -> Result<(), AuthError> {
        let email = require_credentials(email, password)?;
        let inner = &self.inner;
        let _attempt = inner.begin_attempt()?;
        let _loading = inner.begin_loading(AuthPhase::Authenticating);

        inner.purge_before_attempt().await;

        let metadata = seed.to_metadata();
        match inner
            .provider
            .sign_up(email, password, &metadata, &inner.email_redirect_url)
            .await
        {
            Ok(()) => {
                info!("Registered {email} as {}", seed.role);
                inner
                    .notifier
                    .success("Account created. Please check your email to verify your account.");
                inner.schedule_navigation(inner.routes.sign_in.clone(), inner.signup_redirect_delay);
                Ok(())
            }
            Err(e) => {
                error!("Sign-up failed: {e}");
                inner.notifier.error(&e.user_message());
                Err(e.into())
            }
        }
    }

    /// Sign out everywhere and return to the application root
    ///
    /// Local state is cleared whether or not the provider call succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider sign-out fails
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let inner = &self.inner;
        inner.commit(|state| state.phase = AuthPhase::SigningOut);
        inner.sanitizer.purge();

        let result = inner.provider.sign_out(SignOutScope::Global).await;
        inner.commit(AuthState::clear);

        match result {
            Ok(()) => {
                info!("Signed out");
                inner.notifier.success("Signed out successfully");
                inner.navigator.navigate(&inner.routes.root);
                Ok(())
            }
            Err(e) => {
                error!("Provider sign-out failed, local session cleared anyway: {e}");
                inner.notifier.error(&e.user_message());
                Err(e.into())
            }
        }
    }

    /// Partially update the current user's profile
    ///
    /// On success the fields are merged into the in-memory profile without a
    /// re-fetch.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No identity is signed in
    /// - The profile store rejects or fails the update
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<(), AuthError> {
        let inner = &self.inner;
        let identity_id = inner
            .store
            .read()
            .identity
            .map(|identity| identity.id)
            .ok_or_else(|| AuthError::Validation("No authenticated user".to_string()))?;

        if update.is_empty() {
            debug!("Ignoring empty profile update for {identity_id}");
            return Ok(());
        }

        match inner.resolver.update(&identity_id, &update).await {
            Ok(()) => {
                inner.commit(|state| {
                    if let Some(profile) = state
                        .profile
                        .as_mut()
                        .filter(|profile| profile.id == identity_id)
                    {
                        update.apply_to(profile);
                    }
                });
                inner.notifier.success("Profile updated successfully");
                Ok(())
            }
            Err(e) => {
                inner.notifier.error("Failed to update profile");
                Err(e.into())
            }
        }
    }
}

fn require_credentials<'a>(email: &'a str, password: &str) -> Result<&'a str, AuthError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::Validation(
            "Email and password are required".to_string(),
        ));
    }
    Ok(email)
}

// =============================================================================
// 4. Event handling
// =============================================================================

impl Inner {
    /// Provider callback; runs inside the provider's dispatch, so it performs
    /// no I/O and only enqueues follow-up work
    fn handle_auth_event(&self, event: AuthEvent, session: Option<Session>) {
        let identity_id = session.as_ref().map(|s| s.identity.id.clone());
        LoggingHelper::log_auth_event(event, identity_id.as_deref());

        let signed_out = event == AuthEvent::SignedOut || session.is_none();
        self.commit(|state| {
            state.identity = session.as_ref().map(|s| s.identity.clone());
            state.session = session;
            if signed_out {
                state.profile = None;
                state.phase = AuthPhase::Unauthenticated;
            } else {
                if state
                    .profile
                    .as_ref()
                    .is_some_and(|profile| Some(&profile.id) != identity_id.as_ref())
                {
                    state.profile = None;
                }
                state.phase = AuthPhase::Authenticated;
            }
            state.is_loading = false;
        });

        if event == AuthEvent::SignedOut {
            self.sanitizer.purge();
        }
        if let (AuthEvent::SignedIn, Some(identity_id)) = (event, identity_id) {
            self.tasks.enqueue(AuthTask::ResolveProfile { identity_id });
        }
    }

    async fn run_task(&self, task: AuthTask) {
        match task {
            AuthTask::ResolveProfile { identity_id } => {
                self.resolve_deferred(&identity_id).await;
            }
        }
    }

    async fn resolve_deferred(&self, identity_id: &str) {
        if self.profile_fetch_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.profile_fetch_delay).await;
        }

        let state = self.store.read();
        if state.identity.as_ref().map(|i| i.id.as_str()) != Some(identity_id) {
            LoggingHelper::log_stale_profile_discarded(identity_id);
            return;
        }
        if state.profile.as_ref().is_some_and(|p| p.id == identity_id) {
            debug!("Profile for {identity_id} already loaded, skipping resolution");
            return;
        }
        if self.is_resolving(identity_id) {
            debug!("Profile for {identity_id} already being fetched, skipping resolution");
            return;
        }

        self.resolve_and_apply(identity_id).await;
    }

    /// Resolve and store the profile, degrading to `None` on failure
    async fn resolve_and_apply(&self, identity_id: &str) {
        let is_current =
            |state: &AuthState| state.identity.as_ref().is_some_and(|i| i.id == identity_id);
        let _in_flight = self.begin_resolution(identity_id);

        match self.resolver.resolve(identity_id).await {
            Ok(profile) => {
                LoggingHelper::log_profile_resolved(&profile);
                let mut applied = false;
                self.commit(|state| {
                    if is_current(state) {
                        state.profile = Some(profile);
                        state.phase = AuthPhase::Authenticated;
                        applied = true;
                    }
                });
                if !applied {
                    LoggingHelper::log_stale_profile_discarded(identity_id);
                }
            }
            Err(e) => {
                error!("Continuing without a profile for {identity_id}: {e}");
                self.commit(|state| {
                    if is_current(state) {
                        state.profile = None;
                    }
                });
            }
        }
    }
}

// =============================================================================
// 5. State plumbing
// =============================================================================

/// Clears `is_loading` when dropped, on every exit path
struct LoadingGuard<'a> {
    inner: &'a Inner,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.inner.commit(|state| {
            state.is_loading = false;
            if matches!(
                state.phase,
                AuthPhase::Bootstrapping | AuthPhase::Authenticating
            ) {
                state.phase = if state.identity.is_some() {
                    AuthPhase::Authenticated
                } else {
                    AuthPhase::Unauthenticated
                };
            }
        });
    }
}

/// Marks a profile fetch as outstanding until dropped
struct ResolutionGuard<'a> {
    slot: &'a Mutex<Option<String>>,
    identity_id: String,
}

impl Drop for ResolutionGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        // A newer identity may have claimed the slot meanwhile
        if slot.as_deref() == Some(self.identity_id.as_str()) {
            *slot = None;
        }
    }
}

/// Marks a sign-in or sign-up as outstanding until dropped
struct AttemptGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Inner {
    fn begin_loading(&self, phase: AuthPhase) -> LoadingGuard<'_> {
        self.commit(|state| {
            state.is_loading = true;
            state.phase = phase;
        });
        LoadingGuard { inner: self }
    }

    fn begin_resolution(&self, identity_id: &str) -> ResolutionGuard<'_> {
        *self.resolving.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(identity_id.to_string());
        ResolutionGuard {
            slot: &self.resolving,
            identity_id: identity_id.to_string(),
        }
    }

    fn is_resolving(&self, identity_id: &str) -> bool {
        self.resolving
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            == Some(identity_id)
    }

    fn begin_attempt(&self) -> Result<AttemptGuard<'_>, AuthError> {
        self.authenticating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                warn!("Rejecting overlapping authentication request");
                AuthError::AlreadyAuthenticating
            })?;
        Ok(AttemptGuard {
            flag: &self.authenticating,
        })
    }

    /// Sanitize storage, then best-effort revoke any lingering session
    async fn purge_before_attempt(&self) {
        self.sanitizer.purge();
        if let Err(e) = self.provider.sign_out(SignOutScope::Global).await {
            debug!("Ignoring pre-authentication sign-out failure: {e}");
        }
    }

    /// Apply a state mutation and re-check post-login navigation
    fn commit(&self, mutate: impl FnOnce(&mut AuthState)) {
        if self.store.update(mutate) {
            self.navigate_after_login();
        }
    }

    fn navigate_after_login(&self) {
        let state = self.store.read();
        let current = self.navigator.current_path();
        if let Some(target) = self.routes.post_login_target(&state, &current) {
            LoggingHelper::log_post_login_redirect(&current, &target);
            self.navigator.navigate(&target);
        }
    }

    fn schedule_navigation(&self, path: String, delay: Duration) {
        let navigator = Arc::clone(&self.navigator);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate(&path);
        });
    }
}

// =============================================================================
// 6. Tests
// =============================================================================
