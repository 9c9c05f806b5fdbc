//! Mock objects and fake implementations for testing
//!
//! This module provides in-memory implementations of the session core's
//! collaborators. Each one records how it was called and can be told to fail.

use crate::models::auth::{ProfileError, ProviderError};
use crate::models::{Identity, Profile, ProfileUpdate, Session};
use crate::notify::Notifier;
use crate::profile::ProfileStore;
use crate::provider::{
    AuthEvent, AuthEventHandler, IdentityProvider, SignOutScope, Subscription,
};
use crate::session::Navigator;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Notify, Semaphore};

use super::constants::{START_PATH, TEST_ACCESS_TOKEN};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A sign-up request as the mock provider received it
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpRequest {
    pub email: String,
    pub metadata: Value,
    pub redirect_to: String,
}

#[derive(Default)]
struct ProviderState {
    accounts: HashMap<String, (String, Identity)>,
    session: Option<Session>,
    sign_ups: Vec<SignUpRequest>,
    get_session_error: Option<ProviderError>,
    sign_up_error: Option<ProviderError>,
    sign_out_error: Option<ProviderError>,
}

type HandlerList = Arc<Mutex<Vec<(u64, AuthEventHandler)>>>;

/// In-memory identity provider
///
/// Like a real provider, it dispatches `SignedIn` from inside
/// `sign_in_with_password` and `SignedOut` from inside `sign_out`, calling
/// handlers synchronously before the call returns.
#[derive(Default)]
pub struct MockIdentityProvider {
    state: Mutex<ProviderState>,
    handlers: HandlerList,
    next_handler_id: AtomicU64,
    sign_in_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
    sign_in_hold: HoldPoint,
}

/// Parks calls on a mock until the returned [`HeldCall`] is released
#[derive(Default)]
struct HoldPoint {
    slot: Arc<Mutex<Option<Arc<Semaphore>>>>,
    parked: Notify,
}

impl HoldPoint {
    fn hold(&self) -> HeldCall {
        let gate = Arc::new(Semaphore::new(0));
        *lock(&self.slot) = Some(Arc::clone(&gate));
        HeldCall {
            gate,
            slot: Arc::clone(&self.slot),
        }
    }

    async fn pass(&self) {
        let gate = lock(&self.slot).clone();
        if let Some(gate) = gate {
            self.parked.notify_one();
            let _permit = gate.acquire().await;
        }
    }

    async fn wait_parked(&self) {
        self.parked.notified().await;
    }
}

/// Keeps a held mock call suspended until released
pub struct HeldCall {
    gate: Arc<Semaphore>,
    slot: Arc<Mutex<Option<Arc<Semaphore>>>>,
}

impl HeldCall {
    /// Let the held call and every later call proceed
    pub fn release(self) {
        lock(&self.slot).take();
        self.gate.add_permits(1);
    }
}

impl MockIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account that signs in with `password`
    pub fn add_account(&self, identity: Identity, password: &str) {
        let email = identity.email.clone().unwrap_or_default();
        lock(&self.state)
            .accounts
            .insert(email, (password.to_string(), identity));
    }

    /// Replace the session `get_session` reports
    pub fn set_session(&self, session: Option<Session>) {
        lock(&self.state).session = session;
    }

    pub fn fail_get_session(&self, error: ProviderError) {
        lock(&self.state).get_session_error = Some(error);
    }

    pub fn fail_sign_up(&self, error: ProviderError) {
        lock(&self.state).sign_up_error = Some(error);
    }

    pub fn fail_sign_out(&self, error: ProviderError) {
        lock(&self.state).sign_out_error = Some(error);
    }

    /// Suspend subsequent sign-in calls until the returned gate is released
    #[must_use]
    pub fn hold_sign_in(&self) -> HeldCall {
        self.sign_in_hold.hold()
    }

    /// Resolves once a sign-in call is parked on the hold gate
    pub async fn wait_for_held_sign_in(&self) {
        self.sign_in_hold.wait_parked().await;
    }

    /// Dispatch an event to every subscriber, as the provider would
    pub fn emit(&self, event: AuthEvent, session: Option<Session>) {
        let handlers: Vec<AuthEventHandler> = lock(&self.handlers)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(event, session.clone());
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.handlers).len()
    }

    #[must_use]
    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn sign_ups(&self) -> Vec<SignUpRequest> {
        lock(&self.state).sign_ups.clone()
    }

    fn issue_session(identity: Identity) -> Session {
        Session {
            identity,
            access_token: TEST_ACCESS_TOKEN.to_string(),
            refresh_token: Some("test_refresh_token".to_string()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn get_session(&self) -> Result<Option<Session>, ProviderError> {
        let state = lock(&self.state);
        match &state.get_session_error {
            Some(error) => Err(error.clone()),
            None => Ok(state.session.clone()),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, ProviderError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);

        self.sign_in_hold.pass().await;

        let session = {
            let mut state = lock(&self.state);
            let identity = match state.accounts.get(email) {
                Some((expected, identity)) if expected == password => identity.clone(),
                _ => return Err(ProviderError::InvalidCredentials),
            };
            let session = Self::issue_session(identity);
            state.session = Some(session.clone());
            session
        };

        let identity = session.identity.clone();
        self.emit(AuthEvent::SignedIn, Some(session));
        Ok(identity)
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        metadata: &Value,
        redirect_to: &str,
    ) -> Result<(), ProviderError> {
        let mut state = lock(&self.state);
        state.sign_ups.push(SignUpRequest {
            email: email.to_string(),
            metadata: metadata.clone(),
            redirect_to: redirect_to.to_string(),
        });
        state.sign_up_error.clone().map_or(Ok(()), Err)
    }

    async fn sign_out(&self, _scope: SignOutScope) -> Result<(), ProviderError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);

        let had_session = {
            let mut state = lock(&self.state);
            if let Some(error) = &state.sign_out_error {
                return Err(error.clone());
            }
            state.session.take().is_some()
        };

        if had_session {
            self.emit(AuthEvent::SignedOut, None);
        }
        Ok(())
    }

    fn on_auth_state_change(&self, handler: AuthEventHandler) -> Subscription {
        let id = self.next_handler_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.handlers).push((id, handler));

        let handlers = Arc::clone(&self.handlers);
        Subscription::new(move || {
            lock(&handlers).retain(|(handler_id, _)| *handler_id != id);
        })
    }
}

/// In-memory profile table
#[derive(Default)]
pub struct MockProfileStore {
    profiles: Mutex<HashMap<String, Profile>>,
    fetch_error: Mutex<Option<ProfileError>>,
    update_error: Mutex<Option<ProfileError>>,
    fetches: AtomicUsize,
    updates: AtomicUsize,
    fetch_hold: HoldPoint,
}

impl MockProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: Profile) {
        lock(&self.profiles).insert(profile.id.clone(), profile);
    }

    pub fn fail_fetch(&self, error: ProfileError) {
        *lock(&self.fetch_error) = Some(error);
    }

    pub fn fail_update(&self, error: ProfileError) {
        *lock(&self.update_error) = Some(error);
    }

    /// Suspend subsequent fetches until the returned gate is released
    #[must_use]
    pub fn hold_fetch(&self) -> HeldCall {
        self.fetch_hold.hold()
    }

    /// Resolves once a fetch is parked on the hold gate
    pub async fn wait_for_held_fetch(&self) {
        self.fetch_hold.wait_parked().await;
    }

    #[must_use]
    pub fn get(&self, identity_id: &str) -> Option<Profile> {
        lock(&self.profiles).get(identity_id).cloned()
    }

    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for MockProfileStore {
    async fn fetch_profile(&self, identity_id: &str) -> Result<Profile, ProfileError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.fetch_hold.pass().await;
        if let Some(error) = lock(&self.fetch_error).clone() {
            return Err(error);
        }
        self.get(identity_id)
            .ok_or_else(|| ProfileError::NotFound(identity_id.to_string()))
    }

    async fn update_profile(
        &self,
        identity_id: &str,
        update: &ProfileUpdate,
    ) -> Result<(), ProfileError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = lock(&self.update_error).clone() {
            return Err(error);
        }
        let mut profiles = lock(&self.profiles);
        let profile = profiles
            .get_mut(identity_id)
            .ok_or_else(|| ProfileError::NotFound(identity_id.to_string()))?;
        update.apply_to(profile);
        Ok(())
    }
}

/// Navigator that records every navigation
pub struct RecordingNavigator {
    current: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Mutex::new(START_PATH.to_string()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Move to `path` as if the user had, without recording it
    pub fn set_current(&self, path: &str) {
        *lock(&self.current) = path.to_string();
    }

    /// Paths navigated to by the session core, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        lock(&self.history).clone()
    }
}

impl Default for RecordingNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        lock(&self.current).clone()
    }

    fn navigate(&self, path: &str) {
        *lock(&self.current) = path.to_string();
        lock(&self.history).push(path.to_string());
    }
}

/// Notifier that keeps every message
#[derive(Default)]
pub struct RecordingNotifier {
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn successes(&self) -> Vec<String> {
        lock(&self.successes).clone()
    }

    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        lock(&self.errors).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        lock(&self.successes).push(message.to_string());
    }

    fn error(&self, message: &str) {
        lock(&self.errors).push(message.to_string());
    }
}
