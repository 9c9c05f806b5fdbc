//! Identity provider client contract
//!
//! The provider owns credentials and sessions. The core only consumes the
//! operations below and the asynchronous event stream delivered through
//! [`IdentityProvider::on_auth_state_change`].

use crate::models::auth::ProviderError;
use crate::models::{Identity, Session};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Session change notifications emitted by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InitialSession => "INITIAL_SESSION",
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::UserUpdated => "USER_UPDATED",
            Self::PasswordRecovery => "PASSWORD_RECOVERY",
        };
        f.write_str(name)
    }
}

/// Which sessions a sign-out revokes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutScope {
    /// Only this client's session
    Local,
    /// Every session of the user, on every device
    Global,
}

/// Callback invoked synchronously inside the provider's own dispatch
///
/// Implementations must not perform provider or data-store I/O inline.
pub type AuthEventHandler = Arc<dyn Fn(AuthEvent, Option<Session>) + Send + Sync>;

/// Handle returned by a subscription; dropping it unsubscribes
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    #[must_use]
    pub fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Explicitly cancel the subscription
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// External identity provider client
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fetch the currently persisted session, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached
    async fn get_session(&self) -> Result<Option<Session>, ProviderError>;

    /// Authenticate with email and password
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the call fails
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, ProviderError>;

    /// Register a new account; the provider sends a verification email that
    /// links back to `redirect_to`
    ///
    /// # Errors
    ///
    /// Returns an error if registration is refused or the call fails
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &serde_json::Value,
        redirect_to: &str,
    ) -> Result<(), ProviderError>;

    /// Revoke the session(s) described by `scope`
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails
    async fn sign_out(&self, scope: SignOutScope) -> Result<(), ProviderError>;

    /// Register a handler for session change events
    fn on_auth_state_change(&self, handler: AuthEventHandler) -> Subscription;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscription_unsubscribes_once_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let subscription = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(subscription);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_unsubscribe_does_not_double_fire() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(AuthEvent::SignedIn.to_string(), "SIGNED_IN");
        assert_eq!(AuthEvent::SignedOut.to_string(), "SIGNED_OUT");
    }
}
