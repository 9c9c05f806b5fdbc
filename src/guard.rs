//! Route Guard - role-based access decisions for protected views
//!
//! [`RouteGuard::evaluate`] is a pure function of [`AuthState`]. While a
//! bootstrap or explicit sign-in is in flight it always answers
//! [`GuardDecision::Loading`], so a protected view never redirects on a
//! half-restored session.
//!
//! [`GuardedRoute`] pairs a guard with a state receiver and re-evaluates on
//! every change.

use crate::models::auth::AuthError;
use crate::models::{AuthState, Role};
use crate::session::{AuthStateReceiver, RouteTable};
use crate::utils::redirect_validator::validate_redirect_path;

/// Outcome of guarding a protected view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Auth is still settling; render a placeholder
    Loading,
    /// Leave the protected view for `to`
    Redirect { to: String },
    /// Render the protected view
    Render,
}

/// Access rule for one protected view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    allowed_roles: Option<Vec<Role>>,
    redirect_to: String,
    forbidden: String,
}

impl RouteGuard {
    /// Guard admitting any signed-in user with a resolved profile
    #[must_use]
    pub fn new(routes: &RouteTable) -> Self {
        Self {
            allowed_roles: None,
            redirect_to: routes.sign_in.clone(),
            forbidden: routes.forbidden.clone(),
        }
    }

    /// Restrict the view to `roles`
    ///
    /// `Role::Unrecognized` is never admitted, even if listed.
    #[must_use]
    pub fn with_allowed_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.allowed_roles = Some(
            roles
                .into_iter()
                .filter(|role| *role != Role::Unrecognized)
                .collect(),
        );
        self
    }

    /// Send unauthenticated users somewhere other than the sign-in view
    ///
    /// # Errors
    ///
    /// Returns a validation error unless `path` is a safe same-site path
    pub fn with_redirect_to(mut self, path: &str) -> Result<Self, AuthError> {
        self.redirect_to = validate_redirect_path(path)?;
        Ok(self)
    }

    #[must_use]
    pub fn evaluate(&self, state: &AuthState) -> GuardDecision {
        if state.is_loading {
            return GuardDecision::Loading;
        }

        let Some(profile) = state.profile.as_ref().filter(|_| state.identity.is_some()) else {
            return GuardDecision::Redirect {
                to: self.redirect_to.clone(),
            };
        };

        match &self.allowed_roles {
            Some(roles) if !roles.contains(&profile.role) => {
                log::debug!(
                    "Role '{}' not permitted here, redirecting to {}",
                    profile.role,
                    self.forbidden
                );
                GuardDecision::Redirect {
                    to: self.forbidden.clone(),
                }
            }
            _ => GuardDecision::Render,
        }
    }

    /// Bind this guard to a live state stream
    #[must_use]
    pub fn watch(self, receiver: AuthStateReceiver) -> GuardedRoute {
        GuardedRoute {
            guard: self,
            receiver,
        }
    }
}

/// A guard that re-evaluates whenever the auth state changes
pub struct GuardedRoute {
    guard: RouteGuard,
    receiver: AuthStateReceiver,
}

impl GuardedRoute {
    /// Decision for the latest state
    #[must_use]
    pub fn current(&self) -> GuardDecision {
        self.guard.evaluate(&self.receiver.borrow())
    }

    /// Wait for the next state change and return the new decision
    ///
    /// Returns `None` once the session manager has been dropped.
    pub async fn changed(&mut self) -> Option<GuardDecision> {
        self.receiver.changed().await.ok()?;
        Some(self.guard.evaluate(&self.receiver.borrow_and_update()))
    }
}
