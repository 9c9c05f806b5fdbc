// Centralized logging for session lifecycle events
use crate::models::{AuthState, Profile};
use crate::provider::AuthEvent;
use log::{debug, info, warn};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log a provider event as it is received
    pub fn log_auth_event(event: AuthEvent, identity_id: Option<&str>) {
        info!(
            "🔔 Auth event {event} (identity: {})",
            identity_id.unwrap_or("none")
        );
    }

    /// Log the outcome of session bootstrap
    pub fn log_bootstrap_complete(state: &AuthState) {
        match (&state.identity, &state.profile) {
            (Some(identity), Some(profile)) => info!(
                "✅ Restored session for {} with role {}",
                identity.id, profile.role
            ),
            (Some(identity), None) => warn!(
                "⚠️  Restored session for {} without a profile (degraded)",
                identity.id
            ),
            (None, _) => info!("ℹ No existing session, starting unauthenticated"),
        }
    }

    /// Log a resolved profile
    pub fn log_profile_resolved(profile: &Profile) {
        info!(
            "👤 Profile resolved for {} (role: {}, active: {})",
            profile.id, profile.role, profile.is_active
        );
    }

    /// Log a resolution result that arrived for an identity no longer current
    pub fn log_stale_profile_discarded(identity_id: &str) {
        debug!("Discarding profile for {identity_id}: identity changed while resolving");
    }

    /// Log post-login navigation
    pub fn log_post_login_redirect(from: &str, to: &str) {
        info!("🧭 Post-login redirect {from} -> {to}");
    }

    /// Log a phase transition in the session state machine
    pub fn log_phase_change(before: &AuthState, after: &AuthState) {
        if before.phase != after.phase {
            debug!("Auth phase {:?} -> {:?}", before.phase, after.phase);
        }
    }
}
