//! Service factory for creating a configured session manager
//!
//! This module turns [`CaregateSettings`] into an [`AuthenticationConfig`]
//! and assembles a [`SessionManager`] from it plus injected collaborators.

use super::dependency_injection::SessionServices;
use crate::models::auth::AuthError;
use crate::session::{RouteTable, SessionManager};
use crate::settings::CaregateSettings;
use std::time::Duration;

/// Configuration the session manager runs with
#[derive(Debug, Clone)]
pub struct AuthenticationConfig {
    pub routes: RouteTable,
    pub storage_key_pattern: String,
    pub email_redirect_url: String,
    pub signup_redirect_delay: Duration,
    pub profile_fetch_delay: Duration,
}

impl AuthenticationConfig {
    /// Create authentication configuration from settings
    #[must_use]
    pub fn from_settings(settings: &CaregateSettings) -> Self {
        Self {
            routes: RouteTable::from_settings(&settings.routes),
            storage_key_pattern: settings.auth.storage_key_pattern.clone(),
            email_redirect_url: settings.auth.email_redirect_url.clone(),
            signup_redirect_delay: Duration::from_millis(settings.auth.signup_redirect_delay_ms),
            profile_fetch_delay: Duration::from_millis(settings.auth.profile_fetch_delay_ms),
        }
    }
}

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self::from_settings(&CaregateSettings::default())
    }
}

/// Factory for creating the session manager with dependency injection
pub struct AuthenticationServiceFactory;

impl AuthenticationServiceFactory {
    /// Create a fully configured `SessionManager`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the storage key pattern or the email
    /// redirect URL in `settings` is invalid
    pub fn create_session_manager(
        settings: &CaregateSettings,
        services: SessionServices,
    ) -> Result<SessionManager, AuthError> {
        log::info!("🏭 Starting authentication service factory...");

        let config = AuthenticationConfig::from_settings(settings);
        let session_manager = SessionManager::new(services, config)?;

        log::info!(
            "✅ Session manager configured (sign-in: {}, forbidden: {})",
            settings.routes.sign_in,
            settings.routes.forbidden
        );
        Ok(session_manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_config_from_settings() {
        let mut settings = CaregateSettings::default();
        settings.auth.signup_redirect_delay_ms = 1500;
        settings.routes.forbidden = "/403".to_string();

        let config = AuthenticationConfig::from_settings(&settings);

        assert_eq!(config.signup_redirect_delay, Duration::from_millis(1500));
        assert_eq!(config.profile_fetch_delay, Duration::ZERO);
        assert_eq!(config.routes.forbidden, "/403");
    }
}
