//! Dependency injection for the session core's collaborators
//!
//! Every external capability (identity provider, profile store, navigator,
//! notifier, storage areas) is handed in explicitly rather than reached
//! through globals.

use crate::models::auth::AuthError;
use crate::notify::{LogNotifier, Notifier};
use crate::profile::ProfileStore;
use crate::provider::IdentityProvider;
use crate::session::Navigator;
use crate::storage::KeyValueStorage;
use std::sync::Arc;

/// Collaborators a session manager is built from
#[derive(Clone)]
pub struct SessionServices {
    pub provider: Arc<dyn IdentityProvider>,
    pub profile_store: Arc<dyn ProfileStore>,
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
    pub storage_areas: Vec<Arc<dyn KeyValueStorage>>,
}

/// Builder for [`SessionServices`]
#[derive(Clone, Default)]
pub struct ServiceConfigBuilder {
    provider: Option<Arc<dyn IdentityProvider>>,
    profile_store: Option<Arc<dyn ProfileStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    notifier: Option<Arc<dyn Notifier>>,
    storage_areas: Vec<Arc<dyn KeyValueStorage>>,
}

impl ServiceConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn with_profile_store(mut self, store: Arc<dyn ProfileStore>) -> Self {
        self.profile_store = Some(store);
        self
    }

    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Use a custom notifier instead of the logging default
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Add a storage area the sanitizer must sweep
    #[must_use]
    pub fn with_storage_area(mut self, area: Arc<dyn KeyValueStorage>) -> Self {
        self.storage_areas.push(area);
        self
    }

    /// Finish the configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first missing collaborator
    pub fn build(self) -> Result<SessionServices, AuthError> {
        let provider = self
            .provider
            .ok_or_else(|| missing("identity provider"))?;
        let profile_store = self.profile_store.ok_or_else(|| missing("profile store"))?;
        let navigator = self.navigator.ok_or_else(|| missing("navigator"))?;

        if self.storage_areas.is_empty() {
            log::warn!("⚠️  No storage areas configured; sign-in will not purge stale artifacts");
        }

        Ok(SessionServices {
            provider,
            profile_store,
            navigator,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
            storage_areas: self.storage_areas,
        })
    }
}

fn missing(what: &str) -> AuthError {
    AuthError::Configuration(format!("No {what} configured"))
}
