//! Test fixtures providing pre-built test objects
//!
//! This module provides commonly used test data and a [`TestHarness`] that
//! wires every mock collaborator into a [`SessionManager`].

use crate::authentication::{AuthenticationConfig, ServiceConfigBuilder};
use crate::models::{Identity, Profile, ProfileSeed, Role, Session};
use crate::session::SessionManager;
use crate::storage::{MemoryStorage, StorageArea};
use chrono::{Duration, Utc};
use std::sync::Arc;

use super::constants::{TEST_ACCESS_TOKEN, TEST_PASSWORD, TEST_USER_NAME};
use super::mock::{MockIdentityProvider, MockProfileStore, RecordingNavigator, RecordingNotifier};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Password accepted for every account seeded through the harness
    pub const PASSWORD: &'static str = TEST_PASSWORD;

    #[must_use]
    pub fn identity(id: &str, email: &str) -> Identity {
        Identity::new(id, email)
    }

    /// Live session valid for one more hour
    #[must_use]
    pub fn session(id: &str, email: &str) -> Session {
        Session {
            identity: Self::identity(id, email),
            access_token: TEST_ACCESS_TOKEN.to_string(),
            refresh_token: Some("test_refresh_token".to_string()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        }
    }

    #[must_use]
    pub fn profile(id: &str, email: &str, role: Role) -> Profile {
        Profile {
            id: id.to_string(),
            email: email.to_string(),
            full_name: TEST_USER_NAME.to_string(),
            phone: None,
            role,
            avatar_url: None,
            is_active: true,
        }
    }

    #[must_use]
    pub fn seed(role: Role) -> ProfileSeed {
        ProfileSeed {
            full_name: TEST_USER_NAME.to_string(),
            phone: Some("+1 555 0100".to_string()),
            role,
        }
    }
}

/// A session manager wired to recording mocks
pub struct TestHarness {
    pub manager: SessionManager,
    pub provider: Arc<MockIdentityProvider>,
    pub profiles: Arc<MockProfileStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub notifier: Arc<RecordingNotifier>,
    pub durable: Arc<MemoryStorage>,
    pub session_storage: Arc<MemoryStorage>,
}

impl TestHarness {
    #[must_use]
    pub fn new() -> Self {
        Self::with_provider(Arc::new(MockIdentityProvider::new()))
    }

    #[must_use]
    pub fn with_provider(provider: Arc<MockIdentityProvider>) -> Self {
        Self::build(provider, AuthenticationConfig::default())
    }

    #[must_use]
    pub fn with_config(config: AuthenticationConfig) -> Self {
        Self::build(Arc::new(MockIdentityProvider::new()), config)
    }

    /// # Panics
    ///
    /// Panics if `config` is rejected by the session manager
    #[must_use]
    pub fn build(provider: Arc<MockIdentityProvider>, config: AuthenticationConfig) -> Self {
        let profiles = Arc::new(MockProfileStore::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let durable = MemoryStorage::shared(StorageArea::Durable);
        let session_storage = MemoryStorage::shared(StorageArea::SessionScoped);

        let services = ServiceConfigBuilder::new()
            .with_identity_provider(provider.clone())
            .with_profile_store(profiles.clone())
            .with_navigator(navigator.clone())
            .with_notifier(notifier.clone())
            .with_storage_area(durable.clone())
            .with_storage_area(session_storage.clone())
            .build()
            .expect("all collaborators configured");
        let manager = SessionManager::new(services, config).expect("valid test configuration");

        Self {
            manager,
            provider,
            profiles,
            navigator,
            notifier,
            durable,
            session_storage,
        }
    }

    /// Register a sign-in account and its profile row
    pub fn seed_account(&self, id: &str, email: &str, role: Role) {
        self.provider
            .add_account(TestFixtures::identity(id, email), TestFixtures::PASSWORD);
        self.profiles.insert(TestFixtures::profile(id, email, role));
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
