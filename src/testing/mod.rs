//! Unified testing utilities for caregate
//!
//! In-memory stand-ins for every external collaborator plus a harness that
//! wires them into a running [`SessionManager`](crate::session::SessionManager).
//! Available to unit tests and, with the `testing` feature, to integration
//! tests.
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built test data and the `TestHarness`
//! - [`mock`] - Mock provider, profile store, navigator and notifier
//!
//! ## Usage
//!
//! ```rust,ignore
//! use caregate::testing::fixtures::{TestFixtures, TestHarness};
//! use caregate::models::Role;
//!
//! async fn doctor_signs_in() {
//!     let harness = TestHarness::new();
//!     harness.seed_account("doc-1", "doc@example.com", Role::Doctor);
//!     harness.manager.start().await;
//!     harness.manager.sign_in("doc@example.com", TestFixtures::PASSWORD).await.unwrap();
//! }
//! ```

pub mod fixtures;
pub mod mock;

// Re-export commonly used items for convenience
pub use fixtures::{TestFixtures, TestHarness};
pub use mock::{
    HeldCall, MockIdentityProvider, MockProfileStore, RecordingNavigator, RecordingNotifier,
    SignUpRequest,
};

/// Common test constants
pub mod constants {
    /// Default test user name
    pub const TEST_USER_NAME: &str = "Test User";

    /// Password every seeded account accepts
    pub const TEST_PASSWORD: &str = "correct-horse-battery";

    /// Access token issued by the mock provider
    pub const TEST_ACCESS_TOKEN: &str = "test_access_token";

    /// Path the recording navigator starts on
    pub const START_PATH: &str = "/";
}
