// End-to-end session flows driven through the public API
use caregate::authentication::{AuthenticationConfig, AuthenticationServiceFactory, ServiceConfigBuilder};
use caregate::models::{AuthPhase, AuthState, Role};
use caregate::provider::AuthEvent;
use caregate::session::Navigator;
use caregate::settings::CaregateSettings;
use caregate::storage::{KeyValueStorage, MemoryStorage, StorageArea};
use caregate::testing::{
    MockIdentityProvider, MockProfileStore, RecordingNavigator, TestFixtures, TestHarness,
};
use caregate::{GuardDecision, SessionManager};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

async fn settle(manager: &SessionManager, done: impl FnMut(&AuthState) -> bool) -> AuthState {
    let mut rx = manager.subscribe();
    let state = timeout(Duration::from_secs(2), rx.wait_for(done))
        .await
        .expect("state should settle")
        .expect("session manager alive")
        .clone();
    state
}

#[tokio::test]
async fn test_admin_bootstrap_lands_on_admin_dashboard() {
    // Restored admin session while sitting on the sign-in view
    let provider = Arc::new(MockIdentityProvider::new());
    let profiles = Arc::new(MockProfileStore::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let storage = MemoryStorage::shared(StorageArea::Durable);

    provider.set_session(Some(TestFixtures::session("admin-1", "admin@example.com")));
    profiles.insert(TestFixtures::profile("admin-1", "admin@example.com", Role::Admin));
    navigator.set_current("/login");

    let services = ServiceConfigBuilder::new()
        .with_identity_provider(provider.clone())
        .with_profile_store(profiles.clone())
        .with_navigator(navigator.clone())
        .with_storage_area(storage)
        .build()
        .expect("Should build services");
    let manager =
        AuthenticationServiceFactory::create_session_manager(&CaregateSettings::default(), services)
            .expect("Should create session manager");

    manager.start().await;

    let state = manager.state();
    assert!(!state.is_loading);
    assert_eq!(state.phase, AuthPhase::Authenticated);
    assert_eq!(state.role(), Some(Role::Admin));
    assert_eq!(navigator.current_path(), "/admin/dashboard");
    assert_eq!(navigator.history().len(), 1, "navigation must happen exactly once");

    let admin_view = manager.route_guard().with_allowed_roles([Role::Admin]);
    assert_eq!(admin_view.evaluate(&state), GuardDecision::Render);
}

#[tokio::test]
async fn test_patient_lifecycle_sign_in_to_sign_out() {
    let harness = TestHarness::new();
    harness.seed_account("pat-1", "pat@example.com", Role::Patient);
    harness.manager.start().await;
    harness.navigator.set_current("/login");

    let doctor_view = harness
        .manager
        .route_guard()
        .with_allowed_roles([Role::Doctor]);
    let patient_view = harness
        .manager
        .route_guard()
        .with_allowed_roles([Role::Patient]);

    harness
        .manager
        .sign_in("pat@example.com", TestFixtures::PASSWORD)
        .await
        .expect("Should sign in");
    let state = settle(&harness.manager, |s| s.profile.is_some()).await;

    assert_eq!(harness.navigator.current_path(), "/patient/dashboard");
    assert_eq!(patient_view.evaluate(&state), GuardDecision::Render);
    assert_eq!(
        doctor_view.evaluate(&state),
        GuardDecision::Redirect {
            to: "/unauthorized".to_string()
        }
    );

    harness.manager.sign_out().await.expect("Should sign out");

    let state = harness.manager.state();
    assert_eq!(state.phase, AuthPhase::Unauthenticated);
    assert_eq!(harness.navigator.current_path(), "/");
    assert_eq!(
        patient_view.evaluate(&state),
        GuardDecision::Redirect {
            to: "/login".to_string()
        }
    );
}

#[tokio::test]
async fn test_unrecognized_role_lands_on_root() {
    let harness = TestHarness::new();
    harness.seed_account("odd-1", "odd@example.com", Role::Unrecognized);
    harness.manager.start().await;
    harness.navigator.set_current("/signup");

    harness
        .manager
        .sign_in("odd@example.com", TestFixtures::PASSWORD)
        .await
        .expect("Should sign in");
    settle(&harness.manager, |s| s.profile.is_some()).await;

    assert_eq!(harness.navigator.history(), vec!["/".to_string()]);
}

#[tokio::test]
async fn test_no_navigation_away_from_regular_views() {
    let harness = TestHarness::new();
    harness.seed_account("doc-1", "doc@example.com", Role::Doctor);
    harness.manager.start().await;
    harness.navigator.set_current("/doctor/appointments");

    harness
        .manager
        .sign_in("doc@example.com", TestFixtures::PASSWORD)
        .await
        .expect("Should sign in");
    settle(&harness.manager, |s| s.profile.is_some()).await;

    assert!(harness.navigator.history().is_empty());
    assert_eq!(harness.navigator.current_path(), "/doctor/appointments");
}

#[tokio::test(start_paused = true)]
async fn test_sign_out_before_deferred_fetch_skips_it() {
    let config = AuthenticationConfig {
        profile_fetch_delay: Duration::from_millis(100),
        ..AuthenticationConfig::default()
    };
    let harness = TestHarness::with_config(config);
    harness.seed_account("pat-1", "pat@example.com", Role::Patient);
    harness.manager.start().await;

    harness
        .manager
        .sign_in("pat@example.com", TestFixtures::PASSWORD)
        .await
        .expect("Should sign in");
    // Session ends before the deferred resolution runs
    harness.provider.emit(AuthEvent::SignedOut, None);

    tokio::time::sleep(Duration::from_millis(500)).await;

    let state = harness.manager.state();
    assert!(state.identity.is_none());
    assert!(state.profile.is_none());
    assert_eq!(harness.profiles.fetch_count(), 0);
}

#[tokio::test]
async fn test_late_profile_for_previous_identity_is_discarded() {
    let harness = TestHarness::new();
    harness.seed_account("pat-1", "pat@example.com", Role::Patient);
    harness.seed_account("hos-1", "hos@example.com", Role::Hospital);
    harness.manager.start().await;
    let fetch = harness.profiles.hold_fetch();

    harness
        .manager
        .sign_in("pat@example.com", TestFixtures::PASSWORD)
        .await
        .expect("Should sign in");
    harness.profiles.wait_for_held_fetch().await;

    // Another account takes over while the first fetch is still outstanding
    harness.provider.emit(
        AuthEvent::SignedIn,
        Some(TestFixtures::session("hos-1", "hos@example.com")),
    );
    fetch.release();

    let state = settle(&harness.manager, |s| s.profile.is_some()).await;
    let profile = state.profile.expect("profile resolved");
    assert_eq!(profile.id, "hos-1");
    assert_eq!(profile.role, Role::Hospital);
    assert_eq!(harness.profiles.fetch_count(), 2);
}

#[tokio::test]
async fn test_identity_switch_drops_previous_profile() {
    let harness = TestHarness::new();
    harness.seed_account("pat-1", "pat@example.com", Role::Patient);
    harness.seed_account("hos-1", "hos@example.com", Role::Hospital);
    harness
        .provider
        .set_session(Some(TestFixtures::session("pat-1", "pat@example.com")));
    harness.manager.start().await;
    assert_eq!(harness.manager.state().role(), Some(Role::Patient));

    harness.provider.emit(
        AuthEvent::SignedIn,
        Some(TestFixtures::session("hos-1", "hos@example.com")),
    );

    let state = harness.manager.state();
    assert_eq!(state.identity.map(|i| i.id), Some("hos-1".to_string()));
    assert!(state.profile.is_none(), "previous user's profile must not leak");

    let state = settle(&harness.manager, |s| s.profile.is_some()).await;
    assert_eq!(state.role(), Some(Role::Hospital));
}

#[tokio::test]
async fn test_token_refresh_keeps_profile() {
    let harness = TestHarness::new();
    harness.seed_account("doc-1", "doc@example.com", Role::Doctor);
    harness
        .provider
        .set_session(Some(TestFixtures::session("doc-1", "doc@example.com")));
    harness.manager.start().await;

    let mut refreshed = TestFixtures::session("doc-1", "doc@example.com");
    refreshed.access_token = "rotated".to_string();
    harness
        .provider
        .emit(AuthEvent::TokenRefreshed, Some(refreshed));

    let state = harness.manager.state();
    assert_eq!(state.role(), Some(Role::Doctor));
    assert_eq!(
        state.session.map(|s| s.access_token),
        Some("rotated".to_string())
    );
    assert_eq!(harness.profiles.fetch_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_sign_up_redirect_uses_configured_delay() {
    let mut settings = CaregateSettings::default();
    settings.auth.signup_redirect_delay_ms = 500;
    let harness = TestHarness::with_config(AuthenticationConfig::from_settings(&settings));
    harness.durable.set("sb-xyz-auth-token", "left over");
    harness.manager.start().await;

    harness
        .manager
        .sign_up(
            "new@example.com",
            "hunter22",
            &TestFixtures::seed(Role::Hospital),
        )
        .await
        .expect("Should sign up");

    assert!(harness.durable.is_empty());
    assert!(!harness.manager.state().is_authenticated());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(harness.navigator.history().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(harness.navigator.history(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn test_invalid_email_redirect_is_rejected_at_construction() {
    let mut settings = CaregateSettings::default();
    settings.auth.email_redirect_url = "javascript:alert(1)".to_string();

    let services = ServiceConfigBuilder::new()
        .with_identity_provider(Arc::new(MockIdentityProvider::new()))
        .with_profile_store(Arc::new(MockProfileStore::new()))
        .with_navigator(Arc::new(RecordingNavigator::new()))
        .build()
        .expect("Should build services");

    let result = AuthenticationServiceFactory::create_session_manager(&settings, services);
    assert!(matches!(
        result,
        Err(caregate::AuthError::Configuration(_))
    ));
}
