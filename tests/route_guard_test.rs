// Route guard behaviour against a live session manager
use caregate::models::{AuthState, Role};
use caregate::testing::{TestFixtures, TestHarness};
use caregate::GuardDecision;

#[tokio::test]
async fn test_guard_shows_loading_before_bootstrap() {
    let harness = TestHarness::new();
    let guard = harness
        .manager
        .route_guard()
        .with_allowed_roles([Role::Admin]);

    // Nothing restored yet and no identity, still no redirect
    let state = harness.manager.state();
    assert!(state.identity.is_none());
    assert_eq!(guard.evaluate(&state), GuardDecision::Loading);

    harness.manager.start().await;
    assert_eq!(
        guard.evaluate(&harness.manager.state()),
        GuardDecision::Redirect {
            to: "/login".to_string()
        }
    );
}

#[tokio::test]
async fn test_guarded_route_tracks_sign_in_and_out() {
    let harness = TestHarness::new();
    harness.seed_account("doc-1", "doc@example.com", Role::Doctor);
    harness.manager.start().await;

    let mut route = harness
        .manager
        .route_guard()
        .with_allowed_roles([Role::Doctor])
        .watch(harness.manager.subscribe());
    assert!(matches!(route.current(), GuardDecision::Redirect { .. }));

    harness
        .manager
        .sign_in("doc@example.com", TestFixtures::PASSWORD)
        .await
        .expect("Should sign in");

    let mut decision = route.current();
    while decision != GuardDecision::Render {
        decision = route.changed().await.expect("session manager alive");
    }

    harness.manager.sign_out().await.expect("Should sign out");
    assert_eq!(
        route.current(),
        GuardDecision::Redirect {
            to: "/login".to_string()
        }
    );
}

#[tokio::test]
async fn test_patient_forbidden_from_doctor_view() {
    let harness = TestHarness::new();
    harness.seed_account("pat-1", "pat@example.com", Role::Patient);
    harness
        .provider
        .set_session(Some(TestFixtures::session("pat-1", "pat@example.com")));
    harness.manager.start().await;

    let doctor_view = harness
        .manager
        .route_guard()
        .with_allowed_roles([Role::Doctor, Role::Admin]);

    assert_eq!(
        doctor_view.evaluate(&harness.manager.state()),
        GuardDecision::Redirect {
            to: "/unauthorized".to_string()
        }
    );
}

#[tokio::test]
async fn test_missing_profile_treated_as_unauthenticated() {
    let harness = TestHarness::new();
    // Identity without a profile row
    harness
        .provider
        .set_session(Some(TestFixtures::session("ghost-1", "ghost@example.com")));
    harness.manager.start().await;

    let state: AuthState = harness.manager.state();
    assert!(state.identity.is_some());
    assert!(state.profile.is_none());

    let guard = harness
        .manager
        .route_guard()
        .with_redirect_to("/welcome")
        .expect("Should accept relative redirect");
    assert_eq!(
        guard.evaluate(&state),
        GuardDecision::Redirect {
            to: "/welcome".to_string()
        }
    );
}
