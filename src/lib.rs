#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the caregate library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod authentication;
pub mod guard;
pub mod models;
pub mod notify;
pub mod profile;
pub mod provider;
pub mod session;
pub mod settings;
pub mod storage;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use authentication::{AuthenticationServiceFactory, ServiceConfigBuilder};
pub use guard::{GuardDecision, GuardedRoute, RouteGuard};
pub use models::auth::AuthError;
pub use models::{AuthPhase, AuthState, Profile, Role};
pub use session::SessionManager;
pub use settings::CaregateSettings;
