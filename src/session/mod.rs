//! Session Management Module
//!
//! This module owns the process-wide authentication state and everything that
//! mutates it.
//!
//! # Modules
//!
//! - [`manager`] - Core session manager driving sign-in, sign-up and sign-out
//! - [`state`] - Observable `AuthState` container
//! - [`navigation`] - Route table and post-login redirect rules
//! - `tasks` - Deferred work queued from provider callbacks

pub mod manager;
pub mod navigation;
pub mod state;
mod tasks;

// Re-export commonly used items for convenience
pub use manager::SessionManager;
pub use navigation::{normalize_path, Navigator, RouteTable};
pub use state::{AuthStateReceiver, AuthStore};
