//! Service wiring for the session core
//!
//! This module provides the factory that builds a configured
//! [`SessionManager`](crate::session::SessionManager) and the builder used to
//! inject its collaborators.

pub mod dependency_injection;
pub mod factory;

pub use dependency_injection::{ServiceConfigBuilder, SessionServices};
pub use factory::{AuthenticationConfig, AuthenticationServiceFactory};
