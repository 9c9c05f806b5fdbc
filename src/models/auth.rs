//! Common authentication error types
//!
//! This module unifies the failures that can surface from the identity
//! provider, the profile store and the session manager's own preconditions.

use thiserror::Error;

/// Errors reported by the identity provider client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Email/password pair rejected
    #[error("Invalid login credentials")]
    InvalidCredentials,
    /// Account exists but the verification link has not been followed
    #[error("Email address not confirmed")]
    EmailNotConfirmed,
    /// Network or transport failure talking to the provider
    #[error("Identity provider unreachable: {0}")]
    Transport(String),
    /// Any other provider-side refusal
    #[error("Identity provider rejected the request: {0}")]
    Rejected(String),
}

impl ProviderError {
    /// Message suitable for showing to the end user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid email or password".to_string(),
            Self::EmailNotConfirmed => {
                "Please confirm your email address before signing in".to_string()
            }
            Self::Transport(_) => "Unable to reach the authentication service".to_string(),
            Self::Rejected(msg) => msg.clone(),
        }
    }
}

/// Errors reported by the profile store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("No profile found for identity {0}")]
    NotFound(String),
    #[error("Profile store transport error: {0}")]
    Transport(String),
}

/// Error type for every session manager operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// A precondition failed; state is unchanged
    #[error("Validation failed: {0}")]
    Validation(String),
    /// The identity provider refused or failed the request
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The profile store failed to read or write the profile
    #[error(transparent)]
    Resolution(#[from] ProfileError),
    /// A sign-in or sign-up is already outstanding
    #[error("An authentication request is already in progress")]
    AlreadyAuthenticating,
    /// Settings could not be turned into a working configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Message suitable for showing to the end user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Provider(err) => err.user_message(),
            Self::Resolution(_) => "Unable to load your profile".to_string(),
            Self::AlreadyAuthenticating => "Please wait, a request is in progress".to_string(),
            Self::Configuration(_) => "Authentication is misconfigured".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_converts_into_auth_error() {
        let err: AuthError = ProviderError::InvalidCredentials.into();
        assert!(matches!(err, AuthError::Provider(ProviderError::InvalidCredentials)));
        assert_eq!(err.to_string(), "Invalid login credentials");
        assert_eq!(err.user_message(), "Invalid email or password");
    }

    #[test]
    fn test_profile_error_converts_into_resolution() {
        let err: AuthError = ProfileError::Transport("timeout".to_string()).into();
        assert!(matches!(err, AuthError::Resolution(_)));
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_transport_message_hides_details_from_user() {
        let err = ProviderError::Transport("dns failure for auth.internal".to_string());
        assert!(!err.user_message().contains("auth.internal"));
    }
}
