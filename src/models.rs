use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod auth;

/// Provider-owned principal for the signed-in user
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Identity {
    pub id: String,
    pub email: Option<String>,
    /// Arbitrary provider metadata (sign-up seed data lands here)
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Identity {
    #[must_use]
    pub fn new(id: &str, email: &str) -> Self {
        Self {
            id: id.to_string(),
            email: Some(email.to_string()),
            metadata: serde_json::Map::new(),
        }
    }
}

/// Live provider session wrapping an [`Identity`]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Session {
    pub identity: Identity,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Check whether the provider-issued credentials have lapsed at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Role governing access to protected views
///
/// Stored values outside the closed set deserialize to `Unrecognized`, which
/// never satisfies a role check and lands on the application root.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Hospital,
    Admin,
    #[serde(other)]
    Unrecognized,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Doctor => "doctor",
            Self::Hospital => "hospital",
            Self::Admin => "admin",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain profile keyed 1:1 by identity id
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub avatar_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Profile data attached to a sign-up request as provider metadata
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProfileSeed {
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

impl ProfileSeed {
    /// Render the seed as the provider's user metadata object
    #[must_use]
    pub fn to_metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "full_name": self.full_name,
            "phone": self.phone,
            "role": self.role,
        })
    }
}

/// Partial profile update; absent fields are left untouched
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.phone.is_none() && self.avatar_url.is_none()
    }

    /// Merge the present fields into `profile`
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(full_name) = &self.full_name {
            profile.full_name.clone_from(full_name);
        }
        if let Some(phone) = &self.phone {
            profile.phone = Some(phone.clone());
        }
        if let Some(avatar_url) = &self.avatar_url {
            profile.avatar_url = Some(avatar_url.clone());
        }
    }
}

/// Phase of the session state machine
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AuthPhase {
    #[default]
    Bootstrapping,
    Unauthenticated,
    Authenticating,
    Authenticated,
    SigningOut,
}

/// Process-wide authentication state
///
/// Only the session manager writes it; everything else reads snapshots or
/// subscribes to changes.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthState {
    pub identity: Option<Identity>,
    pub session: Option<Session>,
    pub profile: Option<Profile>,
    pub is_loading: bool,
    pub phase: AuthPhase,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            identity: None,
            session: None,
            profile: None,
            is_loading: true,
            phase: AuthPhase::Bootstrapping,
        }
    }
}

impl AuthState {
    /// Role of the resolved profile, if any
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(|profile| profile.role)
    }

    /// True when both an identity and its profile are present
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some() && self.profile.is_some()
    }

    /// Drop identity, session and profile and settle as unauthenticated
    pub fn clear(&mut self) {
        self.identity = None;
        self.session = None;
        self.profile = None;
        self.phase = AuthPhase::Unauthenticated;
    }
}
