//! Profile resolution
//!
//! Maps an authenticated identity to its domain [`Profile`] through an
//! injected [`ProfileStore`]. Profiles are created out-of-band at sign-up;
//! this module only reads and partially updates them.

use crate::models::auth::ProfileError;
use crate::models::{Profile, ProfileUpdate};
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;

/// Backing store holding one profile row per identity id
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Single-row read keyed by identity id
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no row exists, `Transport` on I/O failure
    async fn fetch_profile(&self, identity_id: &str) -> Result<Profile, ProfileError>;

    /// Partial update keyed by identity id
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no row exists, `Transport` on I/O failure
    async fn update_profile(
        &self,
        identity_id: &str,
        update: &ProfileUpdate,
    ) -> Result<(), ProfileError>;
}

/// Thin resolver over a [`ProfileStore`] with diagnostics
#[derive(Clone)]
pub struct ProfileResolver {
    store: Arc<dyn ProfileStore>,
}

impl ProfileResolver {
    #[must_use]
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Resolve the profile for `identity_id`
    ///
    /// # Errors
    ///
    /// Propagates the store's `NotFound` or `Transport` error
    pub async fn resolve(&self, identity_id: &str) -> Result<Profile, ProfileError> {
        debug!("Resolving profile for identity {identity_id}");
        let profile = self.store.fetch_profile(identity_id).await.map_err(|e| {
            warn!("Profile resolution failed for identity {identity_id}: {e}");
            e
        })?;

        if profile.id != identity_id {
            warn!(
                "Profile store returned row {} for identity {identity_id}",
                profile.id
            );
            return Err(ProfileError::NotFound(identity_id.to_string()));
        }
        if !profile.is_active {
            warn!("Profile {identity_id} is marked inactive");
        }
        Ok(profile)
    }

    /// Apply a partial update scoped to `identity_id`
    ///
    /// # Errors
    ///
    /// Propagates the store's error
    pub async fn update(
        &self,
        identity_id: &str,
        update: &ProfileUpdate,
    ) -> Result<(), ProfileError> {
        self.store
            .update_profile(identity_id, update)
            .await
            .map_err(|e| {
                warn!("Profile update failed for identity {identity_id}: {e}");
                e
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use std::sync::Mutex;

    struct FixedStore {
        row: Option<Profile>,
        updates: Mutex<Vec<ProfileUpdate>>,
    }

    #[async_trait]
    impl ProfileStore for FixedStore {
        async fn fetch_profile(&self, identity_id: &str) -> Result<Profile, ProfileError> {
            self.row
                .clone()
                .ok_or_else(|| ProfileError::NotFound(identity_id.to_string()))
        }

        async fn update_profile(
            &self,
            _identity_id: &str,
            update: &ProfileUpdate,
        ) -> Result<(), ProfileError> {
            self.updates.lock().unwrap().push(update.clone());
            Ok(())
        }
    }

    fn profile(id: &str) -> Profile {
        Profile {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            full_name: "Test User".to_string(),
            phone: None,
            role: Role::Doctor,
            avatar_url: None,
            is_active: true,
        }
    }

    fn resolver(row: Option<Profile>) -> (ProfileResolver, Arc<FixedStore>) {
        let store = Arc::new(FixedStore {
            row,
            updates: Mutex::new(Vec::new()),
        });
        (ProfileResolver::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_resolve_returns_matching_row() {
        let (resolver, _) = resolver(Some(profile("user-1")));
        let resolved = resolver.resolve("user-1").await.unwrap();
        assert_eq!(resolved.role, Role::Doctor);
    }

    #[tokio::test]
    async fn test_resolve_missing_row_is_not_found() {
        let (resolver, _) = resolver(None);
        let err = resolver.resolve("user-1").await.unwrap_err();
        assert_eq!(err, ProfileError::NotFound("user-1".to_string()));
    }

    #[tokio::test]
    async fn test_resolve_rejects_row_for_other_identity() {
        let (resolver, _) = resolver(Some(profile("someone-else")));
        assert!(matches!(
            resolver.resolve("user-1").await,
            Err(ProfileError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_passes_through() {
        let (resolver, store) = resolver(Some(profile("user-1")));
        let update = ProfileUpdate {
            full_name: Some("Renamed".to_string()),
            ..ProfileUpdate::default()
        };
        resolver.update("user-1", &update).await.unwrap();
        assert_eq!(store.updates.lock().unwrap().as_slice(), &[update]);
    }
}
