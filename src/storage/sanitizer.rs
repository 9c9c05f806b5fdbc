use super::KeyValueStorage;
use crate::models::auth::AuthError;
use log::{debug, info};
use regex::Regex;
use std::sync::Arc;

/// Key namespace used by the identity provider's client library
///
/// Matches `sb-<project>-auth-token` style keys and the legacy
/// `supabase.auth.*` keys.
pub const DEFAULT_PROVIDER_KEY_PATTERN: &str = r"^sb-|supabase\.auth\.";

/// Removes stale identity artifacts from every configured storage area
///
/// Must run before each sign-in, sign-up and sign-out so that no residual
/// session leaks across accounts on a shared device.
#[derive(Clone)]
pub struct StorageSanitizer {
    pattern: Regex,
    areas: Vec<Arc<dyn KeyValueStorage>>,
}

impl StorageSanitizer {
    /// Create a sanitizer for the given key pattern
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `pattern` is not a valid regex
    pub fn new(pattern: &str) -> Result<Self, AuthError> {
        let pattern = Regex::new(pattern).map_err(|e| {
            AuthError::Configuration(format!("Invalid storage key pattern '{pattern}': {e}"))
        })?;
        Ok(Self {
            pattern,
            areas: Vec::new(),
        })
    }

    /// Add a storage area to sweep
    #[must_use]
    pub fn with_area(mut self, area: Arc<dyn KeyValueStorage>) -> Self {
        self.areas.push(area);
        self
    }

    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.pattern.is_match(key)
    }

    /// Remove every provider-namespaced key across all areas
    ///
    /// Never fails; returns how many keys were removed.
    pub fn purge(&self) -> usize {
        let mut removed = 0;
        for area in &self.areas {
            for key in area.keys().into_iter().filter(|key| self.matches(key)) {
                debug!("Purging {key} from {:?} storage", area.area());
                area.remove(&key);
                removed += 1;
            }
        }
        if removed > 0 {
            info!("🧹 Purged {removed} stale identity artifact(s) from client storage");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageArea};

    fn sanitizer_with(areas: &[Arc<MemoryStorage>]) -> StorageSanitizer {
        areas.iter().fold(
            StorageSanitizer::new(DEFAULT_PROVIDER_KEY_PATTERN).unwrap(),
            |sanitizer, area| sanitizer.with_area(area.clone()),
        )
    }

    #[test]
    fn test_purge_removes_only_namespaced_keys() {
        let durable = MemoryStorage::shared(StorageArea::Durable);
        durable.set("sb-xyz-auth-token", "{\"access_token\":\"abc\"}");
        durable.set("unrelated-key", "keep me");

        let removed = sanitizer_with(&[durable.clone()]).purge();

        assert_eq!(removed, 1);
        assert!(durable.get("sb-xyz-auth-token").is_none());
        assert_eq!(durable.get("unrelated-key").as_deref(), Some("keep me"));
    }

    #[test]
    fn test_purge_sweeps_both_areas() {
        let durable = MemoryStorage::shared(StorageArea::Durable);
        let scoped = MemoryStorage::shared(StorageArea::SessionScoped);
        durable.set("supabase.auth.token", "legacy");
        scoped.set("sb-project-auth-token-code-verifier", "verifier");
        scoped.set("cart", "[]");

        let removed = sanitizer_with(&[durable.clone(), scoped.clone()]).purge();

        assert_eq!(removed, 2);
        assert!(durable.is_empty());
        assert_eq!(scoped.keys(), vec!["cart".to_string()]);
    }

    #[test]
    fn test_purge_on_empty_storage_is_noop() {
        let durable = MemoryStorage::shared(StorageArea::Durable);
        assert_eq!(sanitizer_with(&[durable.clone()]).purge(), 0);
        assert_eq!(StorageSanitizer::new(DEFAULT_PROVIDER_KEY_PATTERN).unwrap().purge(), 0);
    }

    #[test]
    fn test_invalid_pattern_is_configuration_error() {
        let result = StorageSanitizer::new("sb-(");
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }
}
