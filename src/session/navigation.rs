//! Role-based navigation
//!
//! The route table is a fixed, closed mapping from [`Role`] to landing view.
//! Unmapped roles fall back to the application root.

use crate::models::{AuthState, Role};
use crate::settings::RouteSettings;
use std::collections::HashMap;

/// View router the session core drives
pub trait Navigator: Send + Sync {
    /// Path of the view currently rendered
    fn current_path(&self) -> String;

    /// Replace the current view with `path`
    fn navigate(&self, path: &str);
}

/// Fixed set of destinations used by the session core and route guards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    pub root: String,
    pub sign_in: String,
    pub sign_up: String,
    pub forbidden: String,
    landings: HashMap<Role, String>,
}

impl RouteTable {
    #[must_use]
    pub fn from_settings(routes: &RouteSettings) -> Self {
        let landings = HashMap::from([
            (Role::Patient, routes.patient_home.clone()),
            (Role::Doctor, routes.doctor_home.clone()),
            (Role::Hospital, routes.hospital_home.clone()),
            (Role::Admin, routes.admin_home.clone()),
        ]);

        Self {
            root: routes.root.clone(),
            sign_in: routes.sign_in.clone(),
            sign_up: routes.sign_up.clone(),
            forbidden: routes.forbidden.clone(),
            landings,
        }
    }

    /// Landing view for `role`, or the root for unmapped roles
    #[must_use]
    pub fn landing_for(&self, role: Role) -> &str {
        self.landings.get(&role).map_or_else(
            || {
                log::warn!("No landing view mapped for role '{role}', using root");
                self.root.as_str()
            },
            String::as_str,
        )
    }

    /// True for the sign-in and sign-up views
    #[must_use]
    pub fn is_entry_point(&self, path: &str) -> bool {
        let path = normalize_path(path);
        path == normalize_path(&self.sign_in) || path == normalize_path(&self.sign_up)
    }

    /// Where a freshly authenticated user on `current_path` should go
    ///
    /// Returns `None` unless a profile is loaded, loading has finished, and
    /// the user is on an entry point. Never returns the current path.
    #[must_use]
    pub fn post_login_target(&self, state: &AuthState, current_path: &str) -> Option<String> {
        if state.is_loading || !self.is_entry_point(current_path) {
            return None;
        }
        let role = state.profile.as_ref()?.role;
        let target = self.landing_for(role);

        (normalize_path(target) != normalize_path(current_path)).then(|| target.to_string())
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::from_settings(&RouteSettings::default())
    }
}

/// Strip query/fragment and trailing slashes for path comparison
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
