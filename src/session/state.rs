//! Owned container for the process-wide [`AuthState`]
//!
//! The store exposes `read` and `subscribe` to every consumer. Writes are
//! crate-private so only the session manager can mutate state, and each write
//! is applied atomically through the watch channel's lock.

use crate::models::AuthState;
use crate::utils::logging::LoggingHelper;
use tokio::sync::watch;

/// Read-only view handed to consumers
pub type AuthStateReceiver = watch::Receiver<AuthState>;

#[derive(Debug)]
pub struct AuthStore {
    tx: watch::Sender<AuthState>,
}

impl AuthStore {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthState::default());
        Self { tx }
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn read(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every state change
    #[must_use]
    pub fn subscribe(&self) -> AuthStateReceiver {
        self.tx.subscribe()
    }

    /// Apply `mutate` atomically; subscribers are woken only if the state
    /// actually changed. Returns whether it changed.
    pub(crate) fn update(&self, mutate: impl FnOnce(&mut AuthState)) -> bool {
        self.tx.send_if_modified(|state| {
            let before = state.clone();
            mutate(state);
            let changed = *state != before;
            if changed {
                LoggingHelper::log_phase_change(&before, state);
            }
            changed
        })
    }
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}
