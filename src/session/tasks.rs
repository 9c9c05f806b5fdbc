//! Deferred work queue
//!
//! Provider callbacks run inside the provider's own dispatch, so they only
//! enqueue work here. A single worker drains the queue on a later scheduling
//! turn, which also serializes profile resolutions.

use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AuthTask {
    /// Fetch the profile for an identity that just signed in
    ResolveProfile { identity_id: String },
}

#[derive(Debug)]
pub(crate) struct TaskQueue {
    tx: mpsc::UnboundedSender<AuthTask>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<AuthTask>>>,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Queue `task`; tasks queued before the worker starts are kept
    pub(crate) fn enqueue(&self, task: AuthTask) {
        if let Err(e) = self.tx.send(task) {
            log::warn!("Auth task worker is gone, dropping {:?}", e.0);
        }
    }

    /// Hand the receiving end to the worker; only the first caller gets it
    pub(crate) fn take_receiver(&self) -> Option<mpsc::UnboundedReceiver<AuthTask>> {
        self.rx.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}
