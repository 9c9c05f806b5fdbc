//! User-visible notifications
//!
//! Success and failure messages raised by session operations are routed
//! through a [`Notifier`] so the UI layer can render them however it likes.

/// Sink for user-visible messages
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);

    fn error(&self, message: &str);
}

/// Notifier that only writes to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        log::info!("✅ {message}");
    }

    fn error(&self, message: &str) {
        log::warn!("❌ {message}");
    }
}
