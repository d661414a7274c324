//! Notification sink contract.

use async_trait::async_trait;

/// Best-effort, fire-and-forget delivery of a short text message.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `text`. Failures are logged by the implementation and never
    /// reported to the caller.
    async fn notify(&self, text: &str);
}

/// Notifier that writes messages to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) {
        log::info!("{text}");
    }
}
