//! Operator notifications for mutation outcomes.

/// Sink for user-facing notifications
///
/// Implementations must be cheap and non-blocking; they are called from
/// effect futures after mutations settle.
pub trait Notifier: Send + Sync {
    /// A mutation succeeded
    fn success(&self, message: &str);

    /// A mutation or load failed
    fn error(&self, message: &str);
}

/// Notifier that emits structured log events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(target: "storekit_catalog::notify", message, "notification");
    }

    fn error(&self, message: &str) {
        tracing::warn!(target: "storekit_catalog::notify", message, "notification");
    }
}
