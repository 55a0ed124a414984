//! `Notifier`: best-effort fire-and-forget text sink (SPEC_FULL.md §6).

use tracing::warn;

pub trait Notifier: Send + Sync {
    fn send(&self, text: &str);
}

/// Logs at `info` and swallows nothing that could panic; the default sink
/// for configurations that don't wire up an external channel.
pub struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn send(&self, text: &str) {
        tracing::info!(%text, "notification");
    }
}

/// Wraps a fallible sink, logging at `warn` on failure instead of
/// propagating — the "best-effort" contract of §6.
pub struct FallibleNotifier<F: Fn(&str) -> Result<(), String> + Send + Sync> {
    send_fn: F,
}

impl<F: Fn(&str) -> Result<(), String> + Send + Sync> FallibleNotifier<F> {
    pub fn new(send_fn: F) -> Self {
        Self { send_fn }
    }
}

impl<F: Fn(&str) -> Result<(), String> + Send + Sync> Notifier for FallibleNotifier<F> {
    fn send(&self, text: &str) {
        if let Err(e) = (self.send_fn)(text) {
            warn!(error = %e, "notification delivery failed");
        }
    }
}
