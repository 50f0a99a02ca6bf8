use crate::entry::LogEntry;
use crate::error::BoxError;
use crate::hook::Hook;
use async_trait::async_trait;
use tracing::Level;

/// Handler registered with the logging layer.
///
/// The layer asks [`LogHook::levels`] which severities to dispatch and
/// calls [`LogHook::fire`] once per qualifying entry, from a spawned task
/// rather than the application thread that emitted the event.
#[async_trait]
pub trait LogHook: Send + Sync {
    /// Severities this hook wants to receive.
    fn levels(&self) -> &[Level];

    /// Deliver a single entry.
    ///
    /// **Returns**
    /// - `Ok(())` if the entry was accepted by the destination.
    /// - `Err(..)` on any failure. The layer logs the error and moves on;
    ///   it never retries.
    async fn fire(&self, entry: &LogEntry) -> Result<(), BoxError>;
}

#[async_trait]
impl LogHook for Hook {
    fn levels(&self) -> &[Level] {
        Hook::levels(self)
    }

    async fn fire(&self, entry: &LogEntry) -> Result<(), BoxError> {
        Hook::fire(self, entry).await.map_err(Into::into)
    }
}
