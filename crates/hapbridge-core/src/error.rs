// ── Core error types ──
//
// Errors surfaced by the restart controller. A malformed PIN never shows
// up here: the setup-code encoder absorbs it and encodes zero instead.

use thiserror::Error;

use crate::service::BoxError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lifecycle errors ─────────────────────────────────────────────
    /// The service factory could not build an instance. Fatal to the
    /// controller: the run loop returns it without retrying.
    #[error("failed to build accessory server: {source}")]
    ServiceBuild {
        #[source]
        source: BoxError,
    },

    // ── Update queue errors ──────────────────────────────────────────
    #[error("configuration update queue is full ({capacity} updates pending)")]
    UpdateQueueFull { capacity: usize },

    #[error("controller is no longer running")]
    ControllerStopped,
}

impl CoreError {
    /// Whether this error ended the controller's run loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ServiceBuild { .. })
    }
}
