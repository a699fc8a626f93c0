// ── Runtime controller configuration ──
//
// Describes *how* the restart controller behaves. Never touches disk:
// the CLI (or any embedding application) builds a `ControllerConfig`
// and hands it in.

use std::time::Duration;

use crate::identity::BRIDGE_CATEGORY;

/// Configuration for a single restart controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Accessory category encoded into the setup URI.
    pub category: u8,
    /// Fixed setup id. Generated once when `None`.
    pub setup_id: Option<String>,
    /// Fixed pairing PIN. Generated once when `None`.
    pub pin: Option<String>,
    /// Quiet period after the last update before a running server is
    /// restarted. Zero restarts on every update.
    pub debounce: Duration,
    /// How long a stopped server may take to wind down before its task is
    /// aborted.
    pub shutdown_grace: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            category: BRIDGE_CATEGORY,
            setup_id: None,
            pin: None,
            debounce: Duration::ZERO,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl ControllerConfig {
    /// Whether updates to a running server are coalesced.
    pub fn debounce_enabled(&self) -> bool {
        !self.debounce.is_zero()
    }
}
