//! Restart control for accessory-bridge servers.
//!
//! Building an accessory server is expensive, while the accessory set it
//! publishes can change many times a second. This crate keeps exactly one
//! server alive and decides *when* to rebuild it:
//!
//! - **[`Controller`]**: single-task event loop owning the server
//!   lifecycle. The first accessory set starts a server immediately;
//!   later ones restart it immediately or, with a non-zero
//!   [`ControllerConfig::debounce`], once updates have gone quiet.
//!
//! - **[`ControllerHandle`]**: cloneable submission side. Accessory sets
//!   are copied into a bounded queue of [`UPDATE_CHANNEL_SIZE`] entries.
//!
//! - **[`ServiceFactory`] / [`AccessoryService`]**: the seam to the actual
//!   protocol implementation, which this crate never touches.
//!
//! - **[`encode_setup_uri`]** and **[`SetupIdentity`]**: the `X-HM://`
//!   setup URI pairing clients scan, and the random setup id / PIN behind
//!   it.

pub mod config;
pub mod controller;
pub mod error;
pub mod identity;
pub mod service;
pub mod setup;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ControllerConfig;
pub use controller::{Controller, ControllerHandle, ControllerState, UPDATE_CHANNEL_SIZE};
pub use error::CoreError;
pub use identity::{BRIDGE_CATEGORY, BoxRng, SetupIdentity};
pub use service::{AccessoryService, BoxError, ServiceFactory, SetupHook};
pub use setup::{TransportFlags, encode_setup_uri, encode_setup_uri_with_flags};

// Cancellation is part of the public API surface.
pub use tokio_util::sync::CancellationToken;
