// ── Service collaborator ──
//
// The controller never speaks the accessory protocol itself. It asks a
// factory for a fresh server whenever the accessory set changes, hands
// it the pairing identity, and runs it until its token is cancelled.

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Boxed error returned by service factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Hook invoked on every freshly built service before it starts serving.
pub type SetupHook<S> = Box<dyn FnMut(&mut S) + Send>;

/// One live accessory server bound to one accessory set.
pub trait AccessoryService: Send + 'static {
    fn set_setup_id(&mut self, setup_id: &str);

    fn set_pin(&mut self, pin: &str);

    /// Accept connections until `cancel` fires, then release every
    /// resource the server holds.
    fn serve(self, cancel: CancellationToken) -> impl Future<Output = ()> + Send + 'static;
}

/// Builds accessory servers.
///
/// The factory owns everything a server needs besides the accessory set:
/// the persistent pairing store and the bridge accessory itself.
pub trait ServiceFactory: Send + 'static {
    /// Opaque accessory descriptor.
    type Accessory: Clone + Send + 'static;
    type Service: AccessoryService;

    /// Build a server exposing `accessories` behind the bridge. An empty
    /// slice publishes the bridge alone.
    fn build(&mut self, accessories: &[Self::Accessory]) -> Result<Self::Service, BoxError>;
}
