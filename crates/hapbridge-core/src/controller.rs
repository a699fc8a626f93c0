// ── Restart controller ──
//
// Owns the lifecycle of the accessory server. Accessory sets arrive
// through a bounded channel; a single event loop decides whether each
// one restarts the server right away or waits for the debounce timer,
// so bursts of changes cost one server construction instead of many.

use std::sync::Arc;
use std::time::Duration;

use rand::RngCore;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::identity::{LazyIdentity, SetupIdentity, default_rng};
use crate::service::{AccessoryService, ServiceFactory, SetupHook};

/// Capacity of the update queue. `submit` waits once this many updates
/// are pending; `try_submit` fails instead.
pub const UPDATE_CHANNEL_SIZE: usize = 8;

// ── ControllerState ──────────────────────────────────────────────

/// Lifecycle state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No server running.
    Idle,
    /// A server is running with the latest accessory set.
    Running,
    /// A server is running and a newer accessory set is waiting for the
    /// debounce timer.
    RestartPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartReason {
    Immediate,
    Debounce,
}

impl StartReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Debounce => "debounce",
        }
    }
}

/// A full accessory set, owned by the queue once submitted.
struct ServerUpdate<A> {
    accessories: Vec<A>,
}

// ── ControllerHandle ─────────────────────────────────────────────

/// Cloneable sender side of a [`Controller`].
///
/// Handles stay valid after the controller starts running; once the run
/// loop has exited every submission fails with
/// [`CoreError::ControllerStopped`].
pub struct ControllerHandle<A> {
    update_tx: mpsc::Sender<ServerUpdate<A>>,
    identity: Arc<LazyIdentity>,
    state: watch::Receiver<ControllerState>,
}

impl<A> Clone for ControllerHandle<A> {
    fn clone(&self) -> Self {
        Self {
            update_tx: self.update_tx.clone(),
            identity: Arc::clone(&self.identity),
            state: self.state.clone(),
        }
    }
}

impl<A: Clone + Send + 'static> ControllerHandle<A> {
    /// Replace the published accessory set.
    ///
    /// The slice is copied, so the caller may reuse it immediately. When
    /// [`UPDATE_CHANNEL_SIZE`] updates are already queued this waits for
    /// the controller to catch up.
    pub async fn submit(&self, accessories: &[A]) -> Result<(), CoreError> {
        let update = ServerUpdate {
            accessories: accessories.to_vec(),
        };
        self.update_tx
            .send(update)
            .await
            .map_err(|_| CoreError::ControllerStopped)
    }

    /// Like [`submit`](Self::submit), but rejects the update instead of
    /// waiting when the queue is full.
    pub fn try_submit(&self, accessories: &[A]) -> Result<(), CoreError> {
        let update = ServerUpdate {
            accessories: accessories.to_vec(),
        };
        self.update_tx.try_send(update).map_err(|err| match err {
            TrySendError::Full(_) => CoreError::UpdateQueueFull {
                capacity: UPDATE_CHANNEL_SIZE,
            },
            TrySendError::Closed(_) => CoreError::ControllerStopped,
        })
    }

    /// Pairing identity, generated on first use.
    pub fn setup_identity(&self) -> &SetupIdentity {
        self.identity.get()
    }

    /// The `X-HM://` setup URI for this bridge.
    pub fn setup_uri(&self) -> String {
        self.identity.get().setup_uri()
    }

    /// Subscribe to lifecycle state changes.
    pub fn state(&self) -> watch::Receiver<ControllerState> {
        self.state.clone()
    }
}

// ── Controller ───────────────────────────────────────────────────

/// Debounced restart controller for an accessory server.
///
/// Build it, grab as many [`ControllerHandle`]s as needed, then drive it
/// with [`run()`](Self::run). The first accessory set always starts a
/// server immediately; later sets either restart it immediately
/// (debounce disabled) or once updates have been quiet for
/// [`ControllerConfig::debounce`].
pub struct Controller<F: ServiceFactory> {
    config: ControllerConfig,
    factory: F,
    identity: Arc<LazyIdentity>,
    on_setup: Option<SetupHook<F::Service>>,
    update_tx: mpsc::Sender<ServerUpdate<F::Accessory>>,
    update_rx: mpsc::Receiver<ServerUpdate<F::Accessory>>,
    state_tx: watch::Sender<ControllerState>,
}

impl<F: ServiceFactory> Controller<F> {
    /// Create a controller. Nothing starts until [`run()`](Self::run) is
    /// polled and the first accessory set arrives.
    pub fn new(config: ControllerConfig, factory: F) -> Self {
        let identity = Arc::new(LazyIdentity::new(
            config.category,
            config.setup_id.clone(),
            config.pin.clone(),
            default_rng(),
        ));
        let (update_tx, update_rx) = mpsc::channel(UPDATE_CHANNEL_SIZE);
        let (state_tx, _) = watch::channel(ControllerState::Idle);

        Self {
            config,
            factory,
            identity,
            on_setup: None,
            update_tx,
            update_rx,
            state_tx,
        }
    }

    /// Use `rng` for any setup id or PIN that was not configured. Has no
    /// effect once the identity has been read.
    pub fn with_rng<R: RngCore + Send + 'static>(self, rng: R) -> Self {
        self.identity.replace_rng(Box::new(rng));
        self
    }

    /// Run `hook` on every server after it is built and before it serves.
    pub fn with_setup_hook(mut self, hook: impl FnMut(&mut F::Service) + Send + 'static) -> Self {
        self.on_setup = Some(Box::new(hook));
        self
    }

    /// Access the controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// A new handle for submitting accessory sets.
    pub fn handle(&self) -> ControllerHandle<F::Accessory> {
        ControllerHandle {
            update_tx: self.update_tx.clone(),
            identity: Arc::clone(&self.identity),
            state: self.state_tx.subscribe(),
        }
    }

    /// Pairing identity, generated on first use.
    pub fn setup_identity(&self) -> &SetupIdentity {
        self.identity.get()
    }

    /// The `X-HM://` setup URI for this bridge.
    pub fn setup_uri(&self) -> String {
        self.identity.get().setup_uri()
    }

    /// Subscribe to lifecycle state changes.
    pub fn state(&self) -> watch::Receiver<ControllerState> {
        self.state_tx.subscribe()
    }

    /// Drive the controller until `cancel` fires.
    ///
    /// Every server runs on a child of `cancel`, and the current one is
    /// stopped before this returns. A factory failure ends the loop with
    /// [`CoreError::ServiceBuild`]; nothing is left running in that case
    /// either, since the previous server is stopped before the rebuild.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), CoreError> {
        let Self {
            config,
            factory,
            identity,
            on_setup,
            update_tx,
            mut update_rx,
            state_tx,
        } = self;
        // Only handles keep the queue open from here on.
        drop(update_tx);

        let identity = identity.get().clone();
        info!(
            setup_id = %identity.setup_id,
            category = identity.category,
            debounce = ?config.debounce,
            "restart controller running"
        );

        let mut slot = ServerSlot {
            factory,
            on_setup,
            identity,
            shutdown_grace: config.shutdown_grace,
            parent: cancel.clone(),
            state: ControllerState::Idle,
            state_tx,
            accessories: Vec::new(),
            instance: None,
            generation: 0,
        };

        let debounce = time::sleep(Duration::ZERO);
        tokio::pin!(debounce);
        let mut updates_open = true;

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    slot.stop().await;
                    debug!("restart controller cancelled");
                    return Ok(());
                }
                () = &mut debounce, if slot.state == ControllerState::RestartPending => {
                    slot.restart(StartReason::Debounce).await?;
                }
                update = update_rx.recv(), if updates_open => match update {
                    Some(update) => {
                        slot.accessories = update.accessories;
                        if config.debounce_enabled() && slot.is_running() {
                            // Rearming replaces the previous deadline.
                            debounce.as_mut().reset(Instant::now() + config.debounce);
                            slot.set_state(ControllerState::RestartPending);
                            debug!(
                                accessories = slot.accessories.len(),
                                "restart deferred until updates settle"
                            );
                        } else {
                            slot.restart(StartReason::Immediate).await?;
                        }
                    }
                    None => {
                        updates_open = false;
                        debug!("all controller handles dropped; keeping current server");
                    }
                },
            }
        }
    }
}

// ── Server slot ──────────────────────────────────────────────────

struct RunningInstance {
    generation: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Event-loop-owned state: the current accessory set and at most one
/// running server.
struct ServerSlot<F: ServiceFactory> {
    factory: F,
    on_setup: Option<SetupHook<F::Service>>,
    identity: SetupIdentity,
    shutdown_grace: Duration,
    parent: CancellationToken,
    state: ControllerState,
    state_tx: watch::Sender<ControllerState>,
    accessories: Vec<F::Accessory>,
    instance: Option<RunningInstance>,
    generation: u64,
}

impl<F: ServiceFactory> ServerSlot<F> {
    fn is_running(&self) -> bool {
        self.instance.is_some()
    }

    fn set_state(&mut self, state: ControllerState) {
        self.state = state;
        self.state_tx.send_replace(state);
    }

    async fn restart(&mut self, reason: StartReason) -> Result<(), CoreError> {
        self.stop().await;
        self.start(reason)
    }

    fn start(&mut self, reason: StartReason) -> Result<(), CoreError> {
        let mut service = self.factory.build(&self.accessories).map_err(|source| {
            error!(
                error = %source,
                accessories = self.accessories.len(),
                "failed to build accessory server"
            );
            CoreError::ServiceBuild { source }
        })?;

        service.set_setup_id(&self.identity.setup_id);
        service.set_pin(&self.identity.pin);
        if let Some(hook) = self.on_setup.as_mut() {
            hook(&mut service);
        }

        self.generation += 1;
        let cancel = self.parent.child_token();
        let task = tokio::spawn(service.serve(cancel.clone()));
        info!(
            generation = self.generation,
            accessories = self.accessories.len(),
            reason = reason.as_str(),
            "accessory server started"
        );

        self.instance = Some(RunningInstance {
            generation: self.generation,
            cancel,
            task,
        });
        self.set_state(ControllerState::Running);
        Ok(())
    }

    /// Cancel the running server and wait (bounded by the shutdown grace)
    /// for its task to finish.
    async fn stop(&mut self) {
        let Some(RunningInstance {
            generation,
            cancel,
            mut task,
        }) = self.instance.take()
        else {
            return;
        };

        cancel.cancel();
        match time::timeout(self.shutdown_grace, &mut task).await {
            Ok(Ok(())) => debug!(generation, "accessory server stopped"),
            Ok(Err(err)) => warn!(generation, error = %err, "accessory server task failed"),
            Err(_) => {
                warn!(
                    generation,
                    grace = ?self.shutdown_grace,
                    "accessory server ignored cancellation; aborting"
                );
                task.abort();
            }
        }
        self.set_state(ControllerState::Idle);
    }
}
