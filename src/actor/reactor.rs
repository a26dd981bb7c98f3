//! The reactor is the single owner of the tracked display set.
//!
//! Every entity mutation and every native configuration transaction happens
//! on this one task, so registry reconciliation, controller operations, and
//! timer callbacks form a single serialized event queue. OS topology
//! callbacks arrive on arbitrary threads; forwarding them through the
//! reactor's sender is the marshalling boundary.

use std::thread;

use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::common::config::Config;
use crate::engine::DisplayController;
use crate::engine::error::{Error, Result};
use crate::engine::restore::{self, AutoRestoreScheduler};
use crate::model::display::{DisplayState, EntityKey};
use crate::model::registry::Registry;
use crate::sys::SysPorts;
use crate::sys::screen::{DisplayId, ReconfigFlags};

pub type Sender = super::Sender<Event>;
type Receiver = super::Receiver<Event>;

/// User/UI-initiated operations on a tracked display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Disconnect(DisplayId),
    Disable(DisplayId),
    TurnOn(DisplayId),
    ResetAll,
}

/// Read-only view of one tracked display, for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DisplaySnapshot {
    pub id: DisplayId,
    pub name: String,
    pub state: DisplayState,
    pub is_primary: bool,
    pub is_builtin: bool,
}

pub enum Event {
    /// An OS topology-change callback `(handle, flags)`, forwarded verbatim
    /// from whatever thread delivered it.
    DisplayReconfigured(DisplayId, ReconfigFlags),
    /// A user command; the result is reported back when a reply slot is
    /// provided.
    Command {
        command: Command,
        reply: Option<oneshot::Sender<Result<()>>>,
    },
    /// The auto-restore timer with this epoch elapsed.
    AutoRestoreElapsed(u64),
    QueryDisplays(oneshot::Sender<Vec<DisplaySnapshot>>),
    Shutdown,
}

#[derive(Clone)]
pub struct ReactorHandle {
    sender: Sender,
}

impl ReactorHandle {
    pub fn sender(&self) -> Sender {
        self.sender.clone()
    }

    pub fn send(&self, event: Event) {
        self.sender.send(event)
    }

    /// Sends a command and returns the slot its result will arrive on.
    pub fn command(&self, command: Command) -> oneshot::Receiver<Result<()>> {
        let (tx, rx) = oneshot::channel();
        self.sender.send(Event::Command { command, reply: Some(tx) });
        rx
    }

    pub async fn displays(&self) -> Vec<DisplaySnapshot> {
        let (tx, rx) = oneshot::channel();
        self.sender.send(Event::QueryDisplays(tx));
        rx.await.unwrap_or_default()
    }
}

pub struct Reactor {
    registry: Registry,
    controller: DisplayController,
    scheduler: AutoRestoreScheduler,
    ports: SysPorts,
    events_tx: Sender,
    /// Epoch of a freshly armed restore timer, waiting for the run loop to
    /// spawn its sleep task.
    pending_timer: Option<u64>,
}

impl Reactor {
    /// Starts the reactor on its own thread and returns the handle the UI
    /// and the topology subscription feed events into.
    pub fn spawn(config: Config, ports: SysPorts) -> ReactorHandle {
        let (events_tx, events_rx) = super::channel();
        let reactor = Reactor::new(&config, ports, events_tx.clone());
        thread::Builder::new()
            .name("reactor".to_string())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .unwrap();
                runtime.block_on(reactor.run(events_rx));
            })
            .unwrap();
        ReactorHandle { sender: events_tx }
    }

    pub fn new(config: &Config, ports: SysPorts, events_tx: Sender) -> Self {
        Reactor {
            registry: Registry::new(config.builtin_probe_limit),
            controller: DisplayController::new(ports.clone()),
            scheduler: AutoRestoreScheduler::new(config.restore_delay()),
            ports,
            events_tx,
            pending_timer: None,
        }
    }

    pub async fn run(mut self, mut events: Receiver) {
        self.reconcile();
        self.reevaluate_restore();
        self.spawn_armed_timer();

        while let Some((span, event)) = events.recv().await {
            let _guard = span.enter();
            if matches!(event, Event::Shutdown) {
                debug!("Reactor shutting down");
                break;
            }
            self.handle_event(event);
            self.spawn_armed_timer();
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::DisplayReconfigured(id, flags) => self.handle_reconfigure(id, flags),
            Event::Command { command, reply } => {
                let result = self.handle_command(command);
                if let Err(err) = &result {
                    warn!("{command:?} failed: {err}");
                }
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            Event::AutoRestoreElapsed(epoch) => self.handle_restore_timer(epoch),
            Event::QueryDisplays(reply) => {
                let _ = reply.send(self.snapshots());
            }
            Event::Shutdown => {}
        }
    }

    /// The reconfiguration state machine over the OS change-summary flags.
    fn handle_reconfigure(&mut self, id: DisplayId, flags: ReconfigFlags) {
        trace!(%id, ?flags, "Display reconfiguration event");
        if flags.contains(ReconfigFlags::BEGIN_CONFIGURATION) {
            // A transaction is in flight; nothing has settled yet.
            return;
        }
        if flags.contains(ReconfigFlags::ADD) {
            self.scheduler.cancel();
            self.reconcile();
            if self.scheduler.was_auto_restored() {
                self.maybe_auto_disable();
            }
            return;
        }
        self.reconcile();
        self.reevaluate_restore();
    }

    fn handle_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Disconnect(id) => {
                let key = self.key_of(id)?;
                self.controller.disconnect(self.registry.arena_mut(), key)
            }
            Command::Disable(id) => {
                let key = self.key_of(id)?;
                self.controller.disable(self.registry.arena_mut(), key)
            }
            Command::TurnOn(id) => {
                let key = self.key_of(id)?;
                self.controller.turn_on(self.registry.arena_mut(), key)
            }
            Command::ResetAll => {
                self.controller.reset_all(self.registry.arena_mut());
                Ok(())
            }
        }
    }

    /// The timer fired. Stale epochs are dropped, and eligibility is
    /// re-derived because the topology may have changed during the delay.
    /// Failures here are logged only; this is a background safety net and
    /// the condition will be re-derived on the next reconciliation.
    fn handle_restore_timer(&mut self, epoch: u64) {
        if !self.scheduler.accept_fire(epoch) {
            return;
        }
        let active = self.ports.query.active_displays();
        if !restore::should_auto_restore(self.registry.arena(), &active) {
            debug!("Auto-restore conditions changed during the delay; skipping");
            return;
        }
        let Some(builtin) = self.registry.arena().builtin_key() else {
            return;
        };
        match self.controller.turn_on(self.registry.arena_mut(), builtin) {
            Ok(()) => {
                debug!("Auto-restored the built-in display");
                self.scheduler.set_auto_restored(true);
            }
            Err(err) => warn!("Auto-restore failed: {err}"),
        }
    }

    fn maybe_auto_disable(&mut self) {
        let active = self.ports.query.active_displays();
        if !self.scheduler.should_auto_disable(self.registry.arena(), &active) {
            return;
        }
        let Some(builtin) = self.registry.arena().builtin_key() else {
            return;
        };
        match self.controller.disconnect(self.registry.arena_mut(), builtin) {
            Ok(()) => {
                debug!("External display returned; built-in disabled again");
                self.scheduler.set_auto_restored(false);
            }
            Err(err) => warn!("Auto-disable failed: {err}"),
        }
    }

    fn reconcile(&mut self) {
        self.registry.reconcile(
            &*self.ports.query,
            &*self.ports.arrangement,
            &*self.ports.settings,
        );
    }

    fn reevaluate_restore(&mut self) {
        let active = self.ports.query.active_displays();
        if let Some(epoch) = self.scheduler.reevaluate(self.registry.arena(), &active) {
            self.pending_timer = Some(epoch);
        }
    }

    fn spawn_armed_timer(&mut self) {
        let Some(epoch) = self.pending_timer.take() else {
            return;
        };
        let events_tx = self.events_tx.clone();
        let delay = self.scheduler.delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            events_tx.send(Event::AutoRestoreElapsed(epoch));
        });
    }

    fn key_of(&self, id: DisplayId) -> Result<EntityKey> {
        self.registry.arena().key_of(id).ok_or(Error::UnknownDisplay(id))
    }

    fn snapshots(&self) -> Vec<DisplaySnapshot> {
        self.registry
            .arena()
            .iter_ordered()
            .map(|(_, entity)| DisplaySnapshot {
                id: entity.id,
                name: entity.name.clone(),
                state: entity.state,
                is_primary: entity.is_primary,
                is_builtin: entity.is_builtin,
            })
            .collect()
    }
}
