//! Public display operations: hard disconnect, mirror+blank fallback,
//! turn-on, and the reset escape hatch. Each operation drives a native
//! configuration transaction with begin/act/complete-or-cancel discipline:
//! no path leaves a transaction open, and entity state only ever reflects a
//! completed transaction.

use tracing::{debug, trace, warn};

use super::error::{Error, Result};
use super::mirror;
use crate::model::display::{DisplayArena, DisplayState, EntityKey};
use crate::sys::SysPorts;

pub struct DisplayController {
    ports: SysPorts,
}

impl DisplayController {
    pub fn new(ports: SysPorts) -> Self {
        DisplayController { ports }
    }

    /// Electrically disconnects a display's output.
    ///
    /// On failure the entity is left `Pending`; the next reconciliation
    /// recovers visibility from the OS report.
    pub fn disconnect(&self, arena: &mut DisplayArena, key: EntityKey) -> Result<()> {
        let id = arena[key].id;
        debug!(%id, "Disconnecting display");
        arena[key].state = DisplayState::Pending;

        let mut txn = self
            .ports
            .session
            .begin()
            .map_err(|err| Error::configuration(id, "beginning configuration", err))?;
        if let Err(err) = txn.set_output_enabled(id, false) {
            txn.cancel();
            return Err(Error::configuration(id, "disabling output", err));
        }
        txn.complete()
            .map_err(|err| Error::configuration(id, "completing configuration", err))?;

        arena[key].state = DisplayState::Disconnected;
        arena[key].is_primary = false;
        // Anything mirroring onto this display lost its source; treat those
        // relationships as severed.
        arena.sever_mirror_links(key);
        Ok(())
    }

    /// Mirror+blank fallback for displays that reject a hard disconnect:
    /// mirror this display onto another active one, then zero its gamma.
    pub fn disable(&self, arena: &mut DisplayArena, key: EntityKey) -> Result<()> {
        let id = arena[key].id;
        debug!(%id, "Disabling display via mirror fallback");
        arena[key].state = DisplayState::Pending;

        let alternate = mirror::select_alternate(arena, key)?;
        mirror::mirror(arena, &*self.ports.session, key, alternate)?;
        self.ports
            .gamma
            .zero(id)
            .map_err(|err| Error::configuration(id, "zeroing gamma", err))?;

        arena[key].state = DisplayState::Mirrored;
        arena[key].is_primary = false;
        Ok(())
    }

    /// Brings a display back, dispatching on how it was turned off. A no-op
    /// for displays that are already active or mid-transition.
    pub fn turn_on(&self, arena: &mut DisplayArena, key: EntityKey) -> Result<()> {
        let id = arena[key].id;
        match arena[key].state {
            DisplayState::Active | DisplayState::Pending => {
                trace!(%id, state = %arena[key].state, "turn_on is a no-op");
                Ok(())
            }
            DisplayState::Disconnected => {
                debug!(%id, "Reconnecting display");
                let mut txn = self
                    .ports
                    .session
                    .begin()
                    .map_err(|err| Error::configuration(id, "beginning configuration", err))?;
                if let Err(err) = txn.set_output_enabled(id, true) {
                    txn.cancel();
                    return Err(Error::configuration(id, "enabling output", err));
                }
                txn.complete()
                    .map_err(|err| Error::configuration(id, "completing configuration", err))?;
                arena[key].state = DisplayState::Active;
                Ok(())
            }
            DisplayState::Mirrored => {
                debug!(%id, "Re-enabling mirrored display");
                self.ports
                    .gamma
                    .restore(id)
                    .map_err(|err| Error::configuration(id, "restoring gamma", err))?;
                mirror::unmirror(arena, &*self.ports.session, key)?;
                if let Err(err) = self.ports.arrangement.restore() {
                    warn!(%id, "Failed to restore display arrangement: {err}");
                }
                arena[key].state = DisplayState::Active;
                Ok(())
            }
        }
    }

    /// Best-effort recovery from any inconsistent state: turn everything on,
    /// restore color settings globally, and re-apply the permanently saved
    /// configuration. Individual failures are logged and skipped so every
    /// display gets an attempt.
    pub fn reset_all(&self, arena: &mut DisplayArena) {
        debug!("Resetting all displays");
        for key in arena.keys_ordered() {
            if let Err(err) = self.turn_on(arena, key) {
                warn!("Reset could not turn on display: {err}");
            }
        }
        self.ports.gamma.restore_all();
        if let Err(err) = self.ports.session.restore_permanent_config() {
            warn!("Failed to restore permanent configuration: {err}");
        }
    }
}
