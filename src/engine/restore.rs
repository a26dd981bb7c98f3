//! The built-in panel safety net.
//!
//! If the built-in display is off and the last real external monitor goes
//! away, the user would be left staring at dark glass. The scheduler arms a
//! debounced one-shot timer whenever that condition holds; the timer
//! re-checks the condition when it fires, because topology may have changed
//! during the delay. Timers are identified by an epoch so a cancelled or
//! superseded timer's firing is ignored rather than raced with.

use std::time::Duration;

use tracing::{debug, trace};

use crate::model::display::{DisplayArena, DisplayState};
use crate::sys::screen::DisplayId;

/// True when some OS-active, non-built-in handle corresponds to a tracked
/// entity that is active under a name the OS actually reported. The name
/// check filters out the transient headless display the OS may synthesize
/// right after the last physical monitor is unplugged.
pub fn external_display_available(arena: &DisplayArena, active: &[DisplayId]) -> bool {
    active.iter().any(|id| {
        arena.entity_of(*id).is_some_and(|entity| {
            !entity.is_builtin && entity.state == DisplayState::Active && entity.has_real_name()
        })
    })
}

/// Eligibility for the safety net: the built-in panel exists, is off by our
/// hand (disconnected or mirrored), and no real external display remains.
pub fn should_auto_restore(arena: &DisplayArena, active: &[DisplayId]) -> bool {
    let Some(key) = arena.builtin_key() else {
        return false;
    };
    arena[key].state.is_off() && !external_display_available(arena, active)
}

pub struct AutoRestoreScheduler {
    delay: Duration,
    epoch: u64,
    armed: bool,
    was_auto_restored: bool,
}

impl AutoRestoreScheduler {
    pub fn new(delay: Duration) -> Self {
        AutoRestoreScheduler {
            delay,
            epoch: 0,
            armed: false,
            was_auto_restored: false,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancels any pending timer. Idempotent; a later firing of the
    /// cancelled timer fails the epoch check in [`accept_fire`].
    ///
    /// [`accept_fire`]: Self::accept_fire
    pub fn cancel(&mut self) {
        if self.armed {
            trace!(epoch = self.epoch, "Cancelling pending auto-restore");
            self.armed = false;
        }
    }

    /// Cancel-then-arm. Returns the epoch of the newly armed timer when the
    /// current topology is eligible; the caller owns actually sleeping and
    /// reporting the epoch back.
    pub fn reevaluate(&mut self, arena: &DisplayArena, active: &[DisplayId]) -> Option<u64> {
        self.cancel();
        if !should_auto_restore(arena, active) {
            return None;
        }
        self.epoch += 1;
        self.armed = true;
        debug!(epoch = self.epoch, delay = ?self.delay, "Arming auto-restore timer");
        Some(self.epoch)
    }

    /// Called when a timer with `epoch` fires. Returns whether that timer is
    /// still the armed one; stale and cancelled timers are rejected.
    pub fn accept_fire(&mut self, epoch: u64) -> bool {
        if self.armed && epoch == self.epoch {
            self.armed = false;
            true
        } else {
            trace!(epoch, current = self.epoch, "Ignoring stale auto-restore timer");
            false
        }
    }

    pub fn was_auto_restored(&self) -> bool {
        self.was_auto_restored
    }

    pub fn set_auto_restored(&mut self, value: bool) {
        self.was_auto_restored = value;
    }

    /// Auto-disable check: once the panel was restored automatically and a
    /// real external display is back, the panel should go dark again so the
    /// user's external setup takes over.
    pub fn should_auto_disable(&self, arena: &DisplayArena, active: &[DisplayId]) -> bool {
        if !self.was_auto_restored {
            return false;
        }
        let Some(key) = arena.builtin_key() else {
            return false;
        };
        arena[key].state == DisplayState::Active && external_display_available(arena, active)
    }
}
