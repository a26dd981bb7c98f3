//! Native display configuration transactions.
//!
//! The OS applies topology changes atomically through a begin/act/complete
//! unit of work. The contract the engine relies on: `begin` failing mutates
//! nothing; a failed act step requires `cancel` before the error surfaces;
//! entity state must never advance past a `complete` that did not succeed.
//! A transaction must never be left open.

use super::SysError;
use super::screen::DisplayId;

pub trait ConfigSession {
    /// Opens a configuration transaction.
    fn begin(&self) -> Result<Box<dyn ConfigTransaction>, SysError>;

    /// Reverts the whole topology to the permanently saved configuration.
    /// Used by the reset escape hatch only.
    fn restore_permanent_config(&self) -> Result<(), SysError>;
}

pub trait ConfigTransaction {
    /// Stages enabling or disabling a display's output.
    fn set_output_enabled(&mut self, id: DisplayId, enabled: bool) -> Result<(), SysError>;

    /// Stages mirroring `id` onto `source`, or clears its mirror when
    /// `source` is `None`.
    fn set_mirror_source(
        &mut self,
        id: DisplayId,
        source: Option<DisplayId>,
    ) -> Result<(), SysError>;

    /// Applies every staged change. Consumes the transaction either way.
    fn complete(self: Box<Self>) -> Result<(), SysError>;

    /// Discards every staged change.
    fn cancel(self: Box<Self>);
}
