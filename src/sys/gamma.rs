//! Per-display color ramp control, used to blank a mirrored display.

use super::SysError;
use super::screen::DisplayId;

/// Contract: `zero` and `restore` are idempotent, and `restore` after `zero`
/// returns the display to its pre-`zero` color output.
pub trait GammaControl {
    fn zero(&self, id: DisplayId) -> Result<(), SysError>;
    fn restore(&self, id: DisplayId) -> Result<(), SysError>;
    /// Restores every display's color settings from the OS color sync store.
    fn restore_all(&self);
}
