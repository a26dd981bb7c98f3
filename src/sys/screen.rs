//! Display identity and topology queries.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Opaque, stable display handle assigned by the OS. The sole identity key
/// for a display; survives the display being disabled, but not a replug on
/// some hardware.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DisplayId(u32);

impl DisplayId {
    pub fn new(raw: u32) -> Self {
        DisplayId(raw)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisplayId({})", self.0)
    }
}

bitflags! {
    /// Change-summary flags delivered with a display reconfiguration
    /// callback. Values follow the CoreGraphics change summary word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ReconfigFlags: u32 {
        const BEGIN_CONFIGURATION = 1 << 0;
        const MOVED = 1 << 1;
        const SET_MAIN = 1 << 2;
        const SET_MODE = 1 << 3;
        const ADD = 1 << 4;
        const REMOVE = 1 << 5;
        const ENABLED = 1 << 8;
        const DISABLED = 1 << 9;
        const MIRROR = 1 << 10;
        const UNMIRROR = 1 << 11;
        const DESKTOP_SHAPE_CHANGED = 1 << 12;
    }
}

/// Read-only view of the current display topology.
///
/// `online` is a superset of `active`: a display we disabled stays online
/// (enumerable) while no longer active (drawable). Names are only available
/// for active displays.
pub trait DisplayQuery {
    fn active_displays(&self) -> Vec<DisplayId>;
    fn online_displays(&self) -> Vec<DisplayId>;
    fn primary_display(&self) -> Option<DisplayId>;
    fn is_builtin(&self, id: DisplayId) -> bool;
    fn display_name(&self, id: DisplayId) -> Option<String>;
}
